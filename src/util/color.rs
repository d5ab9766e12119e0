//! Colour primitives and the fixed ramps used by the metric modes.

use bytemuck::{Pod, Zeroable};

/// Packed RGBA colour, laid out for direct upload by the external renderer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Opaque colour from RGB components.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Neutral grey used by the blank colour mode.
pub const BLANK: Rgba = Rgba::rgb(128, 128, 128);

/// Convert HSV to RGB as floating point values (0.0-1.0).
///
/// `h` is in degrees (0-360), `s` and `v` in 0.0-1.0.
#[inline]
pub fn hsv_to_rgb_f32(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Convert HSV to a packed [`Rgba`].
#[inline]
pub fn hsv_to_rgba(h: f32, s: f32, v: f32) -> Rgba {
    let (r, g, b) = hsv_to_rgb_f32(h, s, v);
    Rgba::rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

/// Map a normalized entropy value (0-1) onto the entropy ramp.
///
/// Low entropy renders cool (blue), high entropy hot (red): hue sweeps from
/// 240 degrees down to 0 while brightness rises, so encrypted or compressed
/// regions glow against structured data.
pub fn entropy_ramp(t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let hue = 240.0 * (1.0 - t);
    let value = 0.25 + 0.70 * t;
    hsv_to_rgba(hue, 0.85, value)
}

/// Map a similarity value (0-1, 1 = identical to predecessor) onto a
/// single-hue intensity ramp.
///
/// Runs of near-equal bytes share near-equal intensity, which is what makes
/// them read as bands.
pub fn similarity_ramp(t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let value = 0.12 + 0.83 * t;
    hsv_to_rgba(200.0, 0.65, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_primaries() {
        let red = hsv_to_rgba(0.0, 1.0, 1.0);
        assert_eq!(red.r, 255);
        assert!(red.g < 5 && red.b < 5);

        let green = hsv_to_rgba(120.0, 1.0, 1.0);
        assert_eq!(green.g, 255);
        assert!(green.r < 5 && green.b < 5);

        let blue = hsv_to_rgba(240.0, 1.0, 1.0);
        assert_eq!(blue.b, 255);
        assert!(blue.r < 5 && blue.g < 5);
    }

    #[test]
    fn entropy_ramp_is_cool_to_hot() {
        let low = entropy_ramp(0.0);
        let high = entropy_ramp(1.0);
        assert!(low.b > low.r, "low entropy should be cool");
        assert!(high.r > high.b, "high entropy should be hot");
    }

    #[test]
    fn similarity_ramp_is_monotonic_in_brightness() {
        let mut prev = -1i32;
        for step in 0..=10 {
            let colour = similarity_ramp(step as f32 / 10.0);
            let brightness = i32::from(colour.r) + i32::from(colour.g) + i32::from(colour.b);
            assert!(brightness >= prev);
            prev = brightness;
        }
    }
}
