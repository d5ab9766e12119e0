//! Shannon entropy over sliding windows and whole buffers.
//!
//! Byte counting uses two interleaved cache-aligned histograms merged with
//! SIMD, which avoids counter contention on runs of equal bytes. Log values
//! for small counts come from a lazily built lookup table.

use rayon::prelude::*;
use wide::u32x4;

/// Sliding window size for the per-offset entropy metric, in bytes.
///
/// The window is centred on the offset and clipped at buffer boundaries;
/// normalization is always by 8 bits regardless of clipping.
pub const ENTROPY_WINDOW: usize = 256;

/// Cache-aligned histogram so each one starts on its own cache line.
#[repr(C, align(64))]
struct AlignedHistogram {
    counts: [u32; 256],
}

impl AlignedHistogram {
    #[inline(always)]
    const fn new() -> Self {
        Self { counts: [0u32; 256] }
    }
}

/// Precomputed log2 values for counts `1..=LOG2_LUT_SIZE`.
const LOG2_LUT_SIZE: usize = 4096;

fn log2_lut() -> &'static [f64; LOG2_LUT_SIZE + 1] {
    use std::sync::OnceLock;
    static LUT: OnceLock<[f64; LOG2_LUT_SIZE + 1]> = OnceLock::new();
    LUT.get_or_init(|| {
        let mut lut = [0.0f64; LOG2_LUT_SIZE + 1];
        for (i, slot) in lut.iter_mut().enumerate().skip(1) {
            *slot = (i as f64).log2();
        }
        lut
    })
}

#[inline(always)]
fn fast_log2(x: u32) -> f64 {
    if x == 0 {
        return 0.0;
    }
    if (x as usize) <= LOG2_LUT_SIZE {
        log2_lut()[x as usize]
    } else {
        f64::from(x).log2()
    }
}

/// Count byte values into `out` using two interleaved histograms.
fn count_bytes(data: &[u8], out: &mut [u32; 256]) {
    let mut h0 = AlignedHistogram::new();
    let mut h1 = AlignedHistogram::new();

    let chunks = data.chunks_exact(2);
    let remainder = chunks.remainder();
    for pair in chunks {
        h0.counts[pair[0] as usize] += 1;
        h1.counts[pair[1] as usize] += 1;
    }
    if let Some(&byte) = remainder.first() {
        h0.counts[byte as usize] += 1;
    }

    // SIMD merge, four counters at a time.
    for i in (0..256).step_by(4) {
        let a = u32x4::new([
            h0.counts[i],
            h0.counts[i + 1],
            h0.counts[i + 2],
            h0.counts[i + 3],
        ]);
        let b = u32x4::new([
            h1.counts[i],
            h1.counts[i + 1],
            h1.counts[i + 2],
            h1.counts[i + 3],
        ]);
        let sum = (a + b).to_array();
        out[i] += sum[0];
        out[i + 1] += sum[1];
        out[i + 2] += sum[2];
        out[i + 3] += sum[3];
    }
}

/// Entropy in bits (0-8) from a populated histogram covering `total` bytes.
///
/// Uses `H = log2(n) - (1/n) * sum(c * log2(c))`, which needs one log per
/// distinct byte value instead of one per byte.
fn entropy_from_counts(counts: &[u32; 256], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let log2_total = total.log2();
    let mut sum_c_log_c = 0.0f64;
    for &count in counts {
        if count > 0 {
            sum_c_log_c += f64::from(count) * fast_log2(count);
        }
    }
    log2_total - sum_c_log_c / total
}

/// Shannon entropy of a byte slice in bits, 0 (uniform) to 8 (maximal).
pub fn shannon_entropy(data: &[u8]) -> f64 {
    let mut counts = [0u32; 256];
    count_bytes(data, &mut counts);
    entropy_from_counts(&counts, data.len())
}

/// Shannon entropy of a whole buffer, counting chunks in parallel.
///
/// Produces exactly the same histogram as the serial path; only the counting
/// is split across threads.
pub fn buffer_entropy(data: &[u8]) -> f64 {
    const PARALLEL_THRESHOLD: usize = 1 << 20;

    if data.len() < PARALLEL_THRESHOLD {
        return shannon_entropy(data);
    }

    let chunk_size = (data.len() / rayon::current_num_threads()).max(1 << 16);
    let counts = data
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut local = [0u32; 256];
            count_bytes(chunk, &mut local);
            local
        })
        .reduce(
            || [0u32; 256],
            |mut acc, local| {
                for i in (0..256).step_by(4) {
                    let a = u32x4::new([acc[i], acc[i + 1], acc[i + 2], acc[i + 3]]);
                    let b = u32x4::new([local[i], local[i + 1], local[i + 2], local[i + 3]]);
                    let sum = (a + b).to_array();
                    acc[i] = sum[0];
                    acc[i + 1] = sum[1];
                    acc[i + 2] = sum[2];
                    acc[i + 3] = sum[3];
                }
                acc
            },
        );

    entropy_from_counts(&counts, data.len())
}

/// Normalized (0-1) entropy of the window centred on `offset`, reusing the
/// caller's histogram buffer across consecutive offsets.
pub fn window_entropy_with_buffer(data: &[u8], offset: usize, counts: &mut [u32; 256]) -> f64 {
    if offset >= data.len() {
        return 0.0;
    }
    let half = ENTROPY_WINDOW / 2;
    let start = offset.saturating_sub(half);
    let end = (offset + half).min(data.len());

    counts.fill(0);
    count_bytes(&data[start..end], counts);
    entropy_from_counts(counts, end - start) / 8.0
}

/// Normalized (0-1) entropy of the window centred on `offset`.
pub fn window_entropy(data: &[u8], offset: usize) -> f64 {
    let mut counts = [0u32; 256];
    window_entropy_with_buffer(data, offset, &mut counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_window_has_zero_entropy() {
        let data = vec![0x42u8; 512];
        assert_eq!(window_entropy(&data, 256), 0.0);
        assert_eq!(shannon_entropy(&data), 0.0);
    }

    #[test]
    fn distinct_window_has_unit_entropy() {
        // 256 distinct byte values, each exactly once, centred window.
        let data: Vec<u8> = (0..=255u8).collect();
        assert_eq!(window_entropy(&data, 128), 1.0);
        assert_eq!(shannon_entropy(&data), 8.0);
    }

    #[test]
    fn boundary_windows_are_clipped() {
        let data: Vec<u8> = (0..=255u8).collect();
        // Window at offset 0 covers only the first 128 bytes: 128 distinct
        // values, entropy log2(128) = 7 bits, 0.875 normalized.
        let clipped = window_entropy(&data, 0);
        assert!((clipped - 0.875).abs() < 1e-12);
        // Past-the-end offsets degrade to zero.
        assert_eq!(window_entropy(&data, 256), 0.0);
    }

    #[test]
    fn counting_matches_naive() {
        let data: Vec<u8> = (0..1000).map(|i| (i * 17 + 31) as u8).collect();

        let mut simd = [0u32; 256];
        count_bytes(&data, &mut simd);

        let mut naive = [0u32; 256];
        for &byte in &data {
            naive[byte as usize] += 1;
        }
        assert_eq!(simd, naive);
    }

    #[test]
    fn parallel_entropy_matches_serial() {
        let data: Vec<u8> = (0..(1 << 20) + 17).map(|i| (i % 251) as u8).collect();
        let serial = shannon_entropy(&data);
        let parallel = buffer_entropy(&data);
        assert!((serial - parallel).abs() < 1e-12);
    }

    #[test]
    fn alternating_bytes_have_one_bit() {
        let data: Vec<u8> = (0..512).map(|i| (i % 2) as u8).collect();
        assert!((shannon_entropy(&data) - 1.0).abs() < 1e-12);
    }
}
