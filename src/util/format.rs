//! Human-readable formatting for the address-label and summary UI.

/// Format a byte count as a human-readable string.
///
/// # Examples
/// ```
/// use chorograph::util::format::format_bytes;
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1048576), "1.00 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Format an absolute byte offset as a hexadecimal memory address.
pub fn format_address(offset: u64) -> String {
    format!("0x{offset:08X}")
}

/// Format an offset range as a hexadecimal address range, inclusive of the
/// final byte (the form shown in the hovered-region label).
pub fn format_address_range(range: &std::ops::Range<u64>) -> String {
    if range.is_empty() {
        return String::new();
    }
    format!("0x{:08X} - 0x{:08X}", range.start, range.end - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn addresses_are_zero_padded_hex() {
        assert_eq!(format_address(0), "0x00000000");
        assert_eq!(format_address(0xDEAD), "0x0000DEAD");
        assert_eq!(format_address_range(&(0x10..0x20)), "0x00000010 - 0x0000001F");
        assert_eq!(format_address_range(&(5..5)), "");
    }
}
