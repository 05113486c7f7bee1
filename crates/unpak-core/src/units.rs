//! Human-readable byte quantities for progress output.

const UNIT: u64 = 1000;
const PREFIXES: [char; 6] = ['k', 'M', 'G', 'T', 'P', 'E'];

/// Formats a signed byte count with SI (power of 1000) prefixes.
///
/// Values below 1000 are printed as an integer; larger values use the largest
/// prefix whose divisor does not exceed the value, with one fractional digit.
/// Negative values are formatted from their magnitude with a leading `-`.
///
/// # Examples
///
/// ```
/// use unpak_core::units::format_bytes_si;
///
/// assert_eq!(format_bytes_si(999), "999 B");
/// assert_eq!(format_bytes_si(1_500_000), "1.5 MB");
/// assert_eq!(format_bytes_si(-2000), "-2.0 kB");
/// ```
#[must_use]
pub fn format_bytes_si(bytes: i64) -> String {
    let formatted = format_magnitude(bytes.unsigned_abs());
    if bytes < 0 {
        format!("-{formatted}")
    } else {
        formatted
    }
}

/// Formats an unsigned byte count, see [`format_bytes_si`].
#[must_use]
pub fn format_size_si(bytes: u64) -> String {
    format_magnitude(bytes)
}

fn format_magnitude(bytes: u64) -> String {
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_below_unit() {
        assert_eq!(format_bytes_si(0), "0 B");
        assert_eq!(format_bytes_si(1), "1 B");
        assert_eq!(format_bytes_si(999), "999 B");
    }

    #[test]
    fn test_format_prefixes() {
        assert_eq!(format_bytes_si(1000), "1.0 kB");
        assert_eq!(format_bytes_si(1536), "1.5 kB");
        assert_eq!(format_bytes_si(1_500_000), "1.5 MB");
        assert_eq!(format_bytes_si(2_000_000_000), "2.0 GB");
        assert_eq!(format_bytes_si(3_000_000_000_000), "3.0 TB");
        assert_eq!(format_bytes_si(4_000_000_000_000_000), "4.0 PB");
        assert_eq!(format_bytes_si(5_000_000_000_000_000_000), "5.0 EB");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_bytes_si(-1), "-1 B");
        assert_eq!(format_bytes_si(-2000), "-2.0 kB");
    }

    #[test]
    fn test_format_extremes() {
        assert_eq!(format_bytes_si(i64::MAX), "9.2 EB");
        assert_eq!(format_bytes_si(i64::MIN), "-9.2 EB");
        assert_eq!(format_size_si(u64::MAX), "18.4 EB");
    }

    #[test]
    fn test_format_rounding_below_next_prefix() {
        assert_eq!(format_size_si(999_999), "1000.0 kB");
        assert_eq!(format_size_si(1_000_000), "1.0 MB");
    }
}
