//! Input validation and formatting helpers

use url::Url;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Check that `raw` is a complete absolute URL (scheme and authority)
///
/// ```
/// use presign_uploadr::upload::format::is_valid_url;
///
/// assert!(is_valid_url("https://bucket.s3.amazonaws.com/key?X-Amz-Signature=abc"));
/// assert!(!is_valid_url("not-a-url"));
/// assert!(!is_valid_url("/relative/path"));
/// ```
pub fn is_valid_url(raw: &str) -> bool {
    parse_target(raw).is_some()
}

/// Parse a target string into a URL, `None` when it is not a valid absolute URL
pub fn parse_target(raw: &str) -> Option<Url> {
    Url::parse(raw).ok().filter(|url| url.has_host())
}

/// Render a byte count with the largest fitting binary unit
///
/// Up to two decimals are kept and trailing zeros are dropped.
///
/// ```
/// use presign_uploadr::upload::format::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 Bytes");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let fixed = format!("{:.2}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// Percentage of `loaded` over `total`, rounded and clamped to 0..=100
///
/// Returns `None` when the total is unknown (zero).
pub fn progress_percent(loaded: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let percent = (loaded as f64 / total as f64 * 100.0).round();
    Some(percent.clamp(0.0, 100.0) as u8)
}

/// URL without its query string, safe to log
///
/// Pre-signed URLs carry their signature in the query.
pub fn redact_url(url: &Url) -> String {
    let mut redacted = url.clone();
    redacted.set_query(None);
    redacted.set_fragment(None);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 + 256 * 1024), "5.25 MB");
        assert_eq!(format_file_size(1073741824), "1 GB");
    }

    #[test]
    fn test_format_file_size_two_decimals() {
        // 1234 / 1024 = 1.2050...
        assert_eq!(format_file_size(1234), "1.21 KB");
    }

    #[test]
    fn test_format_file_size_stays_in_gb() {
        assert_eq!(format_file_size(2048 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://bucket.example.com/key?sig=abc"));
        assert!(is_valid_url("http://localhost:9000/bucket/key"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("not-a-url"));
        assert!(!is_valid_url("bucket/key"));
        assert!(!is_valid_url("mailto:someone@example.com"));
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(50, 100), Some(50));
        assert_eq!(progress_percent(1, 3), Some(33));
        assert_eq!(progress_percent(2, 3), Some(67));
        assert_eq!(progress_percent(0, 100), Some(0));
        assert_eq!(progress_percent(150, 100), Some(100));
        assert_eq!(progress_percent(10, 0), None);
    }

    #[test]
    fn test_redact_url_drops_signature() {
        let url = Url::parse("https://b.example.com/k.bin?X-Amz-Signature=secret").unwrap();
        assert_eq!(redact_url(&url), "https://b.example.com/k.bin");
    }
}
