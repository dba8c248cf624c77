use std::time::Duration;

use chrono::DateTime;
use http::HeaderMap;

/// Reads a provider's retry hint. `retry-after-ms` takes precedence over
/// `retry-after`, which may be seconds or an HTTP date.
#[must_use]
pub fn extract_retry_after(headers: &HeaderMap) -> Option<Duration> {
    if let Some(ms) = headers
        .get("retry-after-ms")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        return Some(Duration::from_millis(ms));
    }

    let retry_after_str = headers
        .get(http::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?;

    if let Ok(seconds) = retry_after_str.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // HTTP date form
    if let Ok(datetime) =
        DateTime::parse_from_str(retry_after_str, "%a, %d %b %Y %H:%M:%S GMT")
    {
        let now = chrono::Utc::now();
        let target = datetime.to_utc();
        if target > now {
            return (target - now).to_std().ok();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn millisecond_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after-ms", HeaderValue::from_static("1500"));
        headers.insert(
            http::header::RETRY_AFTER,
            HeaderValue::from_static("10"),
        );
        assert_eq!(
            extract_retry_after(&headers),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn seconds_form_parses() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::RETRY_AFTER,
            HeaderValue::from_static("30"),
        );
        assert_eq!(
            extract_retry_after(&headers),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn absent_headers_mean_no_hint() {
        assert_eq!(extract_retry_after(&HeaderMap::new()), None);
    }
}
