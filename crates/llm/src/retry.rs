/// First backoff step; later attempts double up to a cap.
pub(crate) const BASE_BACKOFF_MS: u64 = 200;

pub(crate) fn should_retry_status(status: u16) -> bool {
    status == 408 || status == 429 || status >= 500
}

pub(crate) fn backoff_ms(attempt: usize) -> u64 {
    let shift = attempt.min(6);
    BASE_BACKOFF_MS.saturating_mul(1_u64 << shift)
}

/// Numeric `retry-after` seconds; HTTP-date forms are ignored.
pub(crate) fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let raw = headers.get("retry-after")?.to_str().ok()?.trim();
    raw.parse::<u64>().ok().map(|s| s.saturating_mul(1000))
}

/// The server floor wins when it is longer than our own backoff.
pub(crate) fn retry_delay_ms(attempt: usize, retry_after_ms: Option<u64>) -> u64 {
    let backoff = backoff_ms(attempt);
    match retry_after_ms {
        Some(floor) => backoff.max(floor),
        None => backoff,
    }
}

pub(crate) fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
}
