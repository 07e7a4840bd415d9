use crate::rate_limit::RATE_LIMIT_FALLBACK_BACKOFF_SECS;
use cn_core::{CnError, CnResult};
use std::time::Duration;

/// Below this many requests remaining in the tracker's current rate-limit
/// window, every response gets a warning so an operator can see trouble
/// coming before the tracker actually starts returning 403/429.
pub const RATE_LIMIT_WARN_THRESHOLD: u64 = 10;

/// Sends `request` and, if the tracker responds 403/429, waits for the
/// `Retry-After` header (or a fixed fallback) and retries exactly once.
/// A second rate-limited response gives up with `CnError::RateLimited`
/// rather than retrying indefinitely. Every response, rate-limited or not,
/// has its `X-RateLimit-Remaining` counter (GitHub and Jira Cloud both use
/// this header name) checked and a warning logged once it drops below
/// `RATE_LIMIT_WARN_THRESHOLD`, so an operator sees the budget draining
/// before the tracker starts rejecting requests outright.
pub async fn send_with_retry(
    client: &reqwest::Client,
    request: reqwest::Request,
    target_label: &str,
) -> CnResult<reqwest::Response> {
    let retry_request = request.try_clone();

    let response = client
        .execute(request)
        .await
        .map_err(|e| CnError::ScannerError {
            scanner: target_label.to_string(),
            reason: e.to_string(),
        })?;

    warn_if_rate_limit_low(&response, target_label);

    if !is_rate_limited(response.status()) {
        return Ok(response);
    }

    let backoff = retry_after(&response).unwrap_or(Duration::from_secs(RATE_LIMIT_FALLBACK_BACKOFF_SECS));
    tokio::time::sleep(backoff).await;

    let retry_request = retry_request.ok_or_else(|| CnError::RateLimited {
        target: target_label.to_string(),
    })?;

    let retried = client
        .execute(retry_request)
        .await
        .map_err(|e| CnError::ScannerError {
            scanner: target_label.to_string(),
            reason: e.to_string(),
        })?;

    warn_if_rate_limit_low(&retried, target_label);

    if is_rate_limited(retried.status()) {
        return Err(CnError::RateLimited {
            target: target_label.to_string(),
        });
    }

    Ok(retried)
}

fn is_rate_limited(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 403 || status.as_u16() == 429
}

fn warn_if_rate_limit_low(response: &reqwest::Response, target_label: &str) {
    let remaining = response
        .headers()
        .get("X-RateLimit-Remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    if let Some(remaining) = remaining {
        if remaining < RATE_LIMIT_WARN_THRESHOLD {
            tracing::warn!(
                target = target_label,
                remaining,
                threshold = RATE_LIMIT_WARN_THRESHOLD,
                "tracker rate limit budget is running low"
            );
        }
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}
