use crate::domain::errors::MarketDataError;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use url::Url;

/// Whole-request timeout of every data-source client
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates a new HTTP client with retry middleware
    pub fn create_client() -> ClientWithMiddleware {
        // Exponential backoff, max 3 retries on transient failures
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("stockcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

/// Joins `path` onto `base_url` and appends the query parameters.
///
/// reqwest-middleware's builder has no `.query()`, so the full URL is built up front.
pub fn build_url_with_query<K, V>(
    base_url: &str,
    path: &str,
    params: &[(K, V)],
) -> Result<Url, MarketDataError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let base = base_url.trim_end_matches('/');
    let mut url = Url::parse(&format!("{}/{}", base, path.trim_start_matches('/'))).map_err(|e| {
        MarketDataError::RequestFailed {
            reason: format!("Invalid URL {}: {}", base_url, e),
        }
    })?;

    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
    }
    Ok(url)
}

/// Maps a transport failure to the data-source error surfaced to callers.
pub fn map_request_error(source: &str, error: reqwest_middleware::Error) -> MarketDataError {
    match error {
        reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => MarketDataError::Timeout {
            duration_ms: REQUEST_TIMEOUT.as_millis() as u64,
        },
        other => MarketDataError::RequestFailed {
            reason: format!("{} request failed: {}", source, other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_with_query() {
        let url = build_url_with_query(
            "https://query1.finance.yahoo.com/",
            "/v8/finance/chart/AAPL",
            &[("interval", "1d"), ("events", "div split")],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/AAPL?interval=1d&events=div+split"
        );
    }

    #[test]
    fn test_build_url_without_params() {
        let url = build_url_with_query::<&str, &str>("http://localhost:8080", "v2/stocks/bars", &[])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v2/stocks/bars");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(build_url_with_query::<&str, &str>("not a url", "x", &[]).is_err());
    }

    #[test]
    fn test_non_timeout_failure_names_source() {
        let error = map_request_error(
            "Yahoo",
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("connection reset")),
        );
        match error {
            MarketDataError::RequestFailed { reason } => {
                assert!(reason.starts_with("Yahoo request failed"));
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
