/// USACE district page client
///
/// Retrieves the raw text of each configured reservoir page. The district
/// servers only serve HTML, so pages are requested through the r.jina.ai
/// text proxy (already part of each registry URL), which returns plain text
/// for SWL tabular pages and markdown for the MVK bulletin.
///
/// No retries: a failed page becomes that source's error record and the
/// next scheduled build tries again.

use std::time::Duration;

use crate::assemble::Fetched;
use crate::logging::{self, LogSource};
use crate::model::FetchError;
use crate::sources::SourceConfig;

const USER_AGENT: &str = concat!("usace_levels/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Client
// ============================================================================

/// Builds the blocking client shared by every request of a run.
pub fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Fetch the body of `url` as text
///
/// # Returns
/// The response body, or `FetchError::Http` for a non-2xx status and
/// `FetchError::Transport` for anything that kept a response from arriving.
pub fn fetch_text(client: &reqwest::blocking::Client, url: &str) -> Result<String, FetchError> {
    let transport = |e: reqwest::Error| FetchError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    };

    let response = client
        .get(url)
        .header("Accept", "text/plain, text/markdown, */*")
        .send()
        .map_err(transport)?;

    if !response.status().is_success() {
        return Err(FetchError::Http {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.text().map_err(transport)
}

/// Fetches every source in registry order.
///
/// Sources sharing a URL (several reservoirs on one bulletin) are requested
/// once per source; the pages are small and the set is fixed.
pub fn fetch_all<'a>(
    client: &reqwest::blocking::Client,
    sources: &'a [SourceConfig],
) -> Vec<(&'a SourceConfig, Fetched)> {
    sources
        .iter()
        .map(|source| {
            logging::debug(LogSource::Http, Some(&source.key), &format!("GET {}", source.url));
            let fetched = fetch_text(client, &source.url);
            if let Ok(ref body) = fetched {
                logging::debug(
                    LogSource::Http,
                    Some(&source.key),
                    &format!("received {} bytes", body.len()),
                );
            }
            (source, fetched)
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_timeout() {
        assert!(build_client(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_unreachable_host_is_a_transport_error() {
        let client = build_client(Duration::from_secs(2)).unwrap();
        // Port 9 on localhost: connection refused without touching the network.
        let err = fetch_text(&client, "http://127.0.0.1:9/resrep.htm").unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
