// src/core/scanner/headers_scanner.rs

use std::error::Error as StdError;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::redirect::{Attempt, Policy};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use crate::core::config::ScanConfig;
use crate::core::models::{HeaderFindings, HttpSummary, ProbeOutcome, RawHeaders};
use crate::core::target::{PublicResolver, host_of, is_reserved};

/// Result of the single GET the header probe performs.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    pub summary: ProbeOutcome<HttpSummary>,
    pub headers: HeaderFindings,
    pub raw_headers: RawHeaders,
}

impl HttpProbe {
    /// All six headers missing, no raw headers.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            summary: ProbeOutcome::unavailable(reason),
            headers: HeaderFindings::all_missing(),
            raw_headers: RawHeaders::new(),
        }
    }
}

/// Builds the shared HTTP client for the header probe.
///
/// Redirects are followed up to `http.max_redirects` hops. Every hostname,
/// redirect targets included, is resolved through [`PublicResolver`]; a hop to
/// a literal reserved address never reaches a resolver and is refused by the
/// redirect policy instead. Either refusal fails the probe.
pub fn build_client(config: &ScanConfig) -> reqwest::Result<Client> {
    let max_redirects = config.http.max_redirects;
    let policy = Policy::custom(move |attempt| redirect_decision(attempt, max_redirects));
    Client::builder()
        .user_agent(config.http.user_agent.clone())
        .timeout(config.timeouts.http())
        .redirect(policy)
        .dns_resolver(Arc::new(PublicResolver))
        .build()
}

fn redirect_decision(attempt: Attempt<'_>, max_redirects: usize) -> reqwest::redirect::Action {
    if attempt.previous().len() >= max_redirects {
        let message = format!("too many redirects (limit {max_redirects})");
        return attempt.error(message);
    }
    let next = attempt.url().clone();
    let origin_host = attempt.previous().first().and_then(host_of);

    if !matches!(next.scheme(), "http" | "https") {
        let message = format!("redirect to unsupported scheme `{}`", next.scheme());
        return attempt.error(message);
    }
    let Some(host) = host_of(&next) else {
        return attempt.error("redirect without a host");
    };
    if origin_host.as_deref() == Some(host.as_str()) {
        return attempt.follow();
    }
    if host.parse().is_ok_and(is_reserved) {
        warn!(host = %host, "Refusing redirect to an internal host.");
        let message = format!("redirect to internal host `{host}` refused");
        return attempt.error(message);
    }
    debug!(to = %next, "Following redirect.");
    attempt.follow()
}

/// Lowercased header names, repeated values joined with ", ".
///
/// Non-UTF-8 bytes are replaced rather than dropping the header.
pub fn collect_raw_headers(headers: &HeaderMap) -> RawHeaders {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), joined)
        })
        .collect()
}

/// Fetches the target once and records which security headers it sent.
///
/// # Arguments
/// * `client` - Client from `build_client`.
/// * `url` - The normalized target URL.
///
/// # Returns
/// An `HttpProbe`; on any network, timeout, TLS or redirect failure the
/// summary is `Unavailable` and every header is `Missing`.
pub async fn run_headers_scan(client: &Client, url: &Url) -> HttpProbe {
    info!(url = %url, "Starting headers scan.");

    match client.get(url.clone()).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            let raw_headers = collect_raw_headers(response.headers());
            let headers = HeaderFindings::from_raw(&raw_headers);
            info!(
                status,
                final_url = %final_url,
                present = headers.present_count(),
                "Headers scan finished."
            );
            HttpProbe {
                summary: ProbeOutcome::Available(HttpSummary { status, final_url }),
                headers,
                raw_headers,
            }
        }
        Err(e) => {
            let reason = describe_error(&e);
            warn!(url = %url, error = %reason, "HTTP request failed for headers scan.");
            HttpProbe::unavailable(reason)
        }
    }
}

/// Flattens an error and its sources into one line.
pub(crate) fn describe_error(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
