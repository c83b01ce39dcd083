// src/core/scanner/endpoint_scanner.rs

//! Optional probe for commonly exposed sensitive paths.
//!
//! A path only counts as exposed when it answers 2xx *and* the body carries
//! the path's content marker, so catch-all pages that return 200 for every
//! URL are not reported.

use std::sync::Arc;

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use crate::core::config::ScanConfig;
use crate::core::models::{EndpointFindings, ProbeOutcome};
use crate::core::scanner::headers_scanner::describe_error;
use crate::core::target::PublicResolver;

struct SensitivePath<'a> {
    path: &'a str,
    marker: &'a Lazy<Regex>,
}

static RE_GIT_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ref: refs/").unwrap());
static RE_DOTENV: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[A-Z][A-Z0-9_]*=").unwrap());
static RE_SERVER_STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Apache Server Status|Server uptime").unwrap());
static RE_PHPINFO: Lazy<Regex> = Lazy::new(|| Regex::new(r"<title>phpinfo\(\)</title>|PHP Version \d").unwrap());
static RE_DS_STORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)^\x00\x00\x00\x01Bud1").unwrap());
static RE_WP_CONFIG: Lazy<Regex> = Lazy::new(|| Regex::new(r"DB_PASSWORD|define\(\s*'DB_NAME'").unwrap());

static SENSITIVE_PATHS: &[SensitivePath] = &[
    SensitivePath { path: "/.git/HEAD", marker: &RE_GIT_HEAD },
    SensitivePath { path: "/.env", marker: &RE_DOTENV },
    SensitivePath { path: "/server-status", marker: &RE_SERVER_STATUS },
    SensitivePath { path: "/phpinfo.php", marker: &RE_PHPINFO },
    SensitivePath { path: "/.DS_Store", marker: &RE_DS_STORE },
    SensitivePath { path: "/wp-config.php.bak", marker: &RE_WP_CONFIG },
];

/// Number of paths the probe requests.
pub fn probed_path_count() -> usize {
    SENSITIVE_PATHS.len()
}

/// Client for the endpoint probe. Redirects are never followed: a redirect to
/// a login page is not an exposure.
pub fn build_probe_client(config: &ScanConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(config.http.user_agent.clone())
        .timeout(config.timeouts.endpoint())
        .redirect(Policy::none())
        .dns_resolver(Arc::new(PublicResolver))
        .build()
}

/// Requests every sensitive path against the target's origin concurrently.
///
/// Individual request failures count as "not exposed". The probe is only
/// `Unavailable` when not a single path could be requested.
pub async fn run_endpoint_scan(client: &Client, base: &Url) -> ProbeOutcome<EndpointFindings> {
    info!(base = %base, paths = SENSITIVE_PATHS.len(), "Starting sensitive endpoint scan.");

    let checks = SENSITIVE_PATHS.iter().map(|entry| check_path(client, base, entry));
    let results = join_all(checks).await;

    let reached = results.iter().filter(|r| r.is_ok()).count();
    if reached == 0 {
        let reason = results
            .into_iter()
            .find_map(Result::err)
            .unwrap_or_else(|| "no paths probed".to_string());
        warn!(base = %base, error = %reason, "Sensitive endpoint scan unavailable.");
        return ProbeOutcome::unavailable(reason);
    }

    let exposed: Vec<String> = SENSITIVE_PATHS
        .iter()
        .zip(results)
        .filter(|(_, result)| matches!(result, Ok(true)))
        .map(|(entry, _)| entry.path.to_string())
        .collect();

    if exposed.is_empty() {
        info!(base = %base, "Sensitive endpoint scan finished, nothing exposed.");
    } else {
        warn!(base = %base, exposed = ?exposed, "Sensitive paths are publicly reachable.");
    }
    ProbeOutcome::Available(EndpointFindings {
        probed: SENSITIVE_PATHS.len(),
        exposed,
    })
}

/// `Ok(true)` when the path is exposed, `Err` when the request itself failed.
async fn check_path(client: &Client, base: &Url, entry: &SensitivePath<'_>) -> Result<bool, String> {
    let url = base.join(entry.path).map_err(|e| e.to_string())?;
    let response = client.get(url).send().await.map_err(|e| {
        debug!(path = entry.path, error = %e, "Sensitive path request failed.");
        describe_error(&e)
    })?;

    let status = response.status();
    if !status.is_success() {
        debug!(path = entry.path, %status, "Sensitive path not served.");
        return Ok(false);
    }
    let body = response.bytes().await.map_err(|e| describe_error(&e))?;
    let exposed = entry.marker.is_match(&body);
    debug!(path = entry.path, %status, exposed, "Sensitive path answered.");
    Ok(exposed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker_for(path: &str) -> &'static Lazy<Regex> {
        SENSITIVE_PATHS.iter().find(|p| p.path == path).unwrap().marker
    }

    #[test]
    fn markers_match_real_content() {
        assert!(marker_for("/.git/HEAD").is_match(b"ref: refs/heads/main\n"));
        assert!(marker_for("/.env").is_match(b"# local\nAPP_KEY=base64:abc\n"));
        assert!(marker_for("/.DS_Store").is_match(b"\x00\x00\x00\x01Bud1\x00\x00"));
        assert!(marker_for("/phpinfo.php").is_match(b"<html><title>phpinfo()</title>"));
    }

    #[test]
    fn markers_ignore_soft_404_pages() {
        let page = b"<!doctype html><html><body><h1>Page not found</h1></body></html>";
        for entry in SENSITIVE_PATHS {
            assert!(!entry.marker.is_match(page), "{} matched a 404 page", entry.path);
        }
    }

    #[tokio::test]
    async fn unreachable_origin_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = build_probe_client(&ScanConfig::default()).unwrap();
        let base = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        assert!(!run_endpoint_scan(&client, &base).await.is_available());
    }
}
