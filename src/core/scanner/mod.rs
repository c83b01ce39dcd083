// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module.
// It declares the probe modules and hosts the scan orchestrator.
pub mod dns_scanner;
pub mod endpoint_scanner;
pub mod headers_scanner;
pub mod ssl_scanner;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::core::attribution::{attribute_panel, classify};
use crate::core::config::ScanConfig;
use crate::core::csp::analyze_csp;
use crate::core::error::ScanError;
use crate::core::geoip::GeoIpLookup;
use crate::core::knowledge_base::{RuleContext, recommend};
use crate::core::models::{
    DnsPanelEntry, EndpointFindings, ProbeOutcome, REPORT_SCHEMA_VERSION, ScanReport, ScanTarget,
    SecurityHeader, TlsRecord,
};
use crate::core::scoring::{ScoreInput, compute_score};
use crate::core::target::{guard_target, normalize_target};

use self::dns_scanner::{primary_ip, run_dns_scan};
use self::endpoint_scanner::{build_probe_client, run_endpoint_scan};
use self::headers_scanner::{HttpProbe, build_client, run_headers_scan};
use self::ssl_scanner::{TLS_PORT, run_ssl_scan};

const DEADLINE_REASON: &str = "abandoned at the scan deadline";

/// Terminal states of every probe of one scan.
#[derive(Debug, Clone)]
pub struct ProbeResults {
    pub http: HttpProbe,
    pub tls: ProbeOutcome<TlsRecord>,
    pub dns: Vec<DnsPanelEntry>,
    /// `None` when the endpoint probe is disabled.
    pub endpoints: Option<ProbeOutcome<EndpointFindings>>,
}

/// The scan orchestrator.
///
/// Holds only read-only state (configuration, the GeoIP handle and the HTTP
/// clients), so one instance serves any number of concurrent scans.
pub struct Scanner {
    config: Arc<ScanConfig>,
    geoip: Arc<dyn GeoIpLookup>,
    http_client: Client,
    probe_client: Client,
}

impl Scanner {
    pub fn new(config: ScanConfig, geoip: Arc<dyn GeoIpLookup>) -> reqwest::Result<Self> {
        let http_client = build_client(&config)?;
        let probe_client = build_probe_client(&config)?;
        Ok(Self {
            config: Arc::new(config),
            geoip,
            http_client,
            probe_client,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Runs the full pipeline for a user-supplied target.
    ///
    /// Only malformed or blocked input is an error; both are detected before
    /// any probe runs. Every other failure degrades into the report.
    ///
    /// The scan deadline starts here, so time spent in the guard's lookup
    /// counts against it.
    pub async fn scan(&self, raw: &str) -> Result<ScanReport, ScanError> {
        let deadline = Instant::now() + self.config.timeouts.scan();
        let url = normalize_target(raw)?;
        let target = guard_target(url, self.config.timeouts.guard()).await?;
        Ok(self.probe_until(target, deadline).await)
    }

    /// Probes a target that already passed `guard_target`, with the full scan
    /// budget starting now.
    pub async fn probe(&self, target: ScanTarget) -> ScanReport {
        self.probe_until(target, Instant::now() + self.config.timeouts.scan()).await
    }

    /// Fans out the probes and assembles the report.
    ///
    /// All probes share `deadline`; a probe still running when it elapses
    /// is aborted and replaced by its sentinel.
    pub async fn probe_until(&self, target: ScanTarget, deadline: Instant) -> ScanReport {
        let started = Instant::now();
        info!(url = %target.url, host = %target.host, "Starting full scan.");

        let http_handle = {
            let client = self.http_client.clone();
            let url = target.url.clone();
            tokio::spawn(async move { run_headers_scan(&client, &url).await })
        };
        let tls_handle = {
            let host = target.host.clone();
            let ip = target.resolved_ip;
            let timeout = self.config.timeouts.tls();
            tokio::spawn(async move { run_ssl_scan(&host, ip, TLS_PORT, timeout).await })
        };
        let dns_handle = {
            let host = target.host.clone();
            let resolvers = self.config.resolvers.clone();
            let timeout = self.config.timeouts.dns();
            tokio::spawn(async move { run_dns_scan(&host, &resolvers, timeout).await })
        };
        let endpoint_handle = self.config.endpoint_probe.enabled.then(|| {
            let client = self.probe_client.clone();
            let url = target.url.clone();
            tokio::spawn(async move { run_endpoint_scan(&client, &url).await })
        });

        let http = join_probe(http_handle, deadline, "http")
            .await
            .unwrap_or_else(|| HttpProbe::unavailable(DEADLINE_REASON));
        let tls = join_probe(tls_handle, deadline, "tls")
            .await
            .unwrap_or_else(|| ProbeOutcome::unavailable(DEADLINE_REASON));
        let dns = join_probe(dns_handle, deadline, "dns").await.unwrap_or_else(|| {
            self.config
                .resolvers
                .iter()
                .map(|r| DnsPanelEntry::unanswered(r, Some(DEADLINE_REASON.to_string())))
                .collect()
        });
        let endpoints = match endpoint_handle {
            Some(handle) => Some(
                join_probe(handle, deadline, "endpoints")
                    .await
                    .unwrap_or_else(|| ProbeOutcome::unavailable(DEADLINE_REASON)),
            ),
            None => None,
        };

        let results = ProbeResults { http, tls, dns, endpoints };
        let report = assemble_report(target, results, self.geoip.as_ref(), &self.config, Utc::now());
        info!(
            url = %report.target.url,
            score = report.score,
            recommendations = report.recommendations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Full scan finished."
        );
        report
    }
}

/// Waits for a probe task until the shared deadline, aborting it on expiry.
async fn join_probe<T>(handle: JoinHandle<T>, deadline: Instant, probe: &'static str) -> Option<T> {
    let abort = handle.abort_handle();
    match tokio::time::timeout_at(deadline, handle).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            error!(probe, error = %e, "Probe task failed.");
            None
        }
        Err(_) => {
            abort.abort();
            warn!(probe, "Probe still running at the scan deadline, abandoning it.");
            None
        }
    }
}

/// Merges probe results into the final report.
///
/// Pure apart from the GeoIP lookups: the same inputs always produce the same
/// report.
pub fn assemble_report(
    target: ScanTarget,
    results: ProbeResults,
    geoip: &dyn GeoIpLookup,
    config: &ScanConfig,
    now: DateTime<Utc>,
) -> ScanReport {
    let ProbeResults { http, tls, mut dns, endpoints } = results;

    attribute_panel(geoip, &mut dns);
    let primary_ip = primary_ip(&dns).or(Some(target.resolved_ip));

    let csp = analyze_csp(http.headers.value(SecurityHeader::ContentSecurityPolicy));
    let infrastructure = classify(&http.raw_headers, geoip, primary_ip);

    let score = compute_score(
        &ScoreInput {
            headers: &http.headers,
            csp: &csp,
            tls: &tls,
            infrastructure: &infrastructure,
            endpoints: endpoints.as_ref(),
        },
        &config.scoring,
    );
    let recommendations = recommend(&RuleContext {
        headers: &http.headers,
        csp: &csp,
        tls: &tls,
        endpoints: endpoints.as_ref(),
        tls_expiry_warning_days: config.recommendations.tls_expiry_warning_days,
    });

    ScanReport {
        schema_version: REPORT_SCHEMA_VERSION,
        target,
        scanned_at: now,
        score,
        http: http.summary,
        headers: http.headers,
        csp,
        tls,
        dns,
        primary_ip,
        infrastructure,
        endpoints,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ResolverEntry;
    use crate::core::geoip::StaticGeoIp;
    use crate::core::models::{CdnProvider, CspStatus, HeaderFindings, HttpSummary, RawHeaders};
    use std::net::IpAddr;
    use url::Url;

    fn target() -> ScanTarget {
        ScanTarget {
            url: Url::parse("https://example.com/").unwrap(),
            host: "example.com".into(),
            resolved_ip: "93.184.216.34".parse().unwrap(),
        }
    }

    fn http_with(headers: &[(&str, &str)]) -> HttpProbe {
        let raw: RawHeaders = headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        HttpProbe {
            summary: ProbeOutcome::Available(HttpSummary {
                status: 200,
                final_url: "https://example.com/".into(),
            }),
            headers: HeaderFindings::from_raw(&raw),
            raw_headers: raw,
        }
    }

    fn tls13(days: i64, now: DateTime<Utc>) -> ProbeOutcome<TlsRecord> {
        ProbeOutcome::Available(TlsRecord {
            issuer: "DigiCert Inc".into(),
            subject: "example.com".into(),
            valid_from: now - chrono::Duration::days(100),
            valid_to: now + chrono::Duration::days(days),
            days_remaining: days,
            protocol_version: "TLSv1.3".into(),
        })
    }

    fn panel(config: &ScanConfig, answers: &[Option<&str>]) -> Vec<DnsPanelEntry> {
        config
            .resolvers
            .iter()
            .zip(answers)
            .map(|(resolver, answer)| DnsPanelEntry {
                ips: answer.iter().map(|ip| ip.parse().unwrap()).collect(),
                ..DnsPanelEntry::unanswered(resolver, None)
            })
            .collect()
    }

    #[test]
    fn hsts_only_tls13_site() {
        let config = ScanConfig::default();
        let now = Utc::now();
        let results = ProbeResults {
            http: http_with(&[("strict-transport-security", "max-age=31536000")]),
            tls: tls13(200, now),
            dns: panel(&config, &[Some("93.184.216.34"); 4]),
            endpoints: None,
        };
        let report = assemble_report(target(), results, &StaticGeoIp::new(), &config, now);

        assert_eq!(report.score, 40);
        assert_eq!(report.csp.status, CspStatus::NotConfigured);
        let codes: Vec<_> = report.recommendations.iter().map(|r| r.code.as_str()).collect();
        assert!(codes.contains(&"HEADERS_CSP_WEAK"));
        assert!(!codes.contains(&"HEADERS_HSTS_MISSING"));
        assert!(!codes.contains(&"TLS_CERTIFICATE_ATTENTION"));
        assert_eq!(report.schema_version, REPORT_SCHEMA_VERSION);
        assert!(report.endpoints.is_none());
    }

    #[test]
    fn failed_probes_still_produce_a_report() {
        let config = ScanConfig::default();
        let results = ProbeResults {
            http: HttpProbe::unavailable("connection reset"),
            tls: ProbeOutcome::unavailable("handshake failed"),
            dns: panel(&config, &[None; 4]),
            endpoints: Some(ProbeOutcome::unavailable(DEADLINE_REASON)),
        };
        let report = assemble_report(target(), results, &StaticGeoIp::new(), &config, Utc::now());

        assert_eq!(report.score, 0);
        assert_eq!(report.headers.len(), 6);
        assert_eq!(report.dns.len(), 4);
        assert!(!report.tls.is_available());
        assert_eq!(report.primary_ip, Some("93.184.216.34".parse::<IpAddr>().unwrap()));
        assert_eq!(report.infrastructure.cdn, CdnProvider::Unknown);
        assert_eq!(report.recommendations[2].code, "TLS_CERTIFICATE_ATTENTION");
    }

    #[test]
    fn panel_is_attributed_per_entry_and_primary_follows_order() {
        let config = ScanConfig::default();
        let edge: IpAddr = "104.16.1.1".parse().unwrap();
        let origin: IpAddr = "203.0.113.20".parse().unwrap();
        let geo = StaticGeoIp::new()
            .with_asn(edge, 13335, "CLOUDFLARENET")
            .with_city(origin, "Frankfurt", "Germany")
            .with_asn(origin, 24940, "Hetzner Online GmbH");
        let results = ProbeResults {
            http: http_with(&[("server", "cloudflare"), ("cf-ray", "abc-FRA")]),
            tls: ProbeOutcome::unavailable("timed out"),
            dns: panel(&config, &[None, Some("104.16.1.1"), Some("203.0.113.20"), None]),
            endpoints: None,
        };
        let report = assemble_report(target(), results, &geo, &config, Utc::now());

        assert_eq!(report.primary_ip, Some(edge));
        assert_eq!(report.dns[0].location, "-");
        assert_eq!(report.dns[1].location, "Location hidden (CDN)");
        assert_eq!(report.dns[2].location, "Frankfurt, Germany");
        assert_eq!(report.dns[2].operator, "Hetzner Online GmbH");
        assert_eq!(report.infrastructure.cdn, CdnProvider::Cloudflare);
        assert_eq!(report.infrastructure.server, "Cloudflare");
    }

    #[tokio::test]
    async fn blocked_target_never_reaches_the_probes() {
        let scanner = Scanner::new(ScanConfig::default(), Arc::new(StaticGeoIp::new())).unwrap();
        for input in ["http://127.0.0.1", "10.0.0.1", "http://169.254.169.254/"] {
            let err = scanner.scan(input).await.unwrap_err();
            assert!(matches!(err, ScanError::BlockedTarget { .. }), "{input}");
        }
        assert!(matches!(
            scanner.scan("ftp://example.com").await.unwrap_err(),
            ScanError::MalformedInput { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_aborts_a_hung_probe() {
        let handle: JoinHandle<u8> = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            1
        });
        let deadline = Instant::now() + std::time::Duration::from_secs(1);
        assert_eq!(join_probe(handle, deadline, "stuck").await, None);

        let quick = tokio::spawn(async { 7u8 });
        let deadline = Instant::now() + std::time::Duration::from_secs(1);
        assert_eq!(join_probe(quick, deadline, "quick").await, Some(7));
    }

    fn loopback_target(port: u16) -> ScanTarget {
        ScanTarget {
            url: Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap(),
            host: "scano.test".into(),
            resolved_ip: "127.0.0.1".parse().unwrap(),
        }
    }

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test(start_paused = true)]
    async fn resolvers_that_never_answer_fall_back_at_the_deadline() {
        // Accepts queries and never replies.
        let silent = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let silent_port = silent.local_addr().unwrap().port();

        let mut config = ScanConfig::default();
        config.timeouts.dns_secs = 60;
        config.timeouts.tls_secs = 1;
        config.timeouts.scan_secs = 5;
        config.resolvers = ["First", "Second"]
            .into_iter()
            .map(|name| ResolverEntry::new(name, "127.0.0.1".parse().unwrap()).with_port(silent_port))
            .collect();
        let scanner = Scanner::new(config, Arc::new(StaticGeoIp::new())).unwrap();

        let report = scanner.probe(loopback_target(closed_port())).await;

        assert_eq!(report.dns.len(), scanner.config().resolvers.len());
        for (entry, resolver) in report.dns.iter().zip(&scanner.config().resolvers) {
            assert_eq!(entry.resolver, resolver.name);
            assert!(entry.ips.is_empty());
            assert_eq!(entry.error.as_deref(), Some(DEADLINE_REASON));
        }
        drop(silent);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_deadline_yields_sentinels_for_every_probe() {
        let mut config = ScanConfig::default();
        config.endpoint_probe.enabled = true;
        let scanner = Scanner::new(config, Arc::new(StaticGeoIp::new())).unwrap();

        let report = scanner.probe_until(loopback_target(closed_port()), Instant::now()).await;

        assert_eq!(report.http, ProbeOutcome::unavailable(DEADLINE_REASON));
        assert_eq!(report.tls, ProbeOutcome::unavailable(DEADLINE_REASON));
        assert_eq!(report.endpoints, Some(ProbeOutcome::unavailable(DEADLINE_REASON)));
        assert_eq!(report.dns.len(), 4);
        assert!(report.dns.iter().all(|e| e.error.as_deref() == Some(DEADLINE_REASON)));
        assert_eq!(report.score, 0);
    }
}
