// src/core/models.rs

use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};
use url::Url;

/// Bumped whenever a field of `ScanReport` changes shape.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Response headers of the fetched page, names lowercased, repeated values joined.
pub type RawHeaders = BTreeMap<String, String>;

// --- Tipi di Risultato Riutilizzabili ---
// Reusable Result Types

/// Terminal state of a single probe.
///
/// Every probe boundary converts its failures into `Unavailable`, so the
/// orchestrator only ever pattern-matches on this tag and never sees an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> ProbeOutcome<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }

    pub fn as_available(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Severity attached to each recommendation rule.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

// --- Target ---

/// A validated, scheme-qualified origin that already passed the SSRF guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanTarget {
    pub url: Url,
    pub host: String,
    /// Address the guard resolved and checked before any probe ran.
    pub resolved_ip: IpAddr,
}

// --- Modelli Header HTTP ---
// HTTP Header Models

/// The fixed set of security headers every report accounts for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, EnumIter, AsRefStr, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SecurityHeader {
    ContentSecurityPolicy,
    StrictTransportSecurity,
    XFrameOptions,
    XContentTypeOptions,
    ReferrerPolicy,
    PermissionsPolicy,
}

impl SecurityHeader {
    /// Canonical capitalisation, used by the renderers.
    pub fn title(&self) -> &'static str {
        match self {
            Self::ContentSecurityPolicy => "Content-Security-Policy",
            Self::StrictTransportSecurity => "Strict-Transport-Security",
            Self::XFrameOptions => "X-Frame-Options",
            Self::XContentTypeOptions => "X-Content-Type-Options",
            Self::ReferrerPolicy => "Referrer-Policy",
            Self::PermissionsPolicy => "Permissions-Policy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HeaderStatus {
    Present { value: String },
    Missing,
}

static MISSING: HeaderStatus = HeaderStatus::Missing;

/// Presence map over all six `SecurityHeader`s.
///
/// Both constructors walk `SecurityHeader::iter()`, so a key is never absent:
/// a header the server did not send is stored as `HeaderStatus::Missing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderFindings(BTreeMap<SecurityHeader, HeaderStatus>);

impl HeaderFindings {
    pub fn all_missing() -> Self {
        Self(SecurityHeader::iter().map(|h| (h, HeaderStatus::Missing)).collect())
    }

    /// Builds the findings from lowercased raw headers.
    pub fn from_raw(raw: &RawHeaders) -> Self {
        Self(
            SecurityHeader::iter()
                .map(|header| {
                    let status = match raw.get(header.as_ref()) {
                        Some(value) => HeaderStatus::Present { value: value.clone() },
                        None => HeaderStatus::Missing,
                    };
                    (header, status)
                })
                .collect(),
        )
    }

    pub fn get(&self, header: SecurityHeader) -> &HeaderStatus {
        self.0.get(&header).unwrap_or(&MISSING)
    }

    pub fn value(&self, header: SecurityHeader) -> Option<&str> {
        match self.get(header) {
            HeaderStatus::Present { value } => Some(value.as_str()),
            HeaderStatus::Missing => None,
        }
    }

    pub fn is_present(&self, header: SecurityHeader) -> bool {
        self.value(header).is_some()
    }

    pub fn present_count(&self) -> usize {
        self.0
            .values()
            .filter(|s| matches!(s, HeaderStatus::Present { .. }))
            .count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SecurityHeader, &HeaderStatus)> {
        self.0.iter().map(|(h, s)| (*h, s))
    }
}

/// Final status and URL of the single GET the header probe performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpSummary {
    pub status: u16,
    pub final_url: String,
}

// --- CSP ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CspStatus {
    NotConfigured,
    Weak,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CspAnalysis {
    pub status: CspStatus,
    pub issues: Vec<String>,
}

// --- Modelli Scanner SSL/TLS ---
// SSL/TLS Scanner Models

/// Certificate and session metadata from a live handshake.
///
/// `days_remaining` is negative for an expired certificate; a failed handshake
/// is represented by `ProbeOutcome::Unavailable`, never by a zeroed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlsRecord {
    pub issuer: String,
    pub subject: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub days_remaining: i64,
    pub protocol_version: String,
}

// --- Modelli Scanner DNS ---
// DNS Scanner Models

/// One resolver's answer in the DNS panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsPanelEntry {
    pub resolver: String,
    pub address: IpAddr,
    pub ips: Vec<IpAddr>,
    pub location: String,
    pub operator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// --- Infrastructure ---

/// CDN products the classifier can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
pub enum CdnProvider {
    #[strum(serialize = "Cloudflare")]
    Cloudflare,
    #[strum(serialize = "Akamai")]
    Akamai,
    #[strum(serialize = "Fastly")]
    Fastly,
    #[strum(serialize = "AWS CloudFront")]
    CloudFront,
    #[strum(serialize = "Azure Front Door")]
    AzureFrontDoor,
    #[strum(serialize = "Sucuri")]
    Sucuri,
    #[strum(serialize = "Imperva")]
    Imperva,
    #[strum(serialize = "Edgio / Edgecast")]
    Edgio,
    #[strum(serialize = "StackPath")]
    StackPath,
    #[strum(serialize = "Unknown")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
pub enum WafProduct {
    #[strum(serialize = "Cloudflare WAF")]
    Cloudflare,
    #[strum(serialize = "Akamai Kona Site Defender")]
    AkamaiKona,
    #[strum(serialize = "Sucuri WAF")]
    Sucuri,
    #[strum(serialize = "Imperva WAF")]
    Imperva,
    #[strum(serialize = "Not Detected")]
    NotDetected,
}

impl Serialize for CdnProvider {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl Serialize for WafProduct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

/// Who serves the origin. Every field carries a label, "Unknown" at worst.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfrastructureProfile {
    pub server: String,
    pub cdn: CdnProvider,
    pub waf: WafProduct,
    pub hosting: String,
}

// --- Endpoint probe ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointFindings {
    pub probed: usize,
    pub exposed: Vec<String>,
}

// --- Recommendations ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub code: String,
    pub severity: Severity,
    pub text: String,
}

// --- Report Principale ---
// Main Report

/// The aggregate handed to renderers and transports. Only the orchestrator builds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub schema_version: u32,
    pub target: ScanTarget,
    pub scanned_at: DateTime<Utc>,
    pub score: u8,
    pub http: ProbeOutcome<HttpSummary>,
    pub headers: HeaderFindings,
    pub csp: CspAnalysis,
    pub tls: ProbeOutcome<TlsRecord>,
    pub dns: Vec<DnsPanelEntry>,
    pub primary_ip: Option<IpAddr>,
    pub infrastructure: InfrastructureProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<ProbeOutcome<EndpointFindings>>,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_findings_always_carry_six_keys() {
        let mut raw = RawHeaders::new();
        raw.insert("strict-transport-security".into(), "max-age=63072000".into());
        raw.insert("x-powered-by".into(), "PHP/8.2".into());

        let findings = HeaderFindings::from_raw(&raw);
        assert_eq!(findings.len(), 6);
        assert_eq!(findings.present_count(), 1);
        assert!(findings.is_present(SecurityHeader::StrictTransportSecurity));
        assert_eq!(findings.get(SecurityHeader::XFrameOptions), &HeaderStatus::Missing);

        assert_eq!(HeaderFindings::all_missing().len(), 6);
        assert_eq!(HeaderFindings::all_missing().present_count(), 0);
    }

    #[test]
    fn header_findings_serialize_as_kebab_case_map() {
        let json = serde_json::to_value(HeaderFindings::all_missing()).unwrap();
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), 6);
        assert_eq!(map["content-security-policy"]["status"], "missing");
        assert!(map.contains_key("permissions-policy"));
    }

    #[test]
    fn probe_outcome_is_tagged() {
        let outcome: ProbeOutcome<HttpSummary> = ProbeOutcome::unavailable("timed out");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "timed out");
        assert!(outcome.as_available().is_none());
    }

    #[test]
    fn vendor_labels_serialize_as_display_strings() {
        assert_eq!(serde_json::to_value(CdnProvider::CloudFront).unwrap(), "AWS CloudFront");
        assert_eq!(serde_json::to_value(WafProduct::NotDetected).unwrap(), "Not Detected");
    }
}
