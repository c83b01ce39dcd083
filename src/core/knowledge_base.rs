// src/core/knowledge_base.rs

//! This module acts as the central "brain" of the recommendation engine.
//! It holds a static, read-only table of remediation rules, each with a stable
//! code, the fixed one-line text that lands in the report, and a longer
//! description the interactive front end shows on demand.
//!
//! Rules are evaluated independently; the output keeps declaration order, so
//! the same scan input always yields the same list in the same order.

use std::fmt;

use crate::core::models::{
    CspAnalysis, CspStatus, EndpointFindings, HeaderFindings, ProbeOutcome, Recommendation,
    SecurityHeader, Severity, TlsRecord,
};

/// Groups related rules together in the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    /// HTTP security headers and the CSP policy.
    Http,
    /// TLS certificate and negotiated protocol.
    Tls,
    /// Files or status pages reachable without authentication.
    Exposure,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Http => write!(f, "HTTP Security Headers"),
            FindingCategory::Tls => write!(f, "SSL/TLS Certificate"),
            FindingCategory::Exposure => write!(f, "Exposed Endpoints"),
        }
    }
}

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub headers: &'a HeaderFindings,
    pub csp: &'a CspAnalysis,
    pub tls: &'a ProbeOutcome<TlsRecord>,
    pub endpoints: Option<&'a ProbeOutcome<EndpointFindings>>,
    /// A certificate with this many days left, or fewer, needs renewal.
    pub tls_expiry_warning_days: i64,
}

/// One declarative remediation rule.
pub struct RecommendationRule {
    /// A unique, machine-readable identifier (e.g. "HEADERS_HSTS_MISSING").
    pub code: &'static str,
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    /// The fixed string appended to the report when the rule fires.
    pub text: &'static str,
    /// Why the finding matters, for the details panel.
    pub description: &'static str,
    pub applies: fn(&RuleContext<'_>) -> bool,
}

/// Protocols older than TLS 1.2 are flagged.
const OUTDATED_TLS_VERSIONS: &[&str] = &["SSLv3", "TLSv1", "TLSv1.1"];

fn hsts_missing(ctx: &RuleContext<'_>) -> bool {
    !ctx.headers.is_present(SecurityHeader::StrictTransportSecurity)
}

fn csp_not_strong(ctx: &RuleContext<'_>) -> bool {
    ctx.csp.status != CspStatus::Strong
}

fn certificate_needs_attention(ctx: &RuleContext<'_>) -> bool {
    match ctx.tls.as_available() {
        Some(tls) => tls.days_remaining <= ctx.tls_expiry_warning_days,
        None => true,
    }
}

fn frame_options_missing(ctx: &RuleContext<'_>) -> bool {
    !ctx.headers.is_present(SecurityHeader::XFrameOptions)
}

fn content_type_options_missing(ctx: &RuleContext<'_>) -> bool {
    !ctx.headers.is_present(SecurityHeader::XContentTypeOptions)
}

fn referrer_policy_missing(ctx: &RuleContext<'_>) -> bool {
    !ctx.headers.is_present(SecurityHeader::ReferrerPolicy)
}

fn permissions_policy_missing(ctx: &RuleContext<'_>) -> bool {
    !ctx.headers.is_present(SecurityHeader::PermissionsPolicy)
}

fn protocol_outdated(ctx: &RuleContext<'_>) -> bool {
    ctx.tls
        .as_available()
        .is_some_and(|tls| OUTDATED_TLS_VERSIONS.contains(&tls.protocol_version.as_str()))
}

fn sensitive_paths_exposed(ctx: &RuleContext<'_>) -> bool {
    matches!(ctx.endpoints, Some(ProbeOutcome::Available(f)) if !f.exposed.is_empty())
}

/// The rule table, in report order. The first three are the core rules.
static RULES: &[RecommendationRule] = &[
    RecommendationRule {
        code: "HEADERS_HSTS_MISSING",
        title: "HSTS Header Missing",
        category: FindingCategory::Http,
        severity: Severity::Warning,
        text: "Enable HSTS (Strict-Transport-Security) to force HTTPS on every visit.",
        description: "The HTTP Strict-Transport-Security header instructs browsers to only communicate with your site over HTTPS. It protects against protocol downgrade attacks and cookie hijacking. A strong value is 'max-age=31536000; includeSubDomains; preload'.",
        applies: hsts_missing,
    },
    RecommendationRule {
        code: "HEADERS_CSP_WEAK",
        title: "CSP Missing or Weak",
        category: FindingCategory::Http,
        severity: Severity::Warning,
        text: "Harden the Content-Security-Policy: define one and drop unsafe sources.",
        description: "Content-Security-Policy limits which scripts, styles and other resources a browser may load, blunting Cross-Site Scripting and data injection. A policy that allows 'unsafe-inline', 'unsafe-eval', bare '*', data: or blob: sources gives most of that protection away.",
        applies: csp_not_strong,
    },
    RecommendationRule {
        code: "TLS_CERTIFICATE_ATTENTION",
        title: "TLS Certificate Unavailable or Expiring",
        category: FindingCategory::Tls,
        severity: Severity::Critical,
        text: "Renew or enable the TLS certificate.",
        description: "Either no valid certificate could be negotiated on port 443, or the current one expires soon. Browsers block expired or invalid certificates with a full-page warning. Automate renewal (for example with an ACME client) well ahead of the expiry date.",
        applies: certificate_needs_attention,
    },
    RecommendationRule {
        code: "HEADERS_X_FRAME_OPTIONS_MISSING",
        title: "X-Frame-Options Missing",
        category: FindingCategory::Http,
        severity: Severity::Warning,
        text: "Add X-Frame-Options (DENY or SAMEORIGIN) to prevent clickjacking.",
        description: "This header protects your visitors against 'clickjacking' attacks, where an attacker loads your site in an invisible iframe to trick users into clicking on malicious content. The CSP 'frame-ancestors' directive is the modern equivalent.",
        applies: frame_options_missing,
    },
    RecommendationRule {
        code: "HEADERS_X_CONTENT_TYPE_OPTIONS_MISSING",
        title: "X-Content-Type-Options Missing",
        category: FindingCategory::Http,
        severity: Severity::Info,
        text: "Set X-Content-Type-Options: nosniff.",
        description: "This header prevents browsers from guessing the content type of a response (MIME sniffing), which mitigates attacks where a file disguised as an image is executed as a script.",
        applies: content_type_options_missing,
    },
    RecommendationRule {
        code: "HEADERS_REFERRER_POLICY_MISSING",
        title: "Referrer-Policy Missing",
        category: FindingCategory::Http,
        severity: Severity::Info,
        text: "Add a Referrer-Policy such as strict-origin-when-cross-origin.",
        description: "Without a Referrer-Policy, full URLs (including paths and query strings that may carry tokens) can leak to third-party sites through the Referer header.",
        applies: referrer_policy_missing,
    },
    RecommendationRule {
        code: "HEADERS_PERMISSIONS_POLICY_MISSING",
        title: "Permissions-Policy Missing",
        category: FindingCategory::Http,
        severity: Severity::Info,
        text: "Add a Permissions-Policy to restrict powerful browser features.",
        description: "Permissions-Policy controls which browser features (camera, microphone, geolocation, payment) the page and its embedded frames may use. Denying unused features shrinks the impact of an injected script.",
        applies: permissions_policy_missing,
    },
    RecommendationRule {
        code: "TLS_PROTOCOL_OUTDATED",
        title: "Outdated TLS Protocol",
        category: FindingCategory::Tls,
        severity: Severity::Critical,
        text: "Disable protocols older than TLS 1.2.",
        description: "SSLv3, TLS 1.0 and TLS 1.1 are deprecated and vulnerable to known downgrade and padding attacks. Modern clients support TLS 1.2 and 1.3; the server should refuse anything older.",
        applies: protocol_outdated,
    },
    RecommendationRule {
        code: "ENDPOINTS_SENSITIVE_EXPOSED",
        title: "Sensitive Files Exposed",
        category: FindingCategory::Exposure,
        severity: Severity::Critical,
        text: "Block public access to the exposed sensitive paths.",
        description: "Files such as '.git/HEAD', '.env' or backup configs, and status pages such as 'server-status', disclose source code, credentials or internal topology. Deny them at the web server and remove them from the document root.",
        applies: sensitive_paths_exposed,
    },
];

/// Evaluates every rule and returns the ones that fire, in declaration order.
pub fn recommend(ctx: &RuleContext<'_>) -> Vec<Recommendation> {
    RULES
        .iter()
        .filter(|rule| (rule.applies)(ctx))
        .map(|rule| Recommendation {
            code: rule.code.to_string(),
            severity: rule.severity,
            text: rule.text.to_string(),
        })
        .collect()
}

/// Retrieves the full rule for a given code from the static knowledge base.
///
/// # Arguments
///
/// * `code` - The machine-readable code carried by a `Recommendation`.
///
/// # Returns
///
/// The matching `RecommendationRule`, or `None` for an unknown code.
pub fn rule_detail(code: &str) -> Option<&'static RecommendationRule> {
    RULES.iter().find(|r| r.code == code)
}
