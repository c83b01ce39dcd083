// src/core/csp.rs

use crate::core::models::{CspAnalysis, CspStatus};

/// Tokens that make a policy weak, in reporting order.
pub const UNSAFE_SOURCES: &[&str] = &["'unsafe-inline'", "'unsafe-eval'", "*", "data:", "blob:"];

/// Classifies a Content-Security-Policy value.
///
/// A token anywhere in the raw value, in any case, weakens the policy: a
/// scoped wildcard such as `https://*.cdn.example` counts as `*`. Each unsafe
/// token is reported once, in `UNSAFE_SOURCES` order.
pub fn analyze_csp(header: Option<&str>) -> CspAnalysis {
    let Some(value) = header else {
        return CspAnalysis {
            status: CspStatus::NotConfigured,
            issues: Vec::new(),
        };
    };

    if value.trim().is_empty() {
        return CspAnalysis {
            status: CspStatus::Weak,
            issues: vec!["empty policy".to_string()],
        };
    }

    let lowered = value.to_ascii_lowercase();
    let issues: Vec<String> = UNSAFE_SOURCES
        .iter()
        .filter(|token| lowered.contains(**token))
        .map(|t| t.to_string())
        .collect();

    let status = if issues.is_empty() {
        CspStatus::Strong
    } else {
        CspStatus::Weak
    };
    CspAnalysis { status, issues }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_header_is_not_configured() {
        let analysis = analyze_csp(None);
        assert_eq!(analysis.status, CspStatus::NotConfigured);
        assert!(analysis.issues.is_empty());
    }

    #[test]
    fn unsafe_inline_makes_policy_weak() {
        let analysis = analyze_csp(Some("default-src 'self'; script-src 'self' 'unsafe-inline'"));
        assert_eq!(analysis.status, CspStatus::Weak);
        assert_eq!(analysis.issues, vec!["'unsafe-inline'"]);
    }

    #[test]
    fn every_unsafe_token_is_reported_once_in_order() {
        let analysis = analyze_csp(Some(
            "img-src data: *; script-src 'UNSAFE-EVAL' 'unsafe-inline'; style-src 'unsafe-inline'; worker-src blob:",
        ));
        assert_eq!(
            analysis.issues,
            vec!["'unsafe-inline'", "'unsafe-eval'", "*", "data:", "blob:"]
        );
    }

    #[test]
    fn scoped_wildcard_counts_as_wildcard() {
        let analysis = analyze_csp(Some("default-src 'self' https://*.cdn.example"));
        assert_eq!(analysis.status, CspStatus::Weak);
        assert_eq!(analysis.issues, vec!["*"]);
    }

    #[test]
    fn policy_without_unsafe_tokens_is_strong() {
        let analysis = analyze_csp(Some(
            "default-src 'self' https://cdn.example; frame-ancestors 'none'; upgrade-insecure-requests",
        ));
        assert_eq!(analysis.status, CspStatus::Strong);
        assert!(analysis.issues.is_empty());
    }

    #[test]
    fn empty_policy_is_weak() {
        let analysis = analyze_csp(Some("  "));
        assert_eq!(analysis.status, CspStatus::Weak);
    }
}
