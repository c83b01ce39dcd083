// src/core/scoring.rs

use crate::core::config::ScoringWeights;
use crate::core::models::{
    CdnProvider, CspAnalysis, CspStatus, EndpointFindings, HeaderFindings, InfrastructureProfile,
    ProbeOutcome, TlsRecord, WafProduct,
};

pub const MAX_SCORE: i32 = 100;

/// The slice of a scan the score depends on.
pub struct ScoreInput<'a> {
    pub headers: &'a HeaderFindings,
    pub csp: &'a CspAnalysis,
    pub tls: &'a ProbeOutcome<TlsRecord>,
    pub infrastructure: &'a InfrastructureProfile,
    pub endpoints: Option<&'a ProbeOutcome<EndpointFindings>>,
}

/// Computes the 0-100 security score.
///
/// Terms are summed without per-term caps and the total is clamped once at
/// the end. Arithmetic saturates, so extreme configured weights still land in
/// the range.
pub fn compute_score(input: &ScoreInput<'_>, weights: &ScoringWeights) -> u8 {
    let mut total: i32 = 0;

    total = total.saturating_add(weights.per_header.saturating_mul(count(input.headers.present_count())));

    if let Some(tls) = input.tls.as_available() {
        total = total.saturating_add(weights.tls_handshake_bonus);
        if tls.protocol_version == weights.latest_tls_version {
            total = total.saturating_add(weights.latest_tls_bonus);
        }
    }

    if input.csp.status == CspStatus::Strong {
        total = total.saturating_add(weights.strong_csp_bonus);
    }

    let edge = &input.infrastructure;
    if edge.cdn != CdnProvider::Unknown || edge.waf != WafProduct::NotDetected {
        total = total.saturating_add(weights.edge_protection_bonus);
    }

    if let Some(ProbeOutcome::Available(findings)) = input.endpoints {
        total = total.saturating_sub(weights.exposed_path_penalty.saturating_mul(count(findings.exposed.len())));
    }

    total.clamp(0, MAX_SCORE) as u8
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
