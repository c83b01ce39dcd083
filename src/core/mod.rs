// src/core/mod.rs

// The `core` module holds everything a scan needs and nothing about how the
// result is presented: models, configuration, the probes, attribution and
// the scoring and recommendation rules.

/// Data structures shared by every layer, with `ScanReport` at the root.
pub mod models;

pub mod error;

pub mod config;

/// Input normalization and the SSRF guard.
pub mod target;

/// The read-only GeoIP/ASN lookup collaborator.
pub mod geoip;

/// CDN, WAF, hosting and server attribution.
pub mod attribution;

pub mod csp;

pub mod scoring;

/// The network probes and the scan orchestrator.
pub mod scanner;

/// The recommendation rule table, with details for each finding.
pub mod knowledge_base;
