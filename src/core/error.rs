// src/core/error.rs

//! Error types for the scan pipeline.
//!
//! Only `ScanError` can stop a scan, and only before any probe has run.
//! Everything that goes wrong inside a probe is folded into a
//! `ProbeOutcome::Unavailable` sentinel instead.

use std::net::IpAddr;

use thiserror::Error;

/// Rejections produced by the normalizer and the SSRF guard.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The input could not be turned into an http(s) URL with a host.
    #[error("malformed target `{input}`: {reason}")]
    MalformedInput { input: String, reason: String },

    /// The host is valid but policy forbids scanning it.
    #[error("target `{host}` is blocked: {reason}")]
    BlockedTarget { host: String, reason: BlockReason },
}

impl ScanError {
    pub fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub fn blocked(host: &str, reason: BlockReason) -> Self {
        Self::BlockedTarget {
            host: host.to_string(),
            reason,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    #[error("resolves to reserved address {0}")]
    ReservedAddress(IpAddr),

    #[error("hostname could not be resolved")]
    Unresolvable,
}

/// Failures of the report renderer. The underlying `ScanReport` was valid.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration value: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum GeoIpError {
    #[error("Failed to open GeoIP database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: maxminddb::MaxMindDBError,
    },
}
