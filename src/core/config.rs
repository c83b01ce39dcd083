// src/core/config.rs

//! Scanner configuration.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the keys
//! it wants to override. Point weights live here rather than in the scoring
//! code so the policy can be tuned without touching the pipeline.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub timeouts: TimeoutConfig,
    pub resolvers: Vec<ResolverEntry>,
    pub geoip: GeoIpConfig,
    pub scoring: ScoringWeights,
    pub recommendations: RecommendationConfig,
    pub endpoint_probe: EndpointProbeConfig,
    pub http: HttpConfig,
    pub server: ServerConfig,
}

/// Per-probe and whole-scan time budgets, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub http_secs: u64,
    pub tls_secs: u64,
    pub dns_secs: u64,
    pub guard_secs: u64,
    pub endpoint_secs: u64,
    pub scan_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            http_secs: 10,
            tls_secs: 5,
            dns_secs: 4,
            guard_secs: 4,
            endpoint_secs: 5,
            scan_secs: 20,
        }
    }
}

impl TimeoutConfig {
    pub fn http(&self) -> Duration {
        Duration::from_secs(self.http_secs)
    }

    pub fn tls(&self) -> Duration {
        Duration::from_secs(self.tls_secs)
    }

    pub fn dns(&self) -> Duration {
        Duration::from_secs(self.dns_secs)
    }

    pub fn guard(&self) -> Duration {
        Duration::from_secs(self.guard_secs)
    }

    pub fn endpoint(&self) -> Duration {
        Duration::from_secs(self.endpoint_secs)
    }

    pub fn scan(&self) -> Duration {
        Duration::from_secs(self.scan_secs)
    }
}

/// A public resolver queried by the DNS panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverEntry {
    pub name: String,
    pub address: IpAddr,
    #[serde(default = "default_dns_port")]
    pub port: u16,
}

pub const DEFAULT_DNS_PORT: u16 = 53;

fn default_dns_port() -> u16 {
    DEFAULT_DNS_PORT
}

impl ResolverEntry {
    pub fn new(name: &str, address: IpAddr) -> Self {
        Self {
            name: name.to_string(),
            address,
            port: DEFAULT_DNS_PORT,
        }
    }

    /// Same resolver on a non-standard port, e.g. a local forwarder.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Google, Cloudflare, Quad9 and OpenDNS, in that order.
pub fn default_resolvers() -> Vec<ResolverEntry> {
    [
        ("Google", [8, 8, 8, 8]),
        ("Cloudflare", [1, 1, 1, 1]),
        ("Quad9", [9, 9, 9, 9]),
        ("OpenDNS", [208, 67, 222, 222]),
    ]
    .into_iter()
    .map(|(name, octets)| ResolverEntry::new(name, IpAddr::from(octets)))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoIpConfig {
    pub city_db: PathBuf,
    pub asn_db: PathBuf,
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            city_db: PathBuf::from("/geoip/GeoLite2-City.mmdb"),
            asn_db: PathBuf::from("/geoip/GeoLite2-ASN.mmdb"),
        }
    }
}

/// Named point weights for the scoring engine.
///
/// The defaults give 10 points per present security header and 30 for the
/// latest TLS version; the optional bonuses start disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub per_header: i32,
    pub latest_tls_bonus: i32,
    pub latest_tls_version: String,
    pub tls_handshake_bonus: i32,
    pub strong_csp_bonus: i32,
    pub edge_protection_bonus: i32,
    pub exposed_path_penalty: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            per_header: 10,
            latest_tls_bonus: 30,
            latest_tls_version: "TLSv1.3".to_string(),
            tls_handshake_bonus: 0,
            strong_csp_bonus: 0,
            edge_protection_bonus: 0,
            exposed_path_penalty: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub tls_expiry_warning_days: i64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            tls_expiry_warning_days: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointProbeConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("Scano/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeouts: TimeoutConfig::default(),
            resolvers: default_resolvers(),
            geoip: GeoIpConfig::default(),
            scoring: ScoringWeights::default(),
            recommendations: RecommendationConfig::default(),
            endpoint_probe: EndpointProbeConfig::default(),
            http: HttpConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from `path`, or from the per-user config file when
    /// `path` is `None`. A missing per-user file yields the standard defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => {
                    debug!("No configuration file found, using defaults.");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration file.");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolvers.is_empty() {
            return Err(invalid("resolvers", "at least one resolver is required"));
        }
        if let Some(blank) = self.resolvers.iter().find(|r| r.name.trim().is_empty()) {
            return Err(invalid(
                "resolvers",
                &format!("resolver {} has an empty name", blank.address),
            ));
        }
        if let Some(zero) = self.resolvers.iter().find(|r| r.port == 0) {
            return Err(invalid("resolvers", &format!("resolver {} has port 0", zero.name)));
        }
        let t = &self.timeouts;
        for (field, value) in [
            ("timeouts.http_secs", t.http_secs),
            ("timeouts.tls_secs", t.tls_secs),
            ("timeouts.dns_secs", t.dns_secs),
            ("timeouts.guard_secs", t.guard_secs),
            ("timeouts.endpoint_secs", t.endpoint_secs),
            ("timeouts.scan_secs", t.scan_secs),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }
        if self.recommendations.tls_expiry_warning_days < 0 {
            return Err(invalid(
                "recommendations.tls_expiry_warning_days",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn default_config_path() -> Option<PathBuf> {
    crate::logging::project_directory().map(|dirs| dirs.config_dir().join("config.toml"))
}
