// src/core/geoip.rs

//! Read-only GeoIP/ASN lookups.
//!
//! The databases are opened once at startup and shared behind an `Arc`
//! across all concurrent scans; lookups never touch the network.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use maxminddb::{Reader, geoip2};
use tracing::{debug, info};

use crate::core::config::GeoIpConfig;
use crate::core::error::GeoIpError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CityRecord {
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnRecord {
    pub number: Option<u32>,
    pub organization: String,
}

/// The GeoIP collaborator. A miss is `None`, never an error.
pub trait GeoIpLookup: Send + Sync {
    fn lookup_city(&self, ip: IpAddr) -> Option<CityRecord>;
    fn lookup_asn(&self, ip: IpAddr) -> Option<AsnRecord>;
}

/// MaxMind GeoLite2 City + ASN databases loaded into memory.
pub struct MaxMindGeoIp {
    city: Reader<Vec<u8>>,
    asn: Reader<Vec<u8>>,
}

impl MaxMindGeoIp {
    pub fn open(config: &GeoIpConfig) -> Result<Self, GeoIpError> {
        let city = open_reader(&config.city_db)?;
        let asn = open_reader(&config.asn_db)?;
        info!(
            city_db = %config.city_db.display(),
            asn_db = %config.asn_db.display(),
            "GeoIP databases opened."
        );
        Ok(Self { city, asn })
    }
}

fn open_reader(path: &Path) -> Result<Reader<Vec<u8>>, GeoIpError> {
    Reader::open_readfile(path).map_err(|source| GeoIpError::Open {
        path: path.display().to_string(),
        source,
    })
}

impl GeoIpLookup for MaxMindGeoIp {
    fn lookup_city(&self, ip: IpAddr) -> Option<CityRecord> {
        let record: geoip2::City = match self.city.lookup(ip) {
            Ok(r) => r,
            Err(e) => {
                debug!(%ip, error = %e, "City lookup missed.");
                return None;
            }
        };
        let english = |names: Option<std::collections::BTreeMap<&str, &str>>| {
            names.and_then(|n| n.get("en").map(|s| s.to_string()))
        };
        Some(CityRecord {
            city: record.city.and_then(|c| english(c.names)),
            country: record.country.and_then(|c| english(c.names)),
        })
    }

    fn lookup_asn(&self, ip: IpAddr) -> Option<AsnRecord> {
        let record: geoip2::Asn = match self.asn.lookup(ip) {
            Ok(r) => r,
            Err(e) => {
                debug!(%ip, error = %e, "ASN lookup missed.");
                return None;
            }
        };
        let organization = record.autonomous_system_organization?.trim();
        if organization.is_empty() {
            return None;
        }
        Some(AsnRecord {
            number: record.autonomous_system_number,
            organization: organization.to_string(),
        })
    }
}

/// In-memory lookup table.
///
/// Stands in when the MaxMind files are absent (every lookup misses) and
/// drives the attribution tests.
#[derive(Debug, Clone, Default)]
pub struct StaticGeoIp {
    cities: HashMap<IpAddr, CityRecord>,
    asns: HashMap<IpAddr, AsnRecord>,
}

impl StaticGeoIp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, ip: IpAddr, city: &str, country: &str) -> Self {
        self.cities.insert(
            ip,
            CityRecord {
                city: Some(city.to_string()),
                country: Some(country.to_string()),
            },
        );
        self
    }

    pub fn with_asn(mut self, ip: IpAddr, number: u32, organization: &str) -> Self {
        self.asns.insert(
            ip,
            AsnRecord {
                number: Some(number),
                organization: organization.to_string(),
            },
        );
        self
    }
}

impl GeoIpLookup for StaticGeoIp {
    fn lookup_city(&self, ip: IpAddr) -> Option<CityRecord> {
        self.cities.get(&ip).cloned()
    }

    fn lookup_asn(&self, ip: IpAddr) -> Option<AsnRecord> {
        self.asns.get(&ip).cloned()
    }
}
