// src/core/attribution.rs

//! Infers who operates a target from indirect signals.
//!
//! CDN and WAF detection walk a priority-ordered chain where the first match
//! wins: explicit response-header fingerprints, then the ASN organization of
//! the primary IP against a curated CDN table. Hosting uses its own table and
//! falls back to the raw organization string. Large cloud vendors (Amazon,
//! Google, Microsoft) only appear in the hosting table, so a site on shared
//! cloud compute is never labelled as using that vendor's CDN from the ASN
//! alone; it takes a product header such as `x-amz-cf-id` for that.

use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::geoip::GeoIpLookup;
use crate::core::models::{CdnProvider, DnsPanelEntry, InfrastructureProfile, RawHeaders, WafProduct};

pub const UNKNOWN: &str = "Unknown";
pub const LOCATION_MASKED: &str = "Location hidden (CDN)";
/// Placeholder for panel entries that resolved nothing.
pub const NOT_RESOLVED: &str = "-";

/// Defines the different types of checks that can be performed on the response headers.
enum Check<'a> {
    /// The header is present, whatever its value.
    Present(&'a str),
    /// The header is present and its value matches.
    Header(&'a str, &'a Lazy<Regex>),
    /// Any header value matches.
    AnyValue(&'a Lazy<Regex>),
}

impl Check<'_> {
    fn matches(&self, headers: &RawHeaders) -> bool {
        match self {
            Check::Present(name) => headers.contains_key(*name),
            Check::Header(name, re) => headers.get(*name).is_some_and(|v| re.is_match(v)),
            Check::AnyValue(re) => headers.values().any(|v| re.is_match(v)),
        }
    }
}

struct CdnRule<'a> {
    provider: CdnProvider,
    check: Check<'a>,
}

struct WafRule<'a> {
    product: WafProduct,
    check: Check<'a>,
}

static RE_CLOUDFLARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)cloudflare").unwrap());
static RE_CF_COOKIE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__cf_bm=|__cfduid=").unwrap());
static RE_AKAMAI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)akamai").unwrap());
static RE_FASTLY_CACHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^cache-[a-z0-9-]+").unwrap());
static RE_CLOUDFRONT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)cloudfront").unwrap());
static RE_SUCURI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)sucuri|cloudproxy").unwrap());
static RE_IMPERVA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)incapsula|imperva").unwrap());
static RE_INCAP_COOKIE: Lazy<Regex> = Lazy::new(|| Regex::new(r"incap_ses_|visid_incap_").unwrap());
static RE_EDGECAST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(ECS|ECAcc|ECD) ").unwrap());

static CDN_HEADER_RULES: &[CdnRule] = &[
    CdnRule { provider: CdnProvider::Cloudflare, check: Check::Present("cf-ray") },
    CdnRule { provider: CdnProvider::Cloudflare, check: Check::Header("server", &RE_CLOUDFLARE) },
    CdnRule { provider: CdnProvider::Akamai, check: Check::Present("x-akamai-transformed") },
    CdnRule { provider: CdnProvider::Akamai, check: Check::Present("akamai-grn") },
    CdnRule { provider: CdnProvider::Akamai, check: Check::AnyValue(&RE_AKAMAI) },
    CdnRule { provider: CdnProvider::Fastly, check: Check::Present("x-fastly-request-id") },
    CdnRule { provider: CdnProvider::Fastly, check: Check::Present("fastly-debug-digest") },
    CdnRule { provider: CdnProvider::Fastly, check: Check::Header("x-served-by", &RE_FASTLY_CACHE) },
    CdnRule { provider: CdnProvider::CloudFront, check: Check::Present("x-amz-cf-id") },
    CdnRule { provider: CdnProvider::CloudFront, check: Check::Present("x-amz-cf-pop") },
    CdnRule { provider: CdnProvider::CloudFront, check: Check::Header("via", &RE_CLOUDFRONT) },
    CdnRule { provider: CdnProvider::AzureFrontDoor, check: Check::Present("x-azure-ref") },
    CdnRule { provider: CdnProvider::Sucuri, check: Check::Present("x-sucuri-id") },
    CdnRule { provider: CdnProvider::Sucuri, check: Check::Header("server", &RE_SUCURI) },
    CdnRule { provider: CdnProvider::Imperva, check: Check::Present("x-iinfo") },
    CdnRule { provider: CdnProvider::Imperva, check: Check::Header("x-cdn", &RE_IMPERVA) },
    CdnRule { provider: CdnProvider::Edgio, check: Check::Header("server", &RE_EDGECAST) },
];

static WAF_HEADER_RULES: &[WafRule] = &[
    WafRule { product: WafProduct::Cloudflare, check: Check::Present("cf-ray") },
    WafRule { product: WafProduct::Cloudflare, check: Check::Header("set-cookie", &RE_CF_COOKIE) },
    WafRule { product: WafProduct::AkamaiKona, check: Check::AnyValue(&RE_AKAMAI) },
    WafRule { product: WafProduct::Sucuri, check: Check::Present("x-sucuri-id") },
    WafRule { product: WafProduct::Sucuri, check: Check::Header("server", &RE_SUCURI) },
    WafRule { product: WafProduct::Imperva, check: Check::Present("x-incapsula") },
    WafRule { product: WafProduct::Imperva, check: Check::Present("x-iinfo") },
    WafRule { product: WafProduct::Imperva, check: Check::Header("set-cookie", &RE_INCAP_COOKIE) },
];

/// ASN organization substrings that identify a CDN operator.
const ASN_CDN_TABLE: &[(&str, CdnProvider)] = &[
    ("cloudflare", CdnProvider::Cloudflare),
    ("akamai", CdnProvider::Akamai),
    ("fastly", CdnProvider::Fastly),
    ("edgecast", CdnProvider::Edgio),
    ("edgio", CdnProvider::Edgio),
    ("stackpath", CdnProvider::StackPath),
    ("incapsula", CdnProvider::Imperva),
    ("sucuri", CdnProvider::Sucuri),
];

/// ASN organization substrings for generic hosting providers.
const HOSTING_TABLE: &[(&str, &str)] = &[
    ("amazon", "Amazon Web Services"),
    ("google", "Google Cloud"),
    ("microsoft", "Microsoft Azure"),
    ("unifiedlayer", "Bluehost / HostGator"),
    ("hostinger", "Hostinger"),
    ("digitalocean", "DigitalOcean"),
    ("linode", "Akamai Linode"),
    ("ovh", "OVH"),
    ("hetzner", "Hetzner"),
    ("vultr", "Vultr"),
    ("choopa", "Vultr"),
    ("contabo", "Contabo"),
    ("godaddy", "GoDaddy"),
    ("ionos", "IONOS"),
];

/// Operators whose points of presence make city geolocation misleading.
const GEO_MASKING_ORGS: &[&str] = &["cloudflare", "akamai", "fastly", "amazon", "microsoft", "edgecast"];

/// Location and network operator of one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoAttribution {
    pub location: String,
    pub operator: String,
}

/// Attributes an IP to a location and operator.
///
/// A CDN-operated address reports `LOCATION_MASKED` instead of the
/// point-of-presence city.
pub fn locate(geo: &dyn GeoIpLookup, ip: Option<IpAddr>) -> GeoAttribution {
    let Some(ip) = ip else {
        return GeoAttribution {
            location: NOT_RESOLVED.to_string(),
            operator: NOT_RESOLVED.to_string(),
        };
    };

    let operator = geo.lookup_asn(ip).map(|asn| asn.organization);
    if let Some(org) = operator.as_deref() {
        let lower = org.to_lowercase();
        if GEO_MASKING_ORGS.iter().any(|cdn| lower.contains(cdn)) {
            debug!(%ip, operator = org, "Address belongs to a CDN, masking its location.");
            return GeoAttribution {
                location: LOCATION_MASKED.to_string(),
                operator: org.to_string(),
            };
        }
    }

    let location = match geo.lookup_city(ip) {
        Some(city) => format!(
            "{}, {}",
            city.city.as_deref().unwrap_or(UNKNOWN),
            city.country.as_deref().unwrap_or(UNKNOWN)
        ),
        None => UNKNOWN.to_string(),
    };
    GeoAttribution {
        location,
        operator: operator.unwrap_or_else(|| UNKNOWN.to_string()),
    }
}

/// Fills location and operator of each panel entry from its first address.
pub fn attribute_panel(geo: &dyn GeoIpLookup, entries: &mut [DnsPanelEntry]) {
    for entry in entries {
        let GeoAttribution { location, operator } = locate(geo, entry.ips.first().copied());
        entry.location = location;
        entry.operator = operator;
    }
}

/// Names the server software from the `server` header.
pub fn detect_server(headers: &RawHeaders) -> String {
    let Some(server) = headers.get("server").map(|s| s.trim()).filter(|s| !s.is_empty()) else {
        return UNKNOWN.to_string();
    };
    let lower = server.to_lowercase();
    let name = if lower.contains("nginx") {
        "Nginx"
    } else if lower.contains("apache") {
        "Apache"
    } else if lower.contains("iis") {
        "Microsoft IIS"
    } else if lower.contains("litespeed") {
        "LiteSpeed"
    } else if lower.contains("cloudflare") {
        "Cloudflare"
    } else {
        return server.to_string();
    };
    match server_version(server) {
        Some(version) => format!("{name} {version}"),
        None => name.to_string(),
    }
}

static RE_SERVER_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+(?:\.\d+)*)").unwrap());

fn server_version(server: &str) -> Option<String> {
    RE_SERVER_VERSION
        .captures(server)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn detect_cdn(headers: &RawHeaders, asn_org: Option<&str>) -> CdnProvider {
    if let Some(rule) = CDN_HEADER_RULES.iter().find(|r| r.check.matches(headers)) {
        debug!(cdn = %rule.provider, "CDN identified from response headers.");
        return rule.provider;
    }
    if let Some(org) = asn_org {
        let lower = org.to_lowercase();
        if let Some((_, provider)) = ASN_CDN_TABLE.iter().find(|(needle, _)| lower.contains(needle)) {
            debug!(cdn = %provider, operator = org, "CDN identified from ASN organization.");
            return *provider;
        }
    }
    CdnProvider::Unknown
}

pub fn detect_waf(headers: &RawHeaders) -> WafProduct {
    WAF_HEADER_RULES
        .iter()
        .find(|r| r.check.matches(headers))
        .map(|r| r.product)
        .unwrap_or(WafProduct::NotDetected)
}

pub fn detect_hosting(asn_org: Option<&str>) -> String {
    let Some(org) = asn_org else {
        return UNKNOWN.to_string();
    };
    let lower = org.to_lowercase();
    HOSTING_TABLE
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| org.to_string())
}

/// Builds the full infrastructure profile for a target.
pub fn classify(headers: &RawHeaders, geo: &dyn GeoIpLookup, ip: Option<IpAddr>) -> InfrastructureProfile {
    let asn_org = ip.and_then(|ip| geo.lookup_asn(ip)).map(|asn| asn.organization);
    let profile = InfrastructureProfile {
        server: detect_server(headers),
        cdn: detect_cdn(headers, asn_org.as_deref()),
        waf: detect_waf(headers),
        hosting: detect_hosting(asn_org.as_deref()),
    };
    debug!(?profile, "Infrastructure classified.");
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geoip::StaticGeoIp;

    fn headers(pairs: &[(&str, &str)]) -> RawHeaders {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn cloudflare_trace_header_wins_over_asn() {
        let raw = headers(&[("cf-ray", "8a1b2c3d4e5f-MXP")]);
        assert_eq!(detect_cdn(&raw, Some("Fastly, Inc.")), CdnProvider::Cloudflare);
        assert_eq!(detect_cdn(&raw, None), CdnProvider::Cloudflare);
        assert_eq!(detect_waf(&raw), WafProduct::Cloudflare);
    }

    #[test]
    fn vendor_headers_map_to_products() {
        let cases = [
            (headers(&[("x-amz-cf-id", "abc==")]), CdnProvider::CloudFront),
            (headers(&[("x-served-by", "cache-mxp6931-MXP")]), CdnProvider::Fastly),
            (headers(&[("x-sucuri-id", "18015")]), CdnProvider::Sucuri),
            (headers(&[("x-iinfo", "9-1234-0 0NNN")]), CdnProvider::Imperva),
            (headers(&[("server", "AkamaiGHost")]), CdnProvider::Akamai),
            (headers(&[("server", "ECAcc (mil/D2C4)")]), CdnProvider::Edgio),
        ];
        for (raw, expected) in cases {
            assert_eq!(detect_cdn(&raw, None), expected, "{raw:?}");
        }
    }

    #[test]
    fn asn_cdn_table_is_second_priority() {
        let raw = headers(&[("server", "nginx")]);
        assert_eq!(detect_cdn(&raw, Some("FASTLY")), CdnProvider::Fastly);
        assert_eq!(detect_cdn(&raw, Some("Akamai International B.V.")), CdnProvider::Akamai);
        assert_eq!(detect_cdn(&raw, Some("Hetzner Online GmbH")), CdnProvider::Unknown);
    }

    #[test]
    fn cloud_vendor_asn_is_hosting_not_cdn() {
        let raw = headers(&[("server", "nginx/1.25.3")]);
        assert_eq!(detect_cdn(&raw, Some("AMAZON-02")), CdnProvider::Unknown);
        assert_eq!(detect_hosting(Some("AMAZON-02")), "Amazon Web Services");
        assert_eq!(detect_cdn(&raw, Some("MICROSOFT-CORP-MSN-AS-BLOCK")), CdnProvider::Unknown);

        let with_product_header = headers(&[("x-amz-cf-pop", "MXP64-P1")]);
        assert_eq!(detect_cdn(&with_product_header, Some("AMAZON-02")), CdnProvider::CloudFront);
    }

    #[test]
    fn hosting_falls_back_to_raw_org_then_unknown() {
        assert_eq!(detect_hosting(Some("DIGITALOCEAN-ASN")), "DigitalOcean");
        assert_eq!(detect_hosting(Some("Aruba S.p.A.")), "Aruba S.p.A.");
        assert_eq!(detect_hosting(None), UNKNOWN);
    }

    #[test]
    fn waf_defaults_to_not_detected() {
        assert_eq!(detect_waf(&headers(&[("server", "Apache")])), WafProduct::NotDetected);
        assert_eq!(
            detect_waf(&headers(&[("set-cookie", "visid_incap_123=abc; path=/")])),
            WafProduct::Imperva
        );
    }

    #[test]
    fn server_software_labels() {
        assert_eq!(detect_server(&headers(&[("server", "nginx/1.25.3")])), "Nginx 1.25.3");
        assert_eq!(detect_server(&headers(&[("server", "Apache")])), "Apache");
        assert_eq!(detect_server(&headers(&[("server", "Microsoft-IIS/10.0")])), "Microsoft IIS 10.0");
        assert_eq!(detect_server(&headers(&[("server", "gws")])), "gws");
        assert_eq!(detect_server(&headers(&[])), UNKNOWN);
    }

    #[test]
    fn cdn_operated_address_masks_location() {
        let addr = ip("104.16.1.1");
        let geo = StaticGeoIp::new()
            .with_city(addr, "San Francisco", "United States")
            .with_asn(addr, 13335, "CLOUDFLARENET");
        let attribution = locate(&geo, Some(addr));
        assert_eq!(attribution.location, LOCATION_MASKED);
        assert_eq!(attribution.operator, "CLOUDFLARENET");
    }

    #[test]
    fn ordinary_address_gets_city_and_country() {
        let addr = ip("203.0.113.10");
        let geo = StaticGeoIp::new()
            .with_city(addr, "Falkenstein", "Germany")
            .with_asn(addr, 24940, "Hetzner Online GmbH");
        let attribution = locate(&geo, Some(addr));
        assert_eq!(attribution.location, "Falkenstein, Germany");
        assert_eq!(attribution.operator, "Hetzner Online GmbH");
    }

    #[test]
    fn attribution_misses_degrade_to_unknown() {
        let geo = StaticGeoIp::new();
        let attribution = locate(&geo, Some(ip("198.51.100.4")));
        assert_eq!(attribution.location, UNKNOWN);
        assert_eq!(attribution.operator, UNKNOWN);
        assert_eq!(locate(&geo, None).location, NOT_RESOLVED);

        let profile = classify(&RawHeaders::new(), &geo, None);
        assert_eq!(profile.server, UNKNOWN);
        assert_eq!(profile.cdn, CdnProvider::Unknown);
        assert_eq!(profile.waf, WafProduct::NotDetected);
        assert_eq!(profile.hosting, UNKNOWN);
    }
}
