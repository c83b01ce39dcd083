// src/core/target.rs

//! URL normalization and the SSRF guard.
//!
//! Both run before any probe: a target is only handed to the scanners once
//! its hostname resolved and none of its addresses is reserved.
//! [`PublicResolver`] applies the same rule to every hostname the HTTP
//! clients connect to later, redirects included.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tracing::{debug, info, warn};
use url::{Host, Url};

use crate::core::error::{BlockReason, ScanError};
use crate::core::models::ScanTarget;

/// Turns user input into an absolute http(s) URL with a host.
///
/// Input without a scheme is treated as `https://`.
pub fn normalize_target(raw: &str) -> Result<Url, ScanError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScanError::malformed(raw, "empty input"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|e| ScanError::malformed(raw, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ScanError::malformed(
                raw,
                format!("unsupported scheme `{other}`"),
            ));
        }
    }
    if host_of(&url).is_none() {
        return Err(ScanError::malformed(raw, "missing hostname"));
    }
    Ok(url)
}

/// Hostname without IPv6 brackets, suitable for sockets and resolvers.
pub fn host_of(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) if !domain.is_empty() => Some(domain.trim_end_matches('.').to_string()),
        Host::Domain(_) => None,
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

/// True for loopback, private, link-local and other non-public ranges.
///
/// Covers 127.0.0.0/8, 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16 and
/// 169.254.0.0/16, plus 0.0.0.0/8, 100.64.0.0/10 and the IPv6 equivalents.
pub fn is_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_reserved_v4(v4),
        IpAddr::V6(v6) => is_reserved_v6(v6),
    }
}

fn is_reserved_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || a == 0
        || (a == 100 && (64..=127).contains(&b))
}

fn is_reserved_v6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_reserved_v4(mapped);
    }
    ip.is_loopback() || ip.is_unspecified() || ip.is_unique_local() || ip.is_unicast_link_local()
}

/// Resolves the URL's host and rejects it if any address is reserved.
///
/// Resolution failure or timeout is a rejection, not a retry.
pub async fn guard_target(url: Url, timeout: Duration) -> Result<ScanTarget, ScanError> {
    let host = host_of(&url).ok_or_else(|| ScanError::malformed(url.as_str(), "missing hostname"))?;

    let addresses = match host.parse::<IpAddr>() {
        Ok(ip) => vec![ip],
        Err(_) => resolve_host(&host, url.port_or_known_default().unwrap_or(443), timeout).await,
    };

    let first = vet_addresses(&host, &addresses)?;

    info!(host = %host, ip = %first, "Target passed the SSRF guard.");
    Ok(ScanTarget {
        url,
        host,
        resolved_ip: first,
    })
}

/// First address of `addresses`, or a rejection if the list is empty or any
/// entry is reserved.
fn vet_addresses(host: &str, addresses: &[IpAddr]) -> Result<IpAddr, ScanError> {
    let Some(&first) = addresses.first() else {
        warn!(host = %host, "Hostname did not resolve, refusing to connect.");
        return Err(ScanError::blocked(host, BlockReason::Unresolvable));
    };

    if let Some(&reserved) = addresses.iter().find(|ip| is_reserved(**ip)) {
        warn!(host = %host, ip = %reserved, "Hostname resolves to a reserved address, refusing to connect.");
        return Err(ScanError::blocked(host, BlockReason::ReservedAddress(reserved)));
    }
    Ok(first)
}

/// Socket addresses for `host`, rejected as a whole if any is reserved.
pub fn public_addresses(host: &str, addrs: Vec<SocketAddr>) -> Result<Vec<SocketAddr>, ScanError> {
    let ips: Vec<IpAddr> = addrs.iter().map(SocketAddr::ip).collect();
    vet_addresses(host, &ips)?;
    Ok(addrs)
}

/// DNS resolver for reqwest clients that refuses reserved addresses.
///
/// The guard only vets the hostname the user typed. A redirect to another
/// name, or the same name answering differently on the second lookup, goes
/// through this resolver instead. IP literals never reach it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicResolver;

impl Resolve for PublicResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().trim_end_matches('.').to_string();
        Box::pin(async move {
            let resolved = tokio::net::lookup_host((host.as_str(), 0)).await?;
            let public = public_addresses(&host, resolved.collect())?;
            let addrs: Addrs = Box::new(public.into_iter());
            Ok::<Addrs, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}

async fn resolve_host(host: &str, port: u16, timeout: Duration) -> Vec<IpAddr> {
    debug!(host, "Resolving target hostname.");
    match tokio::time::timeout(timeout, tokio::net::lookup_host((host, port))).await {
        Ok(Ok(addrs)) => addrs.map(|a| a.ip()).collect(),
        Ok(Err(e)) => {
            debug!(host, error = %e, "Hostname resolution failed.");
            Vec::new()
        }
        Err(_) => {
            debug!(host, "Hostname resolution timed out.");
            Vec::new()
        }
    }
}
