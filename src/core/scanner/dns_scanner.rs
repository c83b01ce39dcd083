// src/core/scanner/dns_scanner.rs

use std::net::IpAddr;
use std::time::Duration;

use futures::future::join_all;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use tracing::{debug, info, warn};

use crate::core::attribution::NOT_RESOLVED;
use crate::core::config::ResolverEntry;
use crate::core::models::DnsPanelEntry;

impl DnsPanelEntry {
    /// An entry for a resolver that produced no addresses.
    pub fn unanswered(resolver: &ResolverEntry, error: Option<String>) -> Self {
        Self {
            resolver: resolver.name.clone(),
            address: resolver.address,
            ips: Vec::new(),
            location: NOT_RESOLVED.to_string(),
            operator: NOT_RESOLVED.to_string(),
            error,
        }
    }
}

/// Queries every configured resolver for the host's A records.
///
/// Queries run concurrently, each under its own timeout. The panel keeps the
/// configured resolver order and always has one entry per resolver; a
/// failing resolver yields an entry with no addresses. Location and operator
/// are filled in later by attribution.
///
/// # Arguments
/// * `host` - The hostname to resolve.
/// * `resolvers` - The ordered resolver list.
/// * `timeout` - Per-query budget.
pub async fn run_dns_scan(host: &str, resolvers: &[ResolverEntry], timeout: Duration) -> Vec<DnsPanelEntry> {
    info!(host, resolvers = resolvers.len(), "Starting DNS panel scan.");

    let panel = join_all(resolvers.iter().map(|resolver| query_resolver(host, resolver, timeout))).await;

    let answered = panel.iter().filter(|e| !e.ips.is_empty()).count();
    info!(host, answered, "DNS panel scan finished.");
    panel
}

async fn query_resolver(host: &str, resolver: &ResolverEntry, timeout: Duration) -> DnsPanelEntry {
    if let Ok(ip) = host.parse::<IpAddr>() {
        debug!(resolver = %resolver.name, "Host is an IP literal, no query needed.");
        return DnsPanelEntry {
            ips: vec![ip],
            ..DnsPanelEntry::unanswered(resolver, None)
        };
    }

    let config = ResolverConfig::from_parts(
        None,
        vec![],
        NameServerConfigGroup::from_ips_clear(&[resolver.address], resolver.port, true),
    );
    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 1;
    opts.cache_size = 0;
    opts.use_hosts_file = false;
    let dns = TokioAsyncResolver::tokio(config, opts);

    debug!(resolver = %resolver.name, address = %resolver.address, host, "Querying A records.");
    let error = match tokio::time::timeout(timeout, dns.ipv4_lookup(host)).await {
        Ok(Ok(lookup)) => {
            let ips: Vec<IpAddr> = lookup.iter().map(|a| IpAddr::V4(a.0)).collect();
            debug!(resolver = %resolver.name, count = ips.len(), "A records resolved.");
            return DnsPanelEntry {
                ips,
                ..DnsPanelEntry::unanswered(resolver, None)
            };
        }
        Ok(Err(e)) => e.to_string(),
        Err(_) => format!("query timed out after {}s", timeout.as_secs()),
    };

    warn!(resolver = %resolver.name, host, error = %error, "A record lookup failed.");
    DnsPanelEntry::unanswered(resolver, Some(error))
}

/// The first non-empty answer in resolver order.
pub fn primary_ip(panel: &[DnsPanelEntry]) -> Option<IpAddr> {
    panel.iter().find_map(|entry| entry.ips.first().copied())
}
