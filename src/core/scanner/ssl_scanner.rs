// src/core/scanner/ssl_scanner.rs

use std::net::{IpAddr, SocketAddr, TcpStream};
use std::time::Duration;

use chrono::{DateTime, Utc};
use openssl::ssl::{SslConnector, SslMethod};
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, warn};
use x509_parser::prelude::*;

use crate::core::models::{ProbeOutcome, TlsRecord};

pub const TLS_PORT: u16 = 443;

/// Performs a fresh TLS handshake against `ip:port` and reads the leaf certificate.
///
/// `ip` is the address the SSRF guard vetted; the hostname is never resolved
/// again and only serves as SNI and for hostname verification against the
/// system trust store. Any failure (connect, handshake, parse, timeout, task
/// panic) becomes `Unavailable`.
pub async fn run_ssl_scan(host: &str, ip: IpAddr, port: u16, timeout: Duration) -> ProbeOutcome<TlsRecord> {
    info!(host, %ip, port, "Starting SSL/TLS scan.");
    let host_owned = host.to_string();
    let addr = SocketAddr::new(ip, port);

    debug!("Spawning blocking task for TLS connection.");
    let task = spawn_blocking(move || perform_tls_scan(&host_owned, addr, timeout));

    let scan_result = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!(panic = %e, "Blocking SSL scan task panicked!");
            Err(format!("Task panicked: {e}"))
        }
        Err(_) => Err(format!("TLS handshake timed out after {}s", timeout.as_secs())),
    };

    match scan_result {
        Ok(record) => {
            info!(
                protocol = %record.protocol_version,
                issuer = %record.issuer,
                days_remaining = record.days_remaining,
                "SSL/TLS scan finished."
            );
            ProbeOutcome::Available(record)
        }
        Err(reason) => {
            warn!(host, error = %reason, "SSL/TLS scan unavailable.");
            ProbeOutcome::unavailable(reason)
        }
    }
}

fn perform_tls_scan(host: &str, addr: SocketAddr, timeout: Duration) -> Result<TlsRecord, String> {
    debug!(host, %addr, "Connecting TCP stream.");
    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| format!("TCP Connection Error: {e}"))?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|_| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| format!("Socket Configuration Error: {e}"))?;

    let connector = SslConnector::builder(SslMethod::tls_client())
        .map_err(|e| format!("TlsConnector Error: {e}"))?
        .build();

    debug!(host, "Performing TLS handshake.");
    let tls = connector
        .connect(host, stream)
        .map_err(|e| format!("TLS Handshake Error: {e}"))?;

    let protocol_version = tls.ssl().version_str().to_string();
    let cert = tls
        .ssl()
        .peer_certificate()
        .ok_or_else(|| "TLS connection successful, but no peer certificate provided".to_string())?;
    let cert_der = cert
        .to_der()
        .map_err(|e| format!("Could not convert certificate to DER: {e}"))?;

    record_from_der(&cert_der, protocol_version, Utc::now())
}

/// Builds a `TlsRecord` from a DER-encoded leaf certificate.
pub fn record_from_der(der: &[u8], protocol_version: String, now: DateTime<Utc>) -> Result<TlsRecord, String> {
    let (_, x509) = parse_x509_certificate(der).map_err(|e| format!("X.509 Parse Error: {e}"))?;
    debug!(subject = %x509.subject(), issuer = %x509.issuer(), "Successfully parsed certificate.");

    let validity = x509.validity();
    let valid_from = asn1_time_to_chrono_utc(&validity.not_before);
    let valid_to = asn1_time_to_chrono_utc(&validity.not_after);

    Ok(TlsRecord {
        issuer: issuer_label(x509.issuer()),
        subject: subject_label(x509.subject()),
        valid_from,
        valid_to,
        days_remaining: valid_to.signed_duration_since(now).num_days(),
        protocol_version,
    })
}

/// Organization of the issuer, else its common name.
fn issuer_label(name: &X509Name<'_>) -> String {
    first_attr(name.iter_organization())
        .or_else(|| first_attr(name.iter_common_name()))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn subject_label(name: &X509Name<'_>) -> String {
    first_attr(name.iter_common_name()).unwrap_or_else(|| name.to_string())
}

fn first_attr<'a, 'b: 'a>(mut attrs: impl Iterator<Item = &'a AttributeTypeAndValue<'b>>) -> Option<String> {
    attrs
        .find_map(|attr| attr.as_str().ok())
        .map(str::to_string)
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};

    fn loopback() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    #[tokio::test]
    async fn handshake_goes_to_the_vetted_address_not_the_hostname() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            if let Ok((socket, _)) = listener.accept() {
                drop(socket);
            }
        });

        // The name does not resolve; only the given address can be reached.
        let outcome = run_ssl_scan("scano.invalid", loopback(), port, Duration::from_secs(2)).await;
        match outcome {
            ProbeOutcome::Unavailable { reason } => assert!(reason.contains("TLS Handshake Error"), "{reason}"),
            ProbeOutcome::Available(r) => panic!("unexpected certificate {r:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let outcome = run_ssl_scan("127.0.0.1", loopback(), port, Duration::from_secs(2)).await;
        match outcome {
            ProbeOutcome::Unavailable { reason } => assert!(reason.starts_with("TCP Connection Error"), "{reason}"),
            ProbeOutcome::Available(r) => panic!("unexpected certificate {r:?}"),
        }
    }

    #[test]
    fn garbage_der_is_a_parse_error() {
        let err = record_from_der(b"not a certificate", "TLSv1.3".into(), Utc::now()).unwrap_err();
        assert!(err.starts_with("X.509 Parse Error"));
    }
}
