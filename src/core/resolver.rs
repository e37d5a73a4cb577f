use crate::utils::error::{Result, ScanError};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Resolves `host` to an IPv4 address.
///
/// Literal addresses return immediately. Names go through
/// `tokio::net::lookup_host`, which runs the system resolver on tokio's
/// blocking pool, so a slow lookup never stalls other probes.
pub async fn resolve_ipv4(host: &str, timeout: Duration) -> Result<Ipv4Addr> {
    let host = host.trim();
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return Ok(addr);
    }

    let failure = |reason: String| ScanError::ResolutionError {
        host: host.to_string(),
        reason,
    };

    let addrs = tokio::time::timeout(timeout, tokio::net::lookup_host((host, 0)))
        .await
        .map_err(|_| failure(format!("lookup timed out after {:?}", timeout)))?
        .map_err(|e| failure(e.to_string()))?;

    first_ipv4(addrs).ok_or_else(|| failure("no IPv4 address in answer".to_string()))
}

fn first_ipv4(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|addr| match addr.ip() {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    })
}
