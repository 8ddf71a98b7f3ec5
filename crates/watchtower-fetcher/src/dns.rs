//! Injected DNS resolution and the blocked-address ranges behind SSRF
//! hardening (spec.md §4.5).

use crate::error::{FetcherError, FetcherResult};
use ipnetwork::IpNetwork;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

#[async_trait::async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> FetcherResult<Vec<IpAddr>>;
}

/// Resolves via the OS stub resolver, same as any outbound HTTP client.
pub struct SystemDnsResolver;

#[async_trait::async_trait]
impl DnsResolver for SystemDnsResolver {
    async fn resolve(&self, host: &str) -> FetcherResult<Vec<IpAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| FetcherError::Dns(e.to_string()))?;
        Ok(addrs.map(|a| a.ip()).collect())
    }
}

fn carrier_grade_nat() -> IpNetwork {
    IpNetwork::from_str("100.64.0.0/10").expect("valid CIDR")
}

fn documentation_ranges() -> Vec<IpNetwork> {
    vec![
        IpNetwork::from_str("192.0.2.0/24").expect("valid CIDR"),
        IpNetwork::from_str("198.51.100.0/24").expect("valid CIDR"),
        IpNetwork::from_str("203.0.113.0/24").expect("valid CIDR"),
        IpNetwork::from_str("2001:db8::/32").expect("valid CIDR"),
    ]
}

/// True if `ip` falls in a range that must never be reached for an
/// SSRF-hardened outbound fetch: loopback, link-local, private, multicast,
/// broadcast, unspecified, reserved, carrier-grade NAT, or documentation.
pub fn is_blocked_ip(ip: IpAddr) -> bool {
    if ip.is_loopback() || ip.is_multicast() || ip.is_unspecified() {
        return true;
    }
    match ip {
        IpAddr::V4(v4) => {
            if v4.is_private() || v4.is_link_local() || v4 == Ipv4Addr::BROADCAST {
                return true;
            }
            if carrier_grade_nat().contains(ip) {
                return true;
            }
            documentation_ranges().iter().any(|net| net.contains(ip))
        }
        IpAddr::V6(v6) => {
            // fc00::/7 (unique local) and fe80::/10 (link-local) cover the
            // IPv6 analogues of RFC1918 and link-local.
            let segments = v6.segments();
            let unique_local = (segments[0] & 0xfe00) == 0xfc00;
            let link_local = (segments[0] & 0xffc0) == 0xfe80;
            unique_local || link_local || documentation_ranges().iter().any(|net| net.contains(ip))
        }
    }
}
