//! SSRF-hardened agent card fetching (spec.md §4.5).
//!
//! `fetch_agent_card` builds its own `reqwest::Client` per call with
//! automatic redirect-following disabled: every hop is inspected by this
//! crate so the destination's resolved addresses can be re-checked before
//! a single byte is read. A caller-supplied `Client` would defeat this —
//! reqwest's default policy auto-follows up to 10 redirects internally,
//! before `check_url` ever sees the intermediate 3xx.

pub mod dns;
pub mod error;
pub mod schema;

use dns::{is_blocked_ip, DnsResolver};
use error::FetcherResult;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::warn;
use watchtower_types::FetchStatus;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout_ms: u32,
    pub max_bytes: u32,
    pub allow_http: bool,
    pub max_redirects: u32,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status: FetchStatus,
    pub card_hash: Option<String>,
    pub card_json: Option<serde_json::Value>,
    pub http_status: Option<u16>,
    pub error: Option<String>,
}

impl FetchOutcome {
    fn blocked(reason: impl Into<String>) -> Self {
        Self { status: FetchStatus::SsrfBlocked, card_hash: None, card_json: None, http_status: None, error: Some(reason.into()) }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self { status: FetchStatus::InvalidSchema, card_hash: None, card_json: None, http_status: None, error: Some(reason.into()) }
    }

    fn with_http_status(mut self, http_status: u16) -> Self {
        self.http_status = Some(http_status);
        self
    }

    fn unreachable(reason: impl Into<String>) -> Self {
        Self { status: FetchStatus::Unreachable, card_hash: None, card_json: None, http_status: None, error: Some(reason.into()) }
    }

    fn timeout() -> Self {
        Self { status: FetchStatus::Timeout, card_hash: None, card_json: None, http_status: None, error: Some("timed out".to_string()) }
    }
}

/// Checks `url`'s scheme and resolved addresses against the SSRF policy.
/// Returns the allowed URL's host for logging, or a blocking reason.
async fn check_url(url: &reqwest::Url, resolver: &dyn DnsResolver, allow_http: bool) -> Result<(), String> {
    match url.scheme() {
        "https" => {}
        "http" if allow_http => {}
        other => return Err(format!("scheme {other} not permitted")),
    }
    let host = url.host_str().ok_or_else(|| "missing host".to_string())?;
    let addrs = resolver.resolve(host).await.map_err(|e| e.to_string())?;
    if addrs.is_empty() {
        return Err("DNS resolution returned no addresses".to_string());
    }
    if addrs.iter().any(|a| is_blocked_ip(*a)) {
        return Err(format!("resolved address for {host} is in a blocked range"));
    }
    Ok(())
}

/// Builds the `Client` used for a single fetch: redirects disabled so
/// `fetch_following_redirects` sees and re-checks every hop itself.
fn build_client(opts: &FetchOptions) -> reqwest::Result<Client> {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_millis(opts.timeout_ms as u64))
        .build()
}

/// Fetches and validates an agent card per the SSRF-hardened contract in
/// spec.md §4.5. Never returns `Err`: every failure mode is a `FetchStatus`.
pub async fn fetch_agent_card(resolver: &dyn DnsResolver, agent_uri: &str, opts: &FetchOptions) -> FetchOutcome {
    let client = match build_client(opts) {
        Ok(c) => c,
        Err(e) => return FetchOutcome::unreachable(e.to_string()),
    };
    match fetch_inner(&client, resolver, agent_uri, opts).await {
        Ok(outcome) => outcome,
        Err(e) => FetchOutcome::unreachable(e.to_string()),
    }
}

async fn fetch_inner(
    client: &Client,
    resolver: &dyn DnsResolver,
    agent_uri: &str,
    opts: &FetchOptions,
) -> FetcherResult<FetchOutcome> {
    let deadline = Duration::from_millis(opts.timeout_ms as u64);
    match tokio::time::timeout(deadline, fetch_following_redirects(client, resolver, agent_uri, opts)).await {
        Ok(outcome) => Ok(outcome),
        Err(_) => Ok(FetchOutcome::timeout()),
    }
}

async fn fetch_following_redirects(
    client: &Client,
    resolver: &dyn DnsResolver,
    agent_uri: &str,
    opts: &FetchOptions,
) -> FetchOutcome {
    let mut current = match reqwest::Url::parse(agent_uri) {
        Ok(u) => u,
        Err(e) => return FetchOutcome::unreachable(format!("invalid URL: {e}")),
    };

    for hop in 0..=opts.max_redirects {
        if let Err(reason) = check_url(&current, resolver, opts.allow_http).await {
            return FetchOutcome::blocked(reason);
        }

        let response = match client.get(current.clone()).send().await {
            Ok(r) => r,
            Err(e) => return FetchOutcome::unreachable(e.to_string()),
        };

        if response.status().is_redirection() {
            if hop == opts.max_redirects {
                return FetchOutcome::unreachable("too many redirects");
            }
            let Some(location) = response.headers().get(reqwest::header::LOCATION).and_then(|v| v.to_str().ok()) else {
                return FetchOutcome::unreachable("redirect missing Location header");
            };
            current = match current.join(location) {
                Ok(u) => u,
                Err(e) => return FetchOutcome::unreachable(format!("invalid redirect target: {e}")),
            };
            continue;
        }

        return finish_response(response, opts).await;
    }
    FetchOutcome::unreachable("too many redirects")
}

async fn finish_response(response: reqwest::Response, opts: &FetchOptions) -> FetchOutcome {
    let http_status = response.status().as_u16();
    if response.status() != StatusCode::OK && !response.status().is_success() {
        return FetchOutcome::unreachable(format!("HTTP {http_status}")).with_http_status(http_status);
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                body.extend_from_slice(&bytes);
                if body.len() > opts.max_bytes as usize {
                    return FetchOutcome::invalid("oversized").with_http_status(http_status);
                }
            }
            Err(e) => return FetchOutcome::unreachable(e.to_string()),
        }
    }

    let parsed: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return FetchOutcome::invalid(e.to_string()).with_http_status(http_status),
    };

    if let Err(reason) = schema::validate_agent_card(&parsed) {
        warn!(reason, "agent card failed schema validation");
        return FetchOutcome::invalid(reason).with_http_status(http_status);
    }

    let card_hash = watchtower_crypto::sha256_hex(watchtower_crypto::canonical_json(&parsed));
    FetchOutcome { status: FetchStatus::Ok, card_hash: Some(card_hash), card_json: Some(parsed), http_status: Some(http_status), error: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;
    use std::str::FromStr;

    struct FixedResolver(Vec<IpAddr>);

    #[async_trait::async_trait]
    impl DnsResolver for FixedResolver {
        async fn resolve(&self, _host: &str) -> FetcherResult<Vec<IpAddr>> {
            Ok(self.0.clone())
        }
    }

    /// Resolves each host to whatever address it's mapped to, unmapped
    /// hosts resolve to nothing. Lets a single test distinguish an allowed
    /// first hop from a blocked redirect target by hostname.
    struct MapResolver(std::collections::HashMap<String, IpAddr>);

    #[async_trait::async_trait]
    impl DnsResolver for MapResolver {
        async fn resolve(&self, host: &str) -> FetcherResult<Vec<IpAddr>> {
            Ok(self.0.get(host).copied().into_iter().collect())
        }
    }

    fn opts() -> FetchOptions {
        FetchOptions { timeout_ms: 5_000, max_bytes: 2_097_152, allow_http: true, max_redirects: 3 }
    }

    /// Seed scenario S6: loopback target is blocked even with `allowHttp`.
    #[tokio::test]
    async fn blocks_loopback_target() {
        let resolver = FixedResolver(vec![IpAddr::from_str("127.0.0.1").unwrap()]);
        let outcome = fetch_agent_card(&resolver, "http://127.0.0.1/card", &opts()).await;
        assert_eq!(outcome.status, FetchStatus::SsrfBlocked);
    }

    #[tokio::test]
    async fn blocks_private_range_target() {
        let resolver = FixedResolver(vec![IpAddr::from_str("10.0.0.5").unwrap()]);
        let outcome = fetch_agent_card(&resolver, "http://internal.example/card", &opts()).await;
        assert_eq!(outcome.status, FetchStatus::SsrfBlocked);
    }

    #[tokio::test]
    async fn rejects_https_requirement_without_allow_http() {
        let resolver = FixedResolver(vec![IpAddr::from_str("93.184.216.34").unwrap()]);
        let mut o = opts();
        o.allow_http = false;
        let outcome = fetch_agent_card(&resolver, "http://example.com/card", &o).await;
        assert_eq!(outcome.status, FetchStatus::SsrfBlocked);
    }

    /// Seed scenario S6, redirect variant: a reachable first hop redirects
    /// to a blocked address, and the manual per-hop recheck catches it —
    /// proving the real `Client` never auto-follows past `check_url`.
    #[tokio::test]
    async fn redirect_to_blocked_ip_is_caught() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/card"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "http://internal.metadata.example/secret"))
            .mount(&server)
            .await;

        let server_url = reqwest::Url::parse(&server.uri()).unwrap();
        let server_host = server_url.host_str().unwrap().to_string();

        let mut hosts = std::collections::HashMap::new();
        hosts.insert(server_host, IpAddr::from_str("93.184.216.34").unwrap());
        hosts.insert("internal.metadata.example".to_string(), IpAddr::from_str("169.254.169.254").unwrap());
        let resolver = MapResolver(hosts);

        let outcome = fetch_agent_card(&resolver, &format!("{}/card", server.uri()), &opts()).await;
        assert_eq!(outcome.status, FetchStatus::SsrfBlocked);
    }
}
