//! URL guard for SSRF protection.
//!
//! Every outbound request the engine makes is aimed at a URL that came from an
//! untrusted caller or an untrusted page (og:image, oEmbed thumbnails). The
//! guard rejects targets that would reach internal services:
//! - Non-HTTP(S) schemes (file://, ftp://)
//! - Localhost and cloud metadata hostnames
//! - Loopback, private and link-local IP literals

use std::collections::HashSet;
use std::net::IpAddr;

use crate::error::{SecurityError, SecurityResult};

#[derive(Debug, Clone)]
pub struct UrlGuard {
    allowed_schemes: HashSet<String>,
    blocked_hosts: HashSet<String>,
    blocked_cidrs: Vec<ipnet::IpNet>,
    /// Hosts that bypass host and CIDR checks
    allowed_hosts: HashSet<String>,
}

impl Default for UrlGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlGuard {
    /// Create a guard with default rules.
    pub fn new() -> Self {
        let blocked_cidrs = [
            "10.0.0.0/8",
            "172.16.0.0/12",
            "192.168.0.0/16",
            "169.254.0.0/16", // Link-local / cloud metadata
            "127.0.0.0/8",
            "0.0.0.0/8",
            "::1/128",
            "fc00::/7",  // IPv6 private
            "fe80::/10", // IPv6 link-local
        ]
        .into_iter()
        .filter_map(|cidr| cidr.parse().ok())
        .collect();

        Self {
            allowed_schemes: ["http", "https"].into_iter().map(String::from).collect(),
            blocked_hosts: [
                "localhost",
                "metadata.google.internal",
                "metadata.gke.internal",
                "instance-data",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            blocked_cidrs,
            allowed_hosts: HashSet::new(),
        }
    }

    /// A guard that lets everything through. Only for tests against local mock servers.
    pub fn permissive() -> Self {
        Self {
            allowed_schemes: ["http", "https"].into_iter().map(String::from).collect(),
            blocked_hosts: HashSet::new(),
            blocked_cidrs: Vec::new(),
            allowed_hosts: HashSet::new(),
        }
    }

    /// Add an allowed host (bypasses host and CIDR checks).
    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.insert(host.into().to_ascii_lowercase());
        self
    }

    /// Validate a URL for safety.
    pub fn check(&self, url: &str) -> SecurityResult<()> {
        let parsed = url::Url::parse(url)?;

        if !self.allowed_schemes.contains(parsed.scheme()) {
            return Err(SecurityError::DisallowedScheme(parsed.scheme().to_string()));
        }

        let host = match parsed.host() {
            Some(url::Host::Domain(domain)) => domain.to_ascii_lowercase(),
            Some(url::Host::Ipv4(ip)) => return self.check_ip(IpAddr::V4(ip)),
            Some(url::Host::Ipv6(ip)) => return self.check_ip(IpAddr::V6(ip)),
            None => return Err(SecurityError::NoHost),
        };

        if self.allowed_hosts.contains(&host) {
            return Ok(());
        }

        let bare = host.trim_end_matches('.');
        if self.blocked_hosts.contains(bare) || bare.ends_with(".localhost") {
            return Err(SecurityError::BlockedHost(host));
        }

        Ok(())
    }

    fn check_ip(&self, ip: IpAddr) -> SecurityResult<()> {
        if self.allowed_hosts.contains(&ip.to_string()) {
            return Ok(());
        }
        match self.blocked_cidrs.iter().find(|cidr| cidr.contains(&ip)) {
            Some(_) => Err(SecurityError::BlockedCidr(ip.to_string())),
            None => Ok(()),
        }
    }

    /// Convenience boolean form of [`UrlGuard::check`].
    pub fn is_allowed(&self, url: &str) -> bool {
        self.check(url).is_ok()
    }
}
