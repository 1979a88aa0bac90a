//! Client fingerprints attached to token requests.
//!
//! The IAM service records the fingerprints presented when a token is issued
//! and, on refresh, requires at least [`MIN_FINGERPRINTS_TO_MATCH`] of them to
//! match again.

use std::net::IpAddr;

use http::HeaderMap;
use http::header::{HeaderName, USER_AGENT};

/// Fingerprints a refresh must match (client IP and user agent).
pub const MIN_FINGERPRINTS_TO_MATCH: u32 = 2;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// The parts of an inbound HTTP request that identify the calling client.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    headers: HeaderMap,
    remote_addr: Option<IpAddr>,
}

impl InboundRequest {
    pub fn new(headers: HeaderMap, remote_addr: Option<IpAddr>) -> Self {
        Self { headers, remote_addr }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Originating client address.
    ///
    /// The first hop of the first `x-forwarded-for` header wins; otherwise the
    /// socket peer. Header values are taken as-is after trimming, not parsed.
    pub fn client_ip(&self) -> Option<String> {
        let forwarded = first_value(&self.headers, &X_FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match forwarded {
            Some(ip) => Some(ip.to_string()),
            None => self.remote_addr.map(|addr| addr.to_string()),
        }
    }

    pub fn user_agent(&self) -> Option<String> {
        first_value(&self.headers, &USER_AGENT)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// `[client_ip, user_agent]`, skipping whichever is unavailable.
    pub fn fingerprints(&self) -> Vec<String> {
        self.client_ip().into_iter().chain(self.user_agent()).collect()
    }
}

fn first_value<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
