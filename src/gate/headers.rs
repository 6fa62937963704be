//! Header translation across the proxy boundary.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Strip headers the inbound `Connection` header marks as hop-by-hop
//! - Replace the inbound `Host` with the upstream authority

use http::header::{CONNECTION, HOST};
use http::{HeaderMap, HeaderName, HeaderValue};

/// Headers meaningful only for a single transport leg.
///
/// `transfer-encoding` is in here too, so response framing is always
/// recomputed by the serving side.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Header names listed in `Connection: a, b`.
fn connection_listed(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

fn copy_filtered(source: &HeaderMap, skip: impl Fn(&HeaderName) -> bool) -> HeaderMap {
    let listed = connection_listed(source);
    let mut out = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if is_hop_by_hop(name) || listed.contains(name) || skip(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Headers for the outbound request: inbound minus hop-by-hop, `Host`
/// rewritten to the upstream.
pub fn request_headers(inbound: &HeaderMap, upstream_host: HeaderValue) -> HeaderMap {
    let mut out = copy_filtered(inbound, |name| name == HOST);
    out.insert(HOST, upstream_host);
    out
}

/// Headers relayed back to the caller.
pub fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    copy_filtered(upstream, |_| false)
}
