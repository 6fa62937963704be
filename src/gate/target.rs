//! Upstream target and its shared, memoized resolution.
//!
//! # Design Decisions
//! - The target is immutable once resolved and shared read-only
//! - Resolution is single-flight: one computation, every waiter sees its result
//! - A failed resolution is cached like a success; the gate never retries it

use std::fmt;
use std::future::{self, Future};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use http::uri::{Authority, Scheme};
use http::{HeaderValue, Uri};
use url::Url;

use crate::error::ResolveError;

/// Resolved upstream base address (scheme, host, port).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    scheme: Scheme,
    authority: Authority,
}

impl ProxyTarget {
    pub fn new(scheme: Scheme, authority: Authority) -> Self {
        Self { scheme, authority }
    }

    /// Parse a base address such as `http://127.0.0.1:5173`.
    ///
    /// Only plain HTTP upstreams are supported, and the base must not carry a
    /// path or query since the inbound path is appended verbatim.
    pub fn parse(base: &str) -> Result<Self, ResolveError> {
        let url = Url::parse(base)
            .map_err(|e| ResolveError::new(format!("invalid upstream address {base:?}: {e}")))?;

        if url.scheme() != "http" {
            return Err(ResolveError::new(format!(
                "upstream address {base:?} uses unsupported scheme {:?}",
                url.scheme()
            )));
        }
        if url.path() != "/" || url.query().is_some() {
            return Err(ResolveError::new(format!(
                "upstream address {base:?} must not carry a path or query"
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ResolveError::new(format!("upstream address {base:?} has no host")))?;
        let port = url.port_or_known_default().unwrap_or(80);
        let authority: Authority = format!("{host}:{port}")
            .parse()
            .map_err(|e| ResolveError::new(format!("invalid upstream authority in {base:?}: {e}")))?;

        Ok(Self::new(Scheme::HTTP, authority))
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// `host:port` suitable for a TCP connect.
    pub fn socket_address(&self) -> String {
        format!(
            "{}:{}",
            self.authority.host(),
            self.authority.port_u16().unwrap_or(80)
        )
    }

    /// Value for the outbound `Host` header.
    pub fn host_header(&self) -> Result<HeaderValue, http::Error> {
        HeaderValue::from_str(self.authority.as_str()).map_err(http::Error::from)
    }

    /// Target base + inbound path and query, verbatim.
    pub fn uri_for(&self, inbound: &Uri) -> Result<Uri, http::Error> {
        let path_and_query = inbound
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for ProxyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

type ResolveFuture = BoxFuture<'static, Result<ProxyTarget, ResolveError>>;

/// Shared, memoized, awaitable upstream target.
///
/// Clones share the same computation. It is polled lazily by the first
/// waiter unless created with [`TargetResolution::spawn`].
#[derive(Clone)]
pub struct TargetResolution {
    inner: Shared<ResolveFuture>,
}

impl TargetResolution {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Future<Output = Result<ProxyTarget, ResolveError>> + Send + 'static,
    {
        Self {
            inner: resolve.boxed().shared(),
        }
    }

    /// Start the computation now on the current runtime.
    pub fn spawn<F>(resolve: F) -> Self
    where
        F: Future<Output = Result<ProxyTarget, ResolveError>> + Send + 'static,
    {
        let handle = tokio::spawn(resolve);
        Self::new(async move {
            handle
                .await
                .map_err(|e| ResolveError::new(format!("target resolution task failed: {e}")))?
        })
    }

    pub fn ready(target: ProxyTarget) -> Self {
        Self::settled(Ok(target))
    }

    pub fn failed(error: ResolveError) -> Self {
        Self::settled(Err(error))
    }

    /// An already completed resolution, visible to [`TargetResolution::peek`]
    /// before anyone awaits it.
    fn settled(result: Result<ProxyTarget, ResolveError>) -> Self {
        let resolution = Self::new(future::ready(result));
        // `Shared` only records its output once polled.
        let _ = resolution.inner.clone().now_or_never();
        resolution
    }

    /// Await the shared result.
    pub async fn resolve(&self) -> Result<ProxyTarget, ResolveError> {
        self.inner.clone().await
    }

    /// The completed result, if resolution has already finished.
    pub fn peek(&self) -> Option<Result<ProxyTarget, ResolveError>> {
        self.inner.peek().cloned()
    }
}

impl fmt::Debug for TargetResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.inner.peek() {
            None => "pending".to_string(),
            Some(Ok(target)) => target.to_string(),
            Some(Err(e)) => format!("failed: {e}"),
        };
        f.debug_struct("TargetResolution").field("state", &state).finish()
    }
}
