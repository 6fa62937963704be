//! Streaming relay of upstream response bodies.
//!
//! Frames are forwarded as they arrive; nothing is buffered. If the
//! request's cancel scope fires mid-stream the body ends with an error,
//! which makes the server abort the response to the caller.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;

use crate::error::{BoxError, ProxyError};
use crate::gate::cancel::{CancelReason, CancelScope};

pin_project! {
    /// Upstream body bounded by a cancel scope.
    pub struct GuardedBody<B> {
        #[pin]
        inner: B,
        cancelled: Pin<Box<dyn Future<Output = CancelReason> + Send>>,
        aborted: bool,
    }
}

impl<B> GuardedBody<B> {
    pub fn new(inner: B, scope: CancelScope) -> Self {
        Self {
            inner,
            cancelled: scope.into_cancelled(),
            aborted: false,
        }
    }
}

impl<B> Body for GuardedBody<B>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        if *this.aborted {
            return Poll::Ready(None);
        }

        if let Poll::Ready(reason) = this.cancelled.as_mut().poll(cx) {
            *this.aborted = true;
            tracing::warn!(reason = %reason, "Aborting proxied response body");
            let err: BoxError = Box::new(ProxyError::UpstreamTimeout { reason });
            return Poll::Ready(Some(Err(err)));
        }

        this.inner.poll_frame(cx).map_err(Into::into)
    }

    fn is_end_stream(&self) -> bool {
        self.aborted || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
