//! `tower` middleware enforcing the client certificate policy on HTTP requests.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::response::{IntoResponse, Response};
use http::Request;
use tower::{Layer, Service};

use crate::domain::MtlsAuthenticator;

/// Layer wrapping services with [`MtlsAuthService`].
///
/// Requests must carry an [`HttpConnection`](crate::transport::HttpConnection)
/// in their extensions; a missing one counts as a plaintext connection.
///
/// # Example
/// ```ignore
/// router = router.layer(MtlsAuthLayer::new(MtlsAuthenticator::from_config(&config)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MtlsAuthLayer {
    authenticator: MtlsAuthenticator,
}

impl MtlsAuthLayer {
    #[must_use]
    pub const fn new(authenticator: MtlsAuthenticator) -> Self {
        Self { authenticator }
    }
}

impl<S> Layer<S> for MtlsAuthLayer {
    type Service = MtlsAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MtlsAuthService {
            inner,
            authenticator: self.authenticator,
        }
    }
}

/// Service attaching the peer identity, or answering 401 itself.
///
/// The inner service is called at most once per request.
#[derive(Debug, Clone)]
pub struct MtlsAuthService<S> {
    inner: S,
    authenticator: MtlsAuthenticator,
}

impl<S, B> Service<Request<B>> for MtlsAuthService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        match self.authenticator.authenticate_http(request.extensions()) {
            Ok(Some(client)) => {
                request.extensions_mut().insert(client);
            }
            Ok(None) => {}
            Err(err) => return Box::pin(async move { Ok(err.into_response()) }),
        }

        let not_ready_inner = self.inner.clone();
        let mut ready_inner = std::mem::replace(&mut self.inner, not_ready_inner);
        Box::pin(async move { ready_inner.call(request).await })
    }
}

impl MtlsAuthenticator {
    /// Layer form of the HTTP entry point.
    #[must_use]
    pub const fn layer(self) -> MtlsAuthLayer {
        MtlsAuthLayer::new(self)
    }

    /// Wraps `inner` so each request is authenticated before reaching it.
    #[must_use]
    pub fn wrap<S>(self, inner: S) -> MtlsAuthService<S> {
        self.layer().layer(inner)
    }
}
