use std::net::SocketAddr;

use tokio_rustls::server::TlsStream;
use tower_http::add_extension::AddExtensionLayer;

use super::tls::{CertificateSource, TlsConnectionState};

/// Connection state of an HTTP request.
///
/// Attached to each request by the server's accept loop, see
/// [`HttpConnection::layer`]. Its presence also marks a call as HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpConnection {
    local_addr: Option<SocketAddr>,
    remote_addr: Option<SocketAddr>,
    tls: Option<TlsConnectionState>,
}

impl HttpConnection {
    /// Plaintext connection from `remote_addr`.
    #[must_use]
    pub fn new(remote_addr: Option<SocketAddr>) -> Self {
        Self {
            local_addr: None,
            remote_addr,
            tls: None,
        }
    }

    /// Connection terminated by `stream`.
    #[must_use]
    pub fn from_tls_stream<IO>(stream: &TlsStream<IO>, remote_addr: Option<SocketAddr>) -> Self {
        let (_, session) = stream.get_ref();
        Self::new(remote_addr).with_tls(TlsConnectionState::from_server_connection(session))
    }

    #[must_use]
    pub fn with_local_addr(mut self, local_addr: SocketAddr) -> Self {
        self.local_addr = Some(local_addr);
        self
    }

    #[must_use]
    pub fn with_tls(mut self, tls: TlsConnectionState) -> Self {
        self.tls = Some(tls);
        self
    }

    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// TLS state, `None` for plaintext connections.
    #[must_use]
    pub fn tls(&self) -> Option<&TlsConnectionState> {
        self.tls.as_ref()
    }

    /// Layer inserting this state into every request served on the connection.
    ///
    /// ```ignore
    /// let conn = HttpConnection::from_tls_stream(&tls, Some(remote_addr));
    /// let svc = ServiceBuilder::new().layer(conn.layer()).service(router.clone());
    /// ```
    #[must_use]
    pub fn layer(self) -> AddExtensionLayer<Self> {
        AddExtensionLayer::new(self)
    }
}

impl CertificateSource for HttpConnection {
    fn tls_state(&self) -> Option<&TlsConnectionState> {
        self.tls()
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }
}
