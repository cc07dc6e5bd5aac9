use std::net::SocketAddr;
use std::sync::Arc;

use rustls::ServerConnection;
use rustls_pki_types::CertificateDer;

/// Negotiated TLS session state relevant to client authentication.
#[derive(Debug, Clone, Default)]
pub struct TlsConnectionState {
    peer_certificates: Arc<[CertificateDer<'static>]>,
    server_name: Option<String>,
}

impl TlsConnectionState {
    /// State of a completed server-side handshake.
    #[must_use]
    pub fn from_server_connection(conn: &ServerConnection) -> Self {
        let peer_certificates = conn
            .peer_certificates()
            .map(|certs| certs.iter().map(|c| c.clone().into_owned()).collect())
            .unwrap_or_default();
        Self {
            peer_certificates,
            server_name: conn.server_name().map(str::to_owned),
        }
    }

    /// State carrying `chain` as the verified peer chain, leaf first.
    #[must_use]
    pub fn with_peer_certificates(chain: Vec<CertificateDer<'static>>) -> Self {
        Self {
            peer_certificates: chain.into(),
            server_name: None,
        }
    }

    #[must_use]
    pub fn peer_certificates(&self) -> &[CertificateDer<'static>] {
        &self.peer_certificates
    }

    /// End-entity certificate of the peer, if the peer presented one.
    #[must_use]
    pub fn leaf_certificate(&self) -> Option<&CertificateDer<'static>> {
        self.peer_certificates.first()
    }

    /// SNI name the client asked for.
    #[must_use]
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }
}

/// Where a transport exposes the TLS state of a call.
///
/// Implemented by the gRPC session peer and by the HTTP per-request
/// connection state; the authenticator only ever asks for the leaf.
pub trait CertificateSource {
    /// TLS state, or `None` if the call did not arrive over TLS.
    fn tls_state(&self) -> Option<&TlsConnectionState>;

    /// Address of the connected client, when the transport knows it.
    fn remote_addr(&self) -> Option<SocketAddr>;

    fn leaf_certificate(&self) -> Option<&CertificateDer<'static>> {
        self.tls_state().and_then(TlsConnectionState::leaf_certificate)
    }
}
