use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::Extensions;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;
use tonic::transport::server::{Connected, TcpConnectInfo, TlsConnectInfo};

use super::tls::{CertificateSource, TlsConnectionState};

/// Security the gRPC connection was established with.
#[derive(Debug, Clone, Default)]
pub enum AuthInfo {
    /// Plaintext connection.
    #[default]
    Insecure,
    /// TLS connection with its negotiated state.
    Tls(TlsConnectionState),
}

/// Session peer of a gRPC call.
///
/// Published once per connection by [`TlsConnection`] and copied by `tonic`
/// into the extensions of every call on that connection.
#[derive(Debug, Clone, Default)]
pub struct RpcPeer {
    remote_addr: Option<SocketAddr>,
    auth_info: AuthInfo,
}

impl RpcPeer {
    #[must_use]
    pub fn new(remote_addr: Option<SocketAddr>, auth_info: AuthInfo) -> Self {
        Self {
            remote_addr,
            auth_info,
        }
    }

    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    #[must_use]
    pub fn auth_info(&self) -> &AuthInfo {
        &self.auth_info
    }

    /// Peer of the call owning `extensions`.
    ///
    /// Besides the peer published by [`TlsConnection`], the connect info of
    /// `tonic`'s own listeners is recognised: [`TlsConnectInfo`] from a server
    /// built with `tls_config` is a TLS peer, a bare [`TcpConnectInfo`] an
    /// insecure one.
    #[must_use]
    pub fn from_extensions(extensions: &Extensions) -> Option<Self> {
        if let Some(peer) = extensions.get::<Self>() {
            return Some(peer.clone());
        }
        if let Some(info) = extensions.get::<TlsConnectInfo<TcpConnectInfo>>() {
            return Some(Self::from_tls_connect_info(info));
        }
        extensions
            .get::<TcpConnectInfo>()
            .map(|info| Self::new(info.remote_addr(), AuthInfo::Insecure))
    }

    /// Peer of a connection accepted by `tonic`'s TLS listener.
    #[must_use]
    pub fn from_tls_connect_info(info: &TlsConnectInfo<TcpConnectInfo>) -> Self {
        let chain = info
            .peer_certs()
            .map(|certs| certs.iter().cloned().collect())
            .unwrap_or_default();
        Self::new(
            info.get_ref().remote_addr(),
            AuthInfo::Tls(TlsConnectionState::with_peer_certificates(chain)),
        )
    }
}

impl CertificateSource for RpcPeer {
    fn tls_state(&self) -> Option<&TlsConnectionState> {
        match &self.auth_info {
            AuthInfo::Tls(state) => Some(state),
            AuthInfo::Insecure => None,
        }
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }
}

/// Server-side TLS stream that publishes its [`RpcPeer`] to `tonic`.
///
/// Feed accepted connections to `Server::serve_with_incoming`; every call
/// then carries the peer in its extensions.
pub struct TlsConnection<IO> {
    inner: TlsStream<IO>,
    peer: RpcPeer,
}

impl<IO> TlsConnection<IO> {
    #[must_use]
    pub fn new(stream: TlsStream<IO>, remote_addr: Option<SocketAddr>) -> Self {
        let (_, session) = stream.get_ref();
        let state = TlsConnectionState::from_server_connection(session);
        tracing::trace!(
            remote_addr = ?remote_addr,
            peer_certificates = state.peer_certificates().len(),
            "TLS connection established"
        );
        Self {
            inner: stream,
            peer: RpcPeer::new(remote_addr, AuthInfo::Tls(state)),
        }
    }

    #[must_use]
    pub fn peer(&self) -> &RpcPeer {
        &self.peer
    }
}

impl TlsConnection<TcpStream> {
    /// Runs the TLS handshake on an accepted TCP stream.
    ///
    /// # Errors
    ///
    /// Returns the handshake error, including client certificate rejections
    /// by the acceptor's verifier.
    pub async fn accept(acceptor: &TlsAcceptor, stream: TcpStream) -> io::Result<Self> {
        let remote_addr = stream.peer_addr().ok();
        let tls = acceptor.accept(stream).await?;
        Ok(Self::new(tls, remote_addr))
    }
}

impl<IO> Connected for TlsConnection<IO> {
    type ConnectInfo = RpcPeer;

    fn connect_info(&self) -> Self::ConnectInfo {
        self.peer.clone()
    }
}

impl<IO> AsyncRead for TlsConnection<IO>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<IO> AsyncWrite for TlsConnection<IO>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
