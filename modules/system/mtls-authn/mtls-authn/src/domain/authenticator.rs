use http::Extensions;
use mtls_authn_sdk::{ClientInfo, PeerIdentity};
use tonic::metadata::MetadataMap;
use tracing::{debug, error};

use crate::config::MtlsAuthConfig;
use crate::domain::error::MtlsAuthError;
use crate::transport::{CertificateSource, HttpConnection, RpcPeer};

/// Client certificate authenticator shared by the gRPC and HTTP entry points.
///
/// Holds only the configured policy, so one value can serve any number of
/// concurrent calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MtlsAuthenticator {
    require_cert: bool,
}

impl Default for MtlsAuthenticator {
    fn default() -> Self {
        Self::from_config(&MtlsAuthConfig::default())
    }
}

impl MtlsAuthenticator {
    #[must_use]
    pub const fn new(require_cert: bool) -> Self {
        Self { require_cert }
    }

    #[must_use]
    pub const fn from_config(config: &MtlsAuthConfig) -> Self {
        Self::new(config.require_cert)
    }

    #[must_use]
    pub const fn require_cert(&self) -> bool {
        self.require_cert
    }

    /// Authenticates a gRPC call from the peer in its extensions.
    ///
    /// On success with a certificate the call's [`ClientInfo`] is replaced by a
    /// copy carrying the peer identity. Rejections leave `extensions` as they
    /// were. `metadata` is not consulted.
    ///
    /// # Errors
    ///
    /// - [`MtlsAuthError::WrongIntegrationPoint`] if the call has no RPC peer
    ///   but came in over HTTP
    /// - [`MtlsAuthError::MissingCertificate`] if no certificate was presented
    ///   and one is required
    /// - [`MtlsAuthError::MalformedCertificate`] if the leaf cannot be parsed
    pub fn authenticate(
        &self,
        extensions: &mut Extensions,
        _metadata: &MetadataMap,
    ) -> Result<(), MtlsAuthError> {
        let Some(peer) = RpcPeer::from_extensions(extensions) else {
            if extensions.get::<HttpConnection>().is_some() {
                error!("mtls authenticator invoked for an HTTP call, install it as HTTP middleware");
                return Err(MtlsAuthError::WrongIntegrationPoint);
            }
            return Ok(());
        };

        if let Some(client) = self.resolve(Some(&peer), extensions)? {
            extensions.insert(client);
        }
        Ok(())
    }

    /// Resolves the [`ClientInfo`] an HTTP request should carry.
    ///
    /// Returns `Ok(None)` when the request passes without an identity.
    ///
    /// # Errors
    ///
    /// Same as [`authenticate`](Self::authenticate), except that misrouting
    /// cannot happen here.
    pub fn authenticate_http(
        &self,
        extensions: &Extensions,
    ) -> Result<Option<ClientInfo>, MtlsAuthError> {
        self.resolve(extensions.get::<HttpConnection>(), extensions)
    }

    fn resolve<S>(
        self,
        source: Option<&S>,
        extensions: &Extensions,
    ) -> Result<Option<ClientInfo>, MtlsAuthError>
    where
        S: CertificateSource + ?Sized,
    {
        let Some((source, leaf)) =
            source.and_then(|s| s.leaf_certificate().map(|leaf| (s, leaf)))
        else {
            if self.require_cert {
                debug!("rejecting call without peer certificate");
                return Err(MtlsAuthError::MissingCertificate);
            }
            debug!("no peer certificate presented, continuing without identity");
            return Ok(None);
        };

        let identity = PeerIdentity::from_der(leaf.clone()).inspect_err(|e| {
            debug!(error = %e, "rejecting call with unreadable peer certificate");
        })?;
        debug!(
            subject = identity.subject(),
            issuer = identity.issuer(),
            "peer certificate identity attached"
        );
        let mut client = ClientInfo::from_extensions(extensions);
        if client.remote_addr().is_none()
            && let Some(addr) = source.remote_addr()
        {
            client = client.with_remote_addr(addr);
        }
        Ok(Some(client.with_auth(identity)))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::net::SocketAddr;

    use mtls_authn_sdk::testing::TestPki;
    use rustls_pki_types::CertificateDer;
    use tracing_test::traced_test;

    use super::*;
    use crate::transport::{AuthInfo, TlsConnectionState};

    fn addr() -> SocketAddr {
        "192.0.2.10:50051".parse().unwrap()
    }

    fn tls_peer(chain: Vec<CertificateDer<'static>>) -> RpcPeer {
        RpcPeer::new(
            Some(addr()),
            AuthInfo::Tls(TlsConnectionState::with_peer_certificates(chain)),
        )
    }

    fn extensions_with<T: Clone + Send + Sync + 'static>(value: T) -> Extensions {
        let mut extensions = Extensions::new();
        extensions.insert(value);
        extensions
    }

    fn attached(extensions: &Extensions) -> Option<PeerIdentity> {
        extensions
            .get::<ClientInfo>()
            .and_then(ClientInfo::peer_identity)
            .cloned()
    }

    #[test]
    fn tls_peer_identity_comes_from_leaf() {
        let pki = TestPki::new("Test Root CA");
        let chain = vec![pki.issue_client("leaf-client"), pki.ca_der()];
        let mut extensions = extensions_with(tls_peer(chain));

        MtlsAuthenticator::new(true)
            .authenticate(&mut extensions, &MetadataMap::new())
            .unwrap();

        let identity = attached(&extensions).unwrap();
        assert_eq!(identity.subject(), "CN=leaf-client");
        assert_eq!(identity.issuer(), "CN=Test Root CA");
    }

    #[test]
    fn existing_client_info_fields_are_kept() {
        let pki = TestPki::new("Test Root CA");
        let mut extensions = extensions_with(tls_peer(vec![pki.issue_client("client-1")]));
        extensions.insert(ClientInfo::new().with_remote_addr(addr()));

        MtlsAuthenticator::new(true)
            .authenticate(&mut extensions, &MetadataMap::new())
            .unwrap();

        let client = extensions.get::<ClientInfo>().unwrap();
        assert_eq!(client.remote_addr(), Some(addr()));
        assert!(client.peer_identity().is_some());
    }

    #[test]
    fn new_client_info_takes_remote_addr_from_peer() {
        let pki = TestPki::new("Test Root CA");
        let mut extensions = extensions_with(tls_peer(vec![pki.issue_client("client-1")]));

        MtlsAuthenticator::new(true)
            .authenticate(&mut extensions, &MetadataMap::new())
            .unwrap();

        let client = extensions.get::<ClientInfo>().unwrap();
        assert_eq!(client.remote_addr(), Some(addr()));
    }

    #[test]
    fn recorded_remote_addr_is_not_overwritten() {
        let pki = TestPki::new("Test Root CA");
        let proxied: SocketAddr = "198.51.100.1:443".parse().unwrap();
        let mut extensions = extensions_with(tls_peer(vec![pki.issue_client("client-1")]));
        extensions.insert(ClientInfo::new().with_remote_addr(proxied));

        MtlsAuthenticator::new(true)
            .authenticate(&mut extensions, &MetadataMap::new())
            .unwrap();

        assert_eq!(
            extensions.get::<ClientInfo>().unwrap().remote_addr(),
            Some(proxied)
        );
    }

    #[test]
    fn insecure_peer_rejected_when_certificate_required() {
        let mut extensions = extensions_with(RpcPeer::new(Some(addr()), AuthInfo::Insecure));

        let err = MtlsAuthenticator::new(true)
            .authenticate(&mut extensions, &MetadataMap::new())
            .unwrap_err();

        assert_eq!(err, MtlsAuthError::MissingCertificate);
        assert!(err.to_string().contains("tls.client_ca_file"));
        assert!(extensions.get::<ClientInfo>().is_none());
    }

    #[test]
    fn tls_peer_without_certificates_rejected_when_required() {
        let mut extensions = extensions_with(tls_peer(Vec::new()));

        let err = MtlsAuthenticator::new(true)
            .authenticate(&mut extensions, &MetadataMap::new())
            .unwrap_err();

        assert_eq!(err, MtlsAuthError::MissingCertificate);
        assert!(extensions.get::<ClientInfo>().is_none());
    }

    #[test]
    fn insecure_peer_passes_when_certificate_optional() {
        let mut extensions = extensions_with(RpcPeer::new(Some(addr()), AuthInfo::Insecure));

        MtlsAuthenticator::new(false)
            .authenticate(&mut extensions, &MetadataMap::new())
            .unwrap();

        assert!(extensions.get::<ClientInfo>().is_none());
    }

    #[test]
    fn call_without_peer_or_marker_passes_untouched() {
        let mut extensions = Extensions::new();

        MtlsAuthenticator::new(true)
            .authenticate(&mut extensions, &MetadataMap::new())
            .unwrap();

        assert!(extensions.get::<ClientInfo>().is_none());
    }

    #[test]
    fn http_marker_is_misrouting_for_both_policies() {
        for require_cert in [true, false] {
            let mut extensions = extensions_with(HttpConnection::new(Some(addr())));

            let err = MtlsAuthenticator::new(require_cert)
                .authenticate(&mut extensions, &MetadataMap::new())
                .unwrap_err();

            assert_eq!(err, MtlsAuthError::WrongIntegrationPoint);
            assert!(extensions.get::<ClientInfo>().is_none());
        }
    }

    #[test]
    fn malformed_leaf_rejected_for_both_policies() {
        for require_cert in [true, false] {
            let garbage = CertificateDer::from(vec![0xde, 0xad, 0xbe, 0xef]);
            let mut extensions = extensions_with(tls_peer(vec![garbage]));

            let err = MtlsAuthenticator::new(require_cert)
                .authenticate(&mut extensions, &MetadataMap::new())
                .unwrap_err();

            assert!(matches!(err, MtlsAuthError::MalformedCertificate(_)));
            assert!(extensions.get::<ClientInfo>().is_none());
        }
    }

    #[test]
    fn repeated_calls_yield_equal_identities() {
        let pki = TestPki::new("Test Root CA");
        let der = pki.issue_client("client-1");
        let auth = MtlsAuthenticator::default();

        let mut first = extensions_with(tls_peer(vec![der.clone()]));
        let mut second = extensions_with(tls_peer(vec![der]));
        auth.authenticate(&mut first, &MetadataMap::new()).unwrap();
        auth.authenticate(&mut second, &MetadataMap::new()).unwrap();

        let (a, b) = (attached(&first).unwrap(), attached(&second).unwrap());
        for name in PeerIdentity::attribute_names() {
            assert_eq!(a.get_attribute(name), b.get_attribute(name));
        }
    }

    #[test]
    fn http_resolution_reads_connection_state() {
        let pki = TestPki::new("Test Root CA");
        let conn = HttpConnection::new(Some(addr())).with_tls(
            TlsConnectionState::with_peer_certificates(vec![pki.issue_client("web-client")]),
        );
        let extensions = extensions_with(conn);

        let client = MtlsAuthenticator::new(true)
            .authenticate_http(&extensions)
            .unwrap()
            .unwrap();

        assert_eq!(client.peer_identity().unwrap().subject(), "CN=web-client");
    }

    #[test]
    fn http_resolution_without_connection_state() {
        let extensions = Extensions::new();

        assert_eq!(
            MtlsAuthenticator::new(true)
                .authenticate_http(&extensions)
                .unwrap_err(),
            MtlsAuthError::MissingCertificate
        );
        assert!(
            MtlsAuthenticator::new(false)
                .authenticate_http(&extensions)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn default_requires_certificate() {
        assert!(MtlsAuthenticator::default().require_cert());
    }

    #[test]
    #[traced_test]
    fn misrouting_is_logged_as_error() {
        let mut extensions = extensions_with(HttpConnection::default());

        let _ = MtlsAuthenticator::new(false).authenticate(&mut extensions, &MetadataMap::new());

        assert!(logs_contain("install it as HTTP middleware"));
    }

    #[test]
    #[traced_test]
    fn attached_identity_is_logged() {
        let pki = TestPki::new("Test Root CA");
        let mut extensions = extensions_with(tls_peer(vec![pki.issue_client("client-1")]));

        MtlsAuthenticator::new(true)
            .authenticate(&mut extensions, &MetadataMap::new())
            .unwrap();

        assert!(logs_contain("peer certificate identity attached"));
        assert!(logs_contain("CN=client-1"));
    }
}
