//! Certificate fixtures for tests.
//!
//! Enabled with the `test-util` feature. Certificates use a fixed validity
//! window so attribute values are stable across runs.
#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

/// `tls.client.not_before` of certificates issued by [`TestPki`].
pub const NOT_BEFORE: &str = "2024-01-01T00:00:00Z";
/// `tls.client.not_after` of certificates issued by [`TestPki`].
pub const NOT_AFTER: &str = "2034-01-01T00:00:00Z";

/// A throwaway certificate authority issuing client certificates.
pub struct TestPki {
    ca_cert: Certificate,
    ca_key: KeyPair,
}

impl TestPki {
    #[must_use]
    pub fn new(ca_common_name: &str) -> Self {
        let ca_key = KeyPair::generate().expect("generate CA key");
        let mut params =
            CertificateParams::new(Vec::<String>::new()).expect("empty SAN list is valid");
        params.distinguished_name = DistinguishedName::new();
        params.distinguished_name.push(DnType::CommonName, ca_common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.not_before = rcgen::date_time_ymd(2024, 1, 1);
        params.not_after = rcgen::date_time_ymd(2034, 1, 1);
        let ca_cert = params.self_signed(&ca_key).expect("self-sign CA");

        Self { ca_cert, ca_key }
    }

    /// Parameters of a client leaf certificate without a subject.
    #[must_use]
    pub fn client_params() -> CertificateParams {
        let mut params = CertificateParams::new(vec!["client.example.test".to_owned()])
            .expect("valid SAN");
        params.distinguished_name = DistinguishedName::new();
        params.not_before = rcgen::date_time_ymd(2024, 1, 1);
        params.not_after = rcgen::date_time_ymd(2034, 1, 1);
        params
    }

    /// Issues a client certificate with subject `CN=<common_name>`.
    #[must_use]
    pub fn issue_client(&self, common_name: &str) -> CertificateDer<'static> {
        let mut params = Self::client_params();
        params.distinguished_name.push(DnType::CommonName, common_name);
        self.issue(params)
    }

    /// Like [`issue_client`](Self::issue_client), with the private key for
    /// presenting the certificate in a handshake.
    #[must_use]
    pub fn issue_client_with_key(
        &self,
        common_name: &str,
    ) -> (CertificateDer<'static>, PrivateKeyDer<'static>) {
        let mut params = Self::client_params();
        params.distinguished_name.push(DnType::CommonName, common_name);
        self.issue_with_key(params)
    }

    /// Issues a certificate for arbitrary parameters, signed by this CA.
    #[must_use]
    pub fn issue(&self, params: CertificateParams) -> CertificateDer<'static> {
        self.issue_with_key(params).0
    }

    /// Issues a certificate and returns it with its PKCS#8 private key.
    #[must_use]
    pub fn issue_with_key(
        &self,
        params: CertificateParams,
    ) -> (CertificateDer<'static>, PrivateKeyDer<'static>) {
        let key = KeyPair::generate().expect("generate leaf key");
        let cert = params
            .signed_by(&key, &self.ca_cert, &self.ca_key)
            .expect("sign leaf certificate");
        let key_der = PrivatePkcs8KeyDer::from(key.serialize_der());
        (cert.der().clone(), key_der.into())
    }

    /// Issues a server certificate for `dns_name`.
    #[must_use]
    pub fn issue_server(&self, dns_name: &str) -> (CertificateDer<'static>, PrivateKeyDer<'static>) {
        let mut params =
            CertificateParams::new(vec![dns_name.to_owned()]).expect("valid server SAN");
        params.distinguished_name = DistinguishedName::new();
        params.distinguished_name.push(DnType::CommonName, dns_name);
        params.not_before = rcgen::date_time_ymd(2024, 1, 1);
        params.not_after = rcgen::date_time_ymd(2034, 1, 1);
        self.issue_with_key(params)
    }

    /// DER of the CA certificate, for building full chains.
    #[must_use]
    pub fn ca_der(&self) -> CertificateDer<'static> {
        self.ca_cert.der().clone()
    }
}
