//! Domain errors for the mTLS `AuthN` module.

use mtls_authn_sdk::IdentityError;
use thiserror::Error;

/// Authentication failures. All are final for the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MtlsAuthError {
    /// No client certificate was presented and one is required.
    #[error("no peer certificate. forgot tls.client_ca_file?")]
    MissingCertificate,

    /// The gRPC entry point was invoked for an HTTP call.
    #[error("mtlsauth for https must be configured as http middleware")]
    WrongIntegrationPoint,

    /// The presented leaf certificate could not be read.
    #[error(transparent)]
    MalformedCertificate(#[from] IdentityError),
}
