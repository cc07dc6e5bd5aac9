//! gRPC integration: [`MtlsAuthenticator`] as a `tonic` interceptor.
//!
//! ```ignore
//! let auth = MtlsAuthenticator::from_config(&config);
//! Server::builder()
//!     .add_service(GreeterServer::with_interceptor(greeter, auth))
//!     .serve_with_incoming(tls_connections)
//!     .await?;
//! ```

use tonic::service::Interceptor;
use tonic::{Request, Status};

use crate::domain::{MtlsAuthError, MtlsAuthenticator};

impl MtlsAuthenticator {
    /// Authenticates a `tonic` request of any message type.
    ///
    /// # Errors
    ///
    /// Returns the [`Status`] mapped from the [`MtlsAuthError`].
    pub fn authenticate_request<T>(&self, request: Request<T>) -> Result<Request<T>, Status> {
        let (metadata, mut extensions, message) = request.into_parts();
        self.authenticate(&mut extensions, &metadata)?;
        Ok(Request::from_parts(metadata, extensions, message))
    }
}

impl Interceptor for MtlsAuthenticator {
    fn call(&mut self, request: Request<()>) -> Result<Request<()>, Status> {
        self.authenticate_request(request)
    }
}

impl From<MtlsAuthError> for Status {
    fn from(err: MtlsAuthError) -> Self {
        match err {
            MtlsAuthError::MissingCertificate | MtlsAuthError::MalformedCertificate(_) => {
                Self::unauthenticated(err.to_string())
            }
            MtlsAuthError::WrongIntegrationPoint => Self::failed_precondition(err.to_string()),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use mtls_authn_sdk::IdentityError;
    use tonic::Code;

    use super::*;

    #[test]
    fn certificate_errors_are_unauthenticated() {
        let status = Status::from(MtlsAuthError::MissingCertificate);
        assert_eq!(status.code(), Code::Unauthenticated);
        assert_eq!(status.message(), "no peer certificate. forgot tls.client_ca_file?");

        let malformed = MtlsAuthError::from(IdentityError::MalformedCertificate("bad".into()));
        assert_eq!(Status::from(malformed).code(), Code::Unauthenticated);
    }

    #[test]
    fn misrouting_is_failed_precondition() {
        let status = Status::from(MtlsAuthError::WrongIntegrationPoint);
        assert_eq!(status.code(), Code::FailedPrecondition);
        assert!(status.message().contains("http middleware"));
    }
}
