//! Error types for the mTLS `AuthN` SDK.

use thiserror::Error;

/// Errors that can occur while building a [`PeerIdentity`](crate::PeerIdentity).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The presented certificate could not be read as X.509.
    #[error("malformed peer certificate: {0}")]
    MalformedCertificate(String),
}
