//! Domain layer for the mTLS `AuthN` module.

pub mod authenticator;
pub mod error;

pub use authenticator::MtlsAuthenticator;
pub use error::MtlsAuthError;
