//! HTTP integration: `tower` middleware, `axum` extractors and error responses.

pub mod error;
pub mod extract;
pub mod middleware;

pub use error::{PROBLEM_CONTENT_TYPE, Problem};
pub use extract::{AuthenticatedPeer, OptionalPeer};
pub use middleware::{MtlsAuthLayer, MtlsAuthService};
