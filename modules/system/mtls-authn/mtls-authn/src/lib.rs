//! mTLS `AuthN` Module
//!
//! Authenticates callers by the client certificate their TLS handshake
//! presented and attaches the resulting [`PeerIdentity`](mtls_authn_sdk::PeerIdentity)
//! to the call's [`ClientInfo`](mtls_authn_sdk::ClientInfo).
//!
//! One policy, two integration points:
//! - gRPC: [`MtlsAuthenticator`] is a `tonic` interceptor reading the
//!   [`RpcPeer`](transport::RpcPeer) published by [`TlsConnection`](transport::TlsConnection)
//! - HTTP: [`MtlsAuthLayer`] is a `tower` layer reading the per-request
//!   [`HttpConnection`](transport::HttpConnection)
//!
//! Certificate chains are verified by `rustls` before this module runs.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod config;
pub mod domain;
pub mod module;
pub mod transport;

pub use api::rest::{AuthenticatedPeer, MtlsAuthLayer, MtlsAuthService, OptionalPeer};
pub use config::MtlsAuthConfig;
pub use domain::{MtlsAuthError, MtlsAuthenticator};
pub use module::{ComponentType, Lifecycle, MtlsAuthExtension, MtlsAuthFactory, StabilityLevel};
