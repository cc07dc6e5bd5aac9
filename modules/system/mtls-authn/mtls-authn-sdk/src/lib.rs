//! mTLS `AuthN` SDK
//!
//! This crate provides the public models of the `mtls_authn` module:
//!
//! - [`PeerIdentity`] - Read-only view over a validated client certificate
//! - [`AttributeKey`] - Closed set of identity attributes a peer exposes
//! - [`AuthData`] - Generic attribute query interface for authorization code
//! - [`ClientInfo`] - Per-call record carrying the attached identity
//! - [`IdentityError`] - Error types
//!
//! ## Usage
//!
//! Downstream handlers read the identity from the call extensions:
//!
//! ```ignore
//! use mtls_authn_sdk::{ClientInfo, PeerIdentity};
//!
//! let client = ClientInfo::from_extensions(request.extensions());
//! if let Some(peer) = client.auth_as::<PeerIdentity>() {
//!     tracing::info!(subject = peer.subject(), "call from authenticated peer");
//! }
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod auth_data;
pub mod client_info;
pub mod error;
pub mod identity;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export main types at crate root
pub use auth_data::AuthData;
pub use client_info::ClientInfo;
pub use error::IdentityError;
pub use identity::{ATTRIBUTE_NAMES, AttributeKey, PeerIdentity};
