//! Per-call client record propagated through call extensions.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use http::Extensions;

use crate::auth_data::AuthData;
use crate::identity::PeerIdentity;

/// Client information for one call.
///
/// Both the gRPC and the HTTP stacks carry per-call data in
/// [`http::Extensions`]; the record is stored there by value and replaced,
/// never mutated in place, when an identity is attached.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    remote_addr: Option<SocketAddr>,
    auth: Option<Arc<dyn AuthData>>,
}

impl ClientInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the record stored in `extensions`, or an empty record.
    #[must_use]
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions.get::<Self>().cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn with_remote_addr(mut self, remote_addr: SocketAddr) -> Self {
        self.remote_addr = Some(remote_addr);
        self
    }

    /// Returns the record with `auth` attached, replacing any previous identity.
    #[must_use]
    pub fn with_auth<A: AuthData>(mut self, auth: A) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Identity attached to this call, if any.
    ///
    /// `None` means the call is unauthenticated.
    #[must_use]
    pub fn auth(&self) -> Option<&dyn AuthData> {
        self.auth.as_deref()
    }

    /// Attached identity downcast to its concrete type.
    #[must_use]
    pub fn auth_as<T: AuthData>(&self) -> Option<&T> {
        let auth: &dyn Any = self.auth.as_deref()?;
        auth.downcast_ref::<T>()
    }

    /// Shorthand for `auth_as::<PeerIdentity>()`.
    #[must_use]
    pub fn peer_identity(&self) -> Option<&PeerIdentity> {
        self.auth_as::<PeerIdentity>()
    }
}
