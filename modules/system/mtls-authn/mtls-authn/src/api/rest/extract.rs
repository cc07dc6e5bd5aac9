//! Extractors for handlers behind [`MtlsAuthLayer`](super::MtlsAuthLayer).

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mtls_authn_sdk::{ClientInfo, PeerIdentity};

use crate::domain::MtlsAuthError;

fn peer_identity(parts: &Parts) -> Option<PeerIdentity> {
    parts
        .extensions
        .get::<ClientInfo>()
        .and_then(ClientInfo::peer_identity)
        .cloned()
}

/// Identity of the client certificate; rejects with 401 when none is attached.
#[derive(Debug, Clone)]
pub struct AuthenticatedPeer(pub PeerIdentity);

impl<S> FromRequestParts<S> for AuthenticatedPeer
where
    S: Send + Sync,
{
    type Rejection = MtlsAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        peer_identity(parts)
            .map(AuthenticatedPeer)
            .ok_or(MtlsAuthError::MissingCertificate)
    }
}

/// Identity of the client certificate, if one was presented.
#[derive(Debug, Clone)]
pub struct OptionalPeer(pub Option<PeerIdentity>);

impl<S> FromRequestParts<S> for OptionalPeer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalPeer(peer_identity(parts)))
    }
}
