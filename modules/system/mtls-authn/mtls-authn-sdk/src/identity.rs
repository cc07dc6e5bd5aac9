//! Peer identity derived from a validated client certificate.

use std::fmt;
use std::sync::Arc;

use rustls_pki_types::CertificateDer;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};
use x509_parser::der_parser::asn1_rs::ToDer;
use x509_parser::objects::{oid_registry, oid2abbrev};
use x509_parser::prelude::{AttributeTypeAndValue, FromDer, X509Certificate, X509Name};

use crate::auth_data::AuthData;
use crate::error::IdentityError;

/// Attribute names in the order reported by [`PeerIdentity::attribute_names`].
pub const ATTRIBUTE_NAMES: [&str; 4] = [
    AttributeKey::Subject.name(),
    AttributeKey::Issuer.name(),
    AttributeKey::NotBefore.name(),
    AttributeKey::NotAfter.name(),
];

/// Identity attributes exposed by a [`PeerIdentity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    /// Certificate subject, RFC 4514 string form.
    Subject,
    /// Certificate issuer, RFC 4514 string form.
    Issuer,
    /// Start of the validity window, RFC 3339 in UTC.
    NotBefore,
    /// End of the validity window, RFC 3339 in UTC.
    NotAfter,
}

impl AttributeKey {
    pub const ALL: [Self; 4] = [Self::Subject, Self::Issuer, Self::NotBefore, Self::NotAfter];

    /// Wire name of the attribute, e.g. `tls.client.subject`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Subject => "tls.client.subject",
            Self::Issuer => "tls.client.issuer",
            Self::NotBefore => "tls.client.not_before",
            Self::NotAfter => "tls.client.not_after",
        }
    }

    /// Looks up a key by wire name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only view over one client certificate already validated by the transport.
///
/// The certificate is parsed once at construction. Clones share the same
/// state, so attaching an identity to a call context is cheap.
#[derive(Clone)]
pub struct PeerIdentity {
    inner: Arc<Inner>,
}

struct Inner {
    der: CertificateDer<'static>,
    subject: String,
    issuer: String,
    not_before: String,
    not_after: String,
}

impl PeerIdentity {
    /// Builds an identity from the DER encoding of a leaf certificate.
    ///
    /// No trust, revocation or expiry checks are performed here; the caller
    /// is expected to hand over a certificate its TLS stack already accepted.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MalformedCertificate`] if the bytes are not an
    /// X.509 certificate or its validity timestamps cannot be rendered.
    pub fn from_der(der: CertificateDer<'static>) -> Result<Self, IdentityError> {
        let (subject, issuer, not_before, not_after) = {
            let (_, cert) = X509Certificate::from_der(der.as_ref())
                .map_err(|e| IdentityError::MalformedCertificate(e.to_string()))?;
            let validity = cert.validity();
            (
                rfc4514(cert.subject())?,
                rfc4514(cert.issuer())?,
                rfc3339(validity.not_before.to_datetime())?,
                rfc3339(validity.not_after.to_datetime())?,
            )
        };

        Ok(Self {
            inner: Arc::new(Inner {
                der,
                subject,
                issuer,
                not_before,
                not_after,
            }),
        })
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.inner.subject
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.inner.issuer
    }

    #[must_use]
    pub fn not_before(&self) -> &str {
        &self.inner.not_before
    }

    #[must_use]
    pub fn not_after(&self) -> &str {
        &self.inner.not_after
    }

    /// DER encoding of the certificate backing this identity.
    #[must_use]
    pub fn der(&self) -> &CertificateDer<'static> {
        &self.inner.der
    }

    /// Typed attribute access.
    #[must_use]
    pub fn attribute(&self, key: AttributeKey) -> &str {
        match key {
            AttributeKey::Subject => self.subject(),
            AttributeKey::Issuer => self.issuer(),
            AttributeKey::NotBefore => self.not_before(),
            AttributeKey::NotAfter => self.not_after(),
        }
    }

    /// Attribute access by wire name. Unknown names yield `None`.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        AttributeKey::from_name(name).map(|key| self.attribute(key))
    }

    /// The four supported attribute names, independent of certificate content.
    #[must_use]
    pub fn attribute_names() -> &'static [&'static str] {
        &ATTRIBUTE_NAMES
    }
}

impl AuthData for PeerIdentity {
    fn get_attribute(&self, name: &str) -> Option<&str> {
        Self::get_attribute(self, name)
    }

    fn attribute_names(&self) -> &[&str] {
        Self::attribute_names()
    }
}

impl fmt::Debug for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerIdentity")
            .field("subject", &self.inner.subject)
            .field("issuer", &self.inner.issuer)
            .field("not_before", &self.inner.not_before)
            .field("not_after", &self.inner.not_after)
            .finish_non_exhaustive()
    }
}

fn rfc3339(ts: OffsetDateTime) -> Result<String, IdentityError> {
    ts.to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|e| IdentityError::MalformedCertificate(format!("validity out of range: {e}")))
}

/// Renders a distinguished name in RFC 4514 form: last RDN first.
fn rfc4514(name: &X509Name<'_>) -> Result<String, IdentityError> {
    let mut rdns = name
        .iter()
        .map(|rdn| {
            rdn.iter()
                .map(format_attribute)
                .collect::<Result<Vec<_>, _>>()
                .map(|attrs| attrs.join("+"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    rdns.reverse();
    Ok(rdns.join(","))
}

/// Non-string values are written as `#` and the hex of their full DER
/// encoding, tag and length included.
fn format_attribute(attr: &AttributeTypeAndValue<'_>) -> Result<String, IdentityError> {
    let oid = attr.attr_type();
    let key = oid2abbrev(oid, oid_registry()).map_or_else(|_| oid.to_id_string(), str::to_owned);
    if let Ok(value) = attr.as_str() {
        return Ok(format!("{key}={}", escape_value(value)));
    }
    let der = attr
        .attr_value()
        .to_der_vec()
        .map_err(|e| IdentityError::MalformedCertificate(format!("attribute {key}: {e}")))?;
    Ok(format!("{key}=#{}", hex::encode(der)))
}

fn escape_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.chars().enumerate() {
        if ch == '\0' {
            out.push_str("\\00");
            continue;
        }
        let special = matches!(ch, '"' | '+' | ',' | ';' | '<' | '>' | '\\')
            || (i == 0 && matches!(ch, '#' | ' '))
            || (i == last && ch == ' ');
        if special {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
