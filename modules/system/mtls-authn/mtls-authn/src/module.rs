//! Factory and lifecycle of the mTLS `AuthN` extension.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::rest::MtlsAuthLayer;
use crate::config::MtlsAuthConfig;
use crate::domain::MtlsAuthenticator;

pub const DEFAULT_COMPONENT_TYPE: &str = "mtlsauth";

const MAX_COMPONENT_TYPE_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentTypeError {
    #[error("component type must not be empty")]
    Empty,
    #[error("component type '{0}' is longer than 63 characters")]
    TooLong(String),
    #[error("component type '{0}' must start with a letter and contain only letters, digits or '_'")]
    InvalidCharacters(String),
}

/// Registration identifier of the extension in the host's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentType(Cow<'static, str>);

impl ComponentType {
    /// # Errors
    ///
    /// Returns [`ComponentTypeError`] unless `name` is an ASCII letter followed
    /// by at most 62 ASCII letters, digits or underscores.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Result<Self, ComponentTypeError> {
        let name = name.into();
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(ComponentTypeError::Empty);
        };
        if name.len() > MAX_COMPONENT_TYPE_LEN {
            return Err(ComponentTypeError::TooLong(name.into_owned()));
        }
        if !first.is_ascii_alphabetic() || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ComponentTypeError::InvalidCharacters(name.into_owned()));
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ComponentType {
    fn default() -> Self {
        Self(Cow::Borrowed(DEFAULT_COMPONENT_TYPE))
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ComponentType {
    type Err = ComponentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

/// Maturity of a component as advertised to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StabilityLevel {
    Development,
    Alpha,
    Beta,
    Stable,
    Deprecated,
}

impl fmt::Display for StabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::Stable => "stable",
            Self::Deprecated => "deprecated",
        })
    }
}

/// Start/stop hooks driven by the host.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the component cannot start serving.
    async fn start(&self) -> anyhow::Result<()>;

    /// # Errors
    ///
    /// Returns an error if resources could not be released.
    async fn shutdown(&self) -> anyhow::Result<()>;
}

/// Builds [`MtlsAuthExtension`] instances registered under one component type.
#[derive(Debug, Clone, Default)]
pub struct MtlsAuthFactory {
    component_type: ComponentType,
}

impl MtlsAuthFactory {
    /// Factory registered as `mtlsauth`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory registered under a custom identifier.
    #[must_use]
    pub fn with_type(component_type: ComponentType) -> Self {
        Self { component_type }
    }

    #[must_use]
    pub fn component_type(&self) -> &ComponentType {
        &self.component_type
    }

    #[must_use]
    #[allow(clippy::unused_self)] // Same for every registered type
    pub const fn stability(&self) -> StabilityLevel {
        StabilityLevel::Alpha
    }

    #[must_use]
    #[allow(clippy::unused_self)] // Same for every registered type
    pub fn default_config(&self) -> MtlsAuthConfig {
        MtlsAuthConfig::default()
    }

    #[must_use]
    pub fn create(&self, config: &MtlsAuthConfig) -> MtlsAuthExtension {
        info!(
            component_type = %self.component_type,
            require_cert = config.require_cert,
            "Creating mtls authenticator"
        );
        MtlsAuthExtension {
            component_type: self.component_type.clone(),
            authenticator: MtlsAuthenticator::from_config(config),
        }
    }

    /// Creates an extension from an untyped configuration section.
    ///
    /// # Errors
    ///
    /// Fails if `raw` does not deserialize into [`MtlsAuthConfig`].
    pub fn create_from_value(&self, raw: serde_json::Value) -> anyhow::Result<MtlsAuthExtension> {
        let config: MtlsAuthConfig = serde_json::from_value(raw)
            .with_context(|| format!("invalid configuration for '{}'", self.component_type))?;
        Ok(self.create(&config))
    }
}

/// A configured authenticator ready to be installed on servers.
#[derive(Debug, Clone)]
pub struct MtlsAuthExtension {
    component_type: ComponentType,
    authenticator: MtlsAuthenticator,
}

impl MtlsAuthExtension {
    #[must_use]
    pub fn component_type(&self) -> &ComponentType {
        &self.component_type
    }

    #[must_use]
    pub const fn authenticator(&self) -> MtlsAuthenticator {
        self.authenticator
    }

    /// gRPC interceptor, see [`tonic::service::Interceptor`].
    #[must_use]
    pub const fn interceptor(&self) -> MtlsAuthenticator {
        self.authenticator
    }

    #[must_use]
    pub const fn http_layer(&self) -> MtlsAuthLayer {
        self.authenticator.layer()
    }
}

#[async_trait]
impl Lifecycle for MtlsAuthExtension {
    async fn start(&self) -> anyhow::Result<()> {
        info!(component_type = %self.component_type, "mtls authenticator started");
        Ok(())
    }

    async fn shutdown(&self) -> anyhow::Result<()> {
        debug!(component_type = %self.component_type, "mtls authenticator stopped");
        Ok(())
    }
}
