//! Configuration for the mTLS `AuthN` module.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Environment variable prefix, e.g. `MTLSAUTH_REQUIRE_CERT=false`.
pub const ENV_PREFIX: &str = "MTLSAUTH_";

/// Configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MtlsAuthConfig {
    /// Reject calls that present no client certificate.
    ///
    /// When false such calls proceed without an identity attached.
    pub require_cert: bool,
}

impl Default for MtlsAuthConfig {
    fn default() -> Self {
        Self {
            require_cert: true,
        }
    }
}

impl MtlsAuthConfig {
    /// Loads configuration: defaults, then the YAML file at `path` if given,
    /// then `MTLSAUTH_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, a value has the wrong
    /// type, or an unknown key is present. Any other `MTLSAUTH_*` variable in
    /// the environment counts as an unknown key.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX)).extract()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_requires_certificate() {
        assert!(MtlsAuthConfig::default().require_cert);
    }

    #[test]
    fn empty_object_uses_defaults() {
        let cfg: MtlsAuthConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg, MtlsAuthConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<MtlsAuthConfig, _> =
            serde_json::from_value(serde_json::json!({ "require_certs": false }));
        assert!(result.is_err());
    }

    #[test]
    fn load_without_sources_returns_defaults() {
        figment::Jail::expect_with(|_jail| {
            let cfg = MtlsAuthConfig::load(None)?;
            assert_eq!(cfg, MtlsAuthConfig::default());
            Ok(())
        });
    }

    #[test]
    fn load_reads_yaml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("mtlsauth.yaml", "require_cert: false")?;
            let cfg = MtlsAuthConfig::load(Some(Path::new("mtlsauth.yaml")))?;
            assert!(!cfg.require_cert);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("mtlsauth.yaml", "require_cert: false")?;
            jail.set_env("MTLSAUTH_REQUIRE_CERT", "true");
            let cfg = MtlsAuthConfig::load(Some(Path::new("mtlsauth.yaml")))?;
            assert!(cfg.require_cert);
            Ok(())
        });
    }

    #[test]
    fn load_rejects_unknown_keys() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("mtlsauth.yaml", "require_cert: true\nclient_ca_file: ca.pem")?;
            assert!(MtlsAuthConfig::load(Some(Path::new("mtlsauth.yaml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn load_rejects_stray_environment_variable() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MTLSAUTH_CLIENT_CA_FILE", "ca.pem");
            let err = MtlsAuthConfig::load(None).unwrap_err();
            assert!(err.to_string().contains("client_ca_file"));
            Ok(())
        });
    }
}
