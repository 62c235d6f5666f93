//! Configuration management for RustStack services.
//!
//! All configuration is driven by environment variables, matching LocalStack conventions.

use crate::types::{AccountId, AwsRegion};

/// Global configuration for the RustStack dispatch layer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RustStackConfig {
    /// Host name used when building request URLs for backend handlers.
    pub hostname: String,
    /// Default AWS region; also the preferred partition when resolving backends.
    pub default_region: AwsRegion,
    /// Default AWS account; the preferred partition when resolving backends.
    pub default_account: AccountId,
    /// Fallback tracing filter directive when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for RustStackConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost.localstack.cloud".to_owned(),
            default_region: AwsRegion::default(),
            default_account: AccountId::default(),
            log_level: "info".to_owned(),
        }
    }
}

impl RustStackConfig {
    /// Load configuration from environment variables.
    ///
    /// An invalid `DEFAULT_ACCOUNT_ID` is ignored with a warning and the
    /// default account is kept.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("LOCALSTACK_HOSTNAME") {
            config.hostname = v;
        }
        if let Some(v) = lookup("DEFAULT_REGION") {
            config.default_region = AwsRegion::new(v);
        }
        if let Some(v) = lookup("DEFAULT_ACCOUNT_ID") {
            match AccountId::new(v) {
                Ok(account) => config.default_account = account,
                Err(e) => tracing::warn!(error = %e, "ignoring DEFAULT_ACCOUNT_ID"),
            }
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}
