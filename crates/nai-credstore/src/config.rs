//! Resolver configuration.
//!
//! Stored as JSON next to the databases it describes. Every field has a
//! default, so an empty object `{}` is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::record::{DecodeOptions, MIN_PUBLIC_DATA_LEN};

/// Settings for a [`Resolver`](crate::Resolver).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Name of the local-identity store (log and error context only)
    pub localid_db: String,

    /// Name of the disclosure store (log and error context only)
    pub disclose_db: String,

    /// Require key locators to use the `pkcs11:` URI scheme
    pub strict_pkcs11_uri: bool,

    /// Public data floor; may raise, never lower, the built-in 20 bytes
    pub min_public_data_len: usize,
}

impl ResolverConfig {
    /// Default local-identity store name.
    pub const DEFAULT_LOCALID_DB: &'static str = "localid.db";

    /// Default disclosure store name.
    pub const DEFAULT_DISCLOSE_DB: &'static str = "disclose.db";

    /// Parse a JSON configuration; absent fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Record validation options derived from this configuration.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            strict_pkcs11_uri: self.strict_pkcs11_uri,
            min_public_data_len: self.min_public_data_len.max(MIN_PUBLIC_DATA_LEN),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            localid_db: String::from(Self::DEFAULT_LOCALID_DB),
            disclose_db: String::from(Self::DEFAULT_DISCLOSE_DB),
            strict_pkcs11_uri: false,
            min_public_data_len: MIN_PUBLIC_DATA_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = ResolverConfig::from_json("{}").unwrap();
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.localid_db, "localid.db");
        assert_eq!(config.disclose_db, "disclose.db");
    }

    #[test]
    fn test_partial_override() {
        let config =
            ResolverConfig::from_json(r#"{"strict_pkcs11_uri": true, "disclose_db": "peers.db"}"#)
                .unwrap();
        assert!(config.strict_pkcs11_uri);
        assert_eq!(config.disclose_db, "peers.db");
        assert_eq!(config.localid_db, "localid.db");
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ResolverConfig {
            min_public_data_len: 64,
            ..ResolverConfig::default()
        };
        let text = config.to_json().unwrap();
        assert_eq!(ResolverConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_json() {
        let err = ResolverConfig::from_json(r#"{"strict_pkcs11_uri": "yes"}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid resolver configuration"));
    }

    #[test]
    fn test_floor_is_clamped() {
        let config = ResolverConfig {
            min_public_data_len: 3,
            ..ResolverConfig::default()
        };
        assert_eq!(config.decode_options().min_public_data_len, MIN_PUBLIC_DATA_LEN);
    }
}
