//! Registry configuration.
//!
//! Configuration is plain data passed to the store and the resolver; nothing
//! is read from the environment. All sections default, so an empty JSON
//! object is a valid configuration.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{find_preference, AuthorityPreference};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub validator: ValidatorConfig,
    pub resolver: ResolverConfig,
}

impl RegistryConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.resolver.default_authorities.is_empty() {
            return Err(ConfigError::Invalid(
                "resolver.default_authorities must not be empty".to_string(),
            ));
        }
        for pref in &self.resolver.authority_preferences {
            if pref.allowed_authorities.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "authority preference {} -> {} has no allowed authorities",
                    pref.source_authority, pref.target_authority
                )));
            }
        }
        if self.resolver.max_candidates == Some(0) {
            return Err(ConfigError::Invalid(
                "resolver.max_candidates must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validator settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Authorities whose non-deprecated records may reference deprecated
    /// records.
    pub deprecation_exempt_authorities: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            deprecation_exempt_authorities: vec!["ESRI".to_string()],
        }
    }
}

impl ValidatorConfig {
    /// Returns true if records of `authority` skip deprecated-reference rules.
    pub fn is_deprecation_exempt(&self, authority: &str) -> bool {
        self.deprecation_exempt_authorities
            .iter()
            .any(|a| a == authority)
    }
}

/// Resolver settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Authority ranking used when no preference matches a request.
    pub default_authorities: Vec<String>,
    /// Preferences consulted after the ones stored in the snapshot.
    pub authority_preferences: Vec<AuthorityPreference>,
    /// Default candidate budget for a single resolver call.
    pub max_candidates: Option<usize>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_authorities: vec!["EPSG".to_string(), "PROJ".to_string()],
            authority_preferences: Vec::new(),
            max_candidates: None,
        }
    }
}

impl ResolverConfig {
    /// Finds the configured preference for an authority pair, trying exact
    /// matches before wildcards.
    pub fn preference_for(&self, source: &str, target: &str) -> Option<&[String]> {
        find_preference(&self.authority_preferences, source, target)
    }
}
