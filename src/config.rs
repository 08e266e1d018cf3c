//! Expansion configuration
//!
//! Knobs controlling how experiment definitions are expanded. Every field has
//! a default, so a configuration file only needs to name what it changes:
//!
//! ```json
//! { "max_experiments": 10, "collision_policy": "error" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Warmup time used when an experiment does not declare `time_warmup`
pub const DEFAULT_TIME_WARMUP: f64 = 10.0;

/// Time limit used when an experiment does not declare `time_limit`
pub const DEFAULT_TIME_LIMIT: f64 = 0.0;

/// Measurement point fields consumed by downstream generators, not expanded
pub const DEFAULT_EXCLUDED_MP_FIELDS: [&str; 2] = ["connection_point", "configuration"];

/// What to do when two parameter groups produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Last write wins, with a warning
    #[default]
    Warn,
    /// Abort building the configuration space
    Error,
}

/// Configuration of the expansion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Keep only the first N configurations of each experiment
    pub max_experiments: Option<usize>,
    /// Key collision handling
    pub collision_policy: CollisionPolicy,
    /// Group configurations that differ only in their repetition
    pub assign_config_ids: bool,
    /// Fallback for `time_warmup`
    pub default_time_warmup: f64,
    /// Fallback for `time_limit`
    pub default_time_limit: f64,
    /// Measurement point fields that are not part of the configuration space
    pub excluded_mp_fields: Vec<String>,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_experiments: None,
            collision_policy: CollisionPolicy::default(),
            assign_config_ids: true,
            default_time_warmup: DEFAULT_TIME_WARMUP,
            default_time_limit: DEFAULT_TIME_LIMIT,
            excluded_mp_fields: DEFAULT_EXCLUDED_MP_FIELDS.map(String::from).to_vec(),
        }
    }
}

impl ExpansionConfig {
    /// Create a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> ExpansionConfigBuilder {
        ExpansionConfigBuilder::default()
    }

    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid JSON.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded expansion config from {:?}: {config:?}", path.as_ref());
        Ok(config)
    }
}

/// Builder for `ExpansionConfig`.
#[derive(Debug, Default)]
pub struct ExpansionConfigBuilder {
    config: ExpansionConfig,
}

impl ExpansionConfigBuilder {
    /// Truncate every experiment to at most `max` configurations.
    #[must_use]
    pub const fn max_experiments(mut self, max: usize) -> Self {
        self.config.max_experiments = Some(max);
        self
    }

    /// Set the key collision policy.
    #[must_use]
    pub const fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.config.collision_policy = policy;
        self
    }

    /// Enable or disable config-id assignment.
    #[must_use]
    pub const fn assign_config_ids(mut self, enabled: bool) -> Self {
        self.config.assign_config_ids = enabled;
        self
    }

    /// Set the fallback warmup time.
    #[must_use]
    pub const fn default_time_warmup(mut self, seconds: f64) -> Self {
        self.config.default_time_warmup = seconds;
        self
    }

    /// Set the fallback time limit.
    #[must_use]
    pub const fn default_time_limit(mut self, seconds: f64) -> Self {
        self.config.default_time_limit = seconds;
        self
    }

    /// Replace the list of measurement point fields that are not expanded.
    #[must_use]
    pub fn excluded_mp_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.excluded_mp_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ExpansionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExpansionConfig::default();
        assert!(config.max_experiments.is_none());
        assert_eq!(config.collision_policy, CollisionPolicy::Warn);
        assert!(config.assign_config_ids);
        assert_eq!(config.excluded_mp_fields, vec!["connection_point", "configuration"]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ExpansionConfig =
            serde_json::from_str(r#"{"max_experiments": 3, "collision_policy": "error"}"#).unwrap();
        assert_eq!(config.max_experiments, Some(3));
        assert_eq!(config.collision_policy, CollisionPolicy::Error);
        assert!((config.default_time_warmup - DEFAULT_TIME_WARMUP).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_chain() {
        let config = ExpansionConfig::builder()
            .max_experiments(5)
            .assign_config_ids(false)
            .excluded_mp_fields(["configuration"])
            .build();
        assert_eq!(config.max_experiments, Some(5));
        assert!(!config.assign_config_ids);
        assert_eq!(config.excluded_mp_fields, vec!["configuration"]);
    }
}
