//! Experiment Configuration - one concrete point of the parameter space

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::space::builder::REPETITION_FIELD;
use crate::space::key::{KeyKind, ParameterKey};

/// One value per configuration-space key.
pub type Combination = BTreeMap<ParameterKey, Value>;

/// Experiment Configuration represents a single run of an experiment.
///
/// The `parameter` mapping is fixed at creation. Downstream generators attach
/// their own data (package paths, descriptor ids) as annotations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentConfiguration {
    run_id: u64,
    name: String,
    experiment: String,
    config_id: Option<usize>,
    parameter: Combination,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    annotations: BTreeMap<String, Value>,
}

impl ExperimentConfiguration {
    /// Create a configuration for `experiment` with the given run id.
    ///
    /// # Arguments
    ///
    /// * `run_id` - Process-wide unique run identifier
    /// * `experiment` - Name of the parent experiment
    /// * `parameter` - Resolved parameter combination
    #[must_use]
    pub fn new(run_id: u64, experiment: impl Into<String>, parameter: Combination) -> Self {
        Self::builder(run_id, experiment, parameter).build()
    }

    /// Create a builder for constructing a configuration with optional fields.
    #[must_use]
    pub fn builder(
        run_id: u64,
        experiment: impl Into<String>,
        parameter: Combination,
    ) -> ExperimentConfigurationBuilder {
        ExperimentConfigurationBuilder::new(run_id, experiment, parameter)
    }

    /// Get the run ID.
    #[must_use]
    pub const fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Get the configuration name, `<experiment>_<run_id:05>`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the parent experiment name.
    #[must_use]
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Get the config-group id shared by all repetitions of this combination.
    #[must_use]
    pub const fn config_id(&self) -> Option<usize> {
        self.config_id
    }

    /// Get the resolved parameters.
    #[must_use]
    pub const fn parameter(&self) -> &Combination {
        &self.parameter
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Look up a parameter by its textual key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.parameter.get(key)
    }

    /// Look up a parameter by its key segments.
    #[must_use]
    pub fn get_field(&self, kind: KeyKind, owner: &str, field: &str) -> Option<&Value> {
        self.parameter.get(&ParameterKey::new(kind, owner, field))
    }

    /// Repetition index of this run.
    #[must_use]
    pub fn repetition(&self) -> Option<u64> {
        self.get_field(KeyKind::Header, crate::space::key::HEADER_OWNER, REPETITION_FIELD)
            .and_then(Value::as_u64)
    }

    /// Parameters that target functions.
    pub fn function_parameters(&self) -> impl Iterator<Item = (&ParameterKey, &Value)> {
        self.parameter
            .iter()
            .filter(|(k, _)| k.kind() == KeyKind::Function)
    }

    /// Attach downstream data, returning the previous value under `key`.
    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.annotations.insert(key.into(), value.into())
    }

    /// Get downstream data attached under `key`.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&Value> {
        self.annotations.get(key)
    }

    /// All downstream annotations.
    #[must_use]
    pub const fn annotations(&self) -> &BTreeMap<String, Value> {
        &self.annotations
    }

    /// Multi-line listing of the name and all parameters.
    #[must_use]
    pub fn pretty(&self) -> String {
        let mut out = self.to_string();
        for (key, value) in &self.parameter {
            out.push_str(&format!("\n  {key}: {value}"));
        }
        out
    }
}

impl fmt::Display for ExperimentConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExperimentConfiguration({})", self.name)
    }
}

/// Builder for `ExperimentConfiguration`.
#[derive(Debug)]
pub struct ExperimentConfigurationBuilder {
    run_id: u64,
    experiment: String,
    config_id: Option<usize>,
    parameter: Combination,
    created_at: DateTime<Utc>,
}

impl ExperimentConfigurationBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(run_id: u64, experiment: impl Into<String>, parameter: Combination) -> Self {
        Self {
            run_id,
            experiment: experiment.into(),
            config_id: None,
            parameter,
            created_at: Utc::now(),
        }
    }

    /// Set the config-group id.
    #[must_use]
    pub const fn config_id(mut self, config_id: usize) -> Self {
        self.config_id = Some(config_id);
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the `ExperimentConfiguration`.
    #[must_use]
    pub fn build(self) -> ExperimentConfiguration {
        ExperimentConfiguration {
            name: format!("{}_{:05}", self.experiment, self.run_id),
            run_id: self.run_id,
            experiment: self.experiment,
            config_id: self.config_id,
            parameter: self.parameter,
            created_at: self.created_at,
            annotations: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn combination() -> Combination {
        [
            (ParameterKey::header("repetition"), json!(1)),
            (ParameterKey::function("fw", "cpu_cores"), json!(2)),
            (ParameterKey::measurement_point("mp.in", "container"), json!("A")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_name_is_zero_padded() {
        let c = ExperimentConfiguration::new(42, "throughput", combination());
        assert_eq!(c.name(), "throughput_00042");
        assert_eq!(c.to_string(), "ExperimentConfiguration(throughput_00042)");
    }

    #[test]
    fn test_lookups() {
        let c = ExperimentConfiguration::new(0, "e", combination());
        assert_eq!(c.repetition(), Some(1));
        assert_eq!(c.get("ep::function::fw::cpu_cores"), Some(&json!(2)));
        assert_eq!(
            c.get_field(KeyKind::MeasurementPoint, "mp.in", "container"),
            Some(&json!("A"))
        );
        assert_eq!(c.function_parameters().count(), 1);
    }

    #[test]
    fn test_annotations_leave_parameter_untouched() {
        let mut c = ExperimentConfiguration::new(0, "e", combination());
        let before = c.parameter().clone();
        assert!(c.annotate("project_path", "/tmp/e_00000").is_none());
        assert_eq!(c.annotation("project_path"), Some(&json!("/tmp/e_00000")));
        assert_eq!(c.parameter(), &before);
    }

    #[test]
    fn test_serialization() {
        let c = ExperimentConfiguration::builder(7, "e", combination())
            .config_id(3)
            .build();
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"ep::function::fw::cpu_cores\":2"));
        let back: ExperimentConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
