//! Experiment - root entity owning a definition and its configurations

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::configuration::ExperimentConfiguration;
use super::definition::{ExperimentDefinition, ExperimentKind, GroupTarget};
use super::factory::{ConfigurationFactory, RunIdCounter};
use crate::config::ExpansionConfig;
use crate::space::builder::{ConfigurationSpace, SpaceBuilder};
use crate::space::product::{combination_count, product_iter};
use crate::{Error, Result};

/// Measurement point field holding one-time setup commands
pub const MP_CONFIGURATION_FIELD: &str = "configuration";

/// Experiment represents one declared parameter study.
///
/// Created unpopulated from its raw definition. `populate` expands the
/// definition exactly once into a configuration space and the list of
/// configurations to run.
#[derive(Debug, Clone)]
pub struct Experiment {
    definition: ExperimentDefinition,
    original: Arc<Value>,
    population: Option<Population>,
}

#[derive(Debug, Clone)]
struct Population {
    configuration_space: ConfigurationSpace,
    configurations: Vec<ExperimentConfiguration>,
    populated_at: DateTime<Utc>,
}

impl Experiment {
    /// Create an experiment from its raw declarative mapping.
    ///
    /// The raw mapping is copied and kept as a read-only snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or malformed.
    pub fn new(kind: ExperimentKind, raw: &Value) -> Result<Self> {
        let definition = ExperimentDefinition::parse(kind, raw)?;
        tracing::debug!(
            "Created {kind:?} experiment '{}'",
            definition.name()
        );
        Ok(Self {
            definition,
            original: Arc::new(raw.clone()),
            population: None,
        })
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Get the experiment kind.
    #[must_use]
    pub const fn kind(&self) -> ExperimentKind {
        self.definition.kind()
    }

    /// Get the typed definition.
    #[must_use]
    pub const fn definition(&self) -> &ExperimentDefinition {
        &self.definition
    }

    /// Get the untouched raw definition this experiment was created from.
    #[must_use]
    pub fn original_definition(&self) -> &Value {
        &self.original
    }

    /// Whether `populate` has run.
    #[must_use]
    pub const fn is_populated(&self) -> bool {
        self.population.is_some()
    }

    /// Expand the definition into configurations.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyPopulated` on a second call, and
    /// `Error::KeyCollision` under the strict collision policy.
    /// Returns `Error::SpaceTooLarge` if the number of combinations
    /// overflows and no `max_experiments` is set, and
    /// `Error::RunIdsExhausted` if `counter` has run out of ids. A failed
    /// call leaves the experiment unpopulated.
    pub fn populate(
        &mut self,
        config: &ExpansionConfig,
        counter: &RunIdCounter,
    ) -> Result<&[ExperimentConfiguration]> {
        if self.population.is_some() {
            return Err(Error::AlreadyPopulated(self.name().to_string()));
        }

        let configuration_space = SpaceBuilder::new(config).build(&self.definition)?;
        let total = combination_count(&configuration_space);
        if total.is_none() && config.max_experiments.is_none() {
            return Err(Error::SpaceTooLarge(self.name().to_string()));
        }
        let configurations = ConfigurationFactory::new(counter, config)
            .instantiate(self.name(), product_iter(&configuration_space))?;

        if let Some(max) = config.max_experiments {
            match total {
                Some(total) if total > configurations.len() => tracing::info!(
                    "Truncated '{}' to {} of {total} configurations (max_experiments={max})",
                    self.name(),
                    configurations.len()
                ),
                None => tracing::info!(
                    "Truncated '{}' to {} configurations (max_experiments={max}), full space size overflows",
                    self.name(),
                    configurations.len()
                ),
                Some(_) => {}
            }
        }
        if configurations.is_empty() {
            tracing::warn!(
                "Experiment '{}' generated zero configurations, check for empty parameter lists",
                self.name()
            );
        }
        tracing::info!(
            "Populated experiment '{}' with {} configurations to be executed.",
            self.name(),
            configurations.len()
        );

        let population = self.population.insert(Population {
            configuration_space,
            configurations,
            populated_at: Utc::now(),
        });
        Ok(&population.configurations)
    }

    /// Get the flat configuration space.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotPopulated` before `populate` has run.
    pub fn configuration_space(&self) -> Result<&ConfigurationSpace> {
        self.population
            .as_ref()
            .map(|p| &p.configuration_space)
            .ok_or_else(|| Error::NotPopulated(self.name().to_string()))
    }

    /// Get the configurations to run, empty before `populate`.
    #[must_use]
    pub fn configurations(&self) -> &[ExperimentConfiguration] {
        self.population
            .as_ref()
            .map(|p| p.configurations.as_slice())
            .unwrap_or_default()
    }

    /// Mutable access for attaching downstream annotations.
    pub fn configurations_mut(&mut self) -> &mut [ExperimentConfiguration] {
        self.population
            .as_mut()
            .map(|p| p.configurations.as_mut_slice())
            .unwrap_or_default()
    }

    /// Get the population timestamp.
    #[must_use]
    pub fn populated_at(&self) -> Option<DateTime<Utc>> {
        self.population.as_ref().map(|p| p.populated_at)
    }

    /// One-time setup commands per measurement point.
    ///
    /// ```text
    /// {"mp.input": ["ip a", "ifconfig"], "mp.output": ["ip r"]}
    /// ```
    #[must_use]
    pub fn pre_configuration(&self) -> BTreeMap<String, Vec<Value>> {
        let commands: BTreeMap<String, Vec<Value>> = self
            .definition
            .measurement_points()
            .iter()
            .filter_map(|mp| {
                let commands = match mp.fields().get(MP_CONFIGURATION_FIELD)? {
                    Value::Null => return None,
                    Value::Array(commands) => commands.clone(),
                    command => vec![command.clone()],
                };
                Some((mp.name().to_string(), commands))
            })
            .collect();
        tracing::debug!("pre-configuration commands: {commands:?}");
        commands
    }

    /// Names of functions that have parameters assigned, skipping names that
    /// contain `without`.
    #[must_use]
    pub fn function_names(&self, without: Option<&str>) -> Vec<&str> {
        self.definition
            .experiment_parameters()
            .iter()
            .filter(|g| g.target() == GroupTarget::Function)
            .map(super::definition::ParameterGroup::owner)
            .filter(|name| without.map_or(true, |w| !name.contains(w)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw() -> Value {
        json!({
            "name": "e",
            "repetitions": 2,
            "experiment_parameters": [
                {"function": "fw", "cpu_cores": [1, 2]},
                {"function": "mp.agent", "cpu_cores": 1}
            ],
            "measurement_points": [
                {"name": "mp.in", "container": "iperf", "configuration": "ip a"},
                {"name": "mp.out", "container": "iperf"}
            ]
        })
    }

    #[test]
    fn test_populate_once() {
        let counter = RunIdCounter::new();
        let config = ExpansionConfig::default();
        let mut e = Experiment::new(ExperimentKind::Service, &raw()).unwrap();
        assert!(!e.is_populated());
        assert!(e.configuration_space().is_err());

        let n = e.populate(&config, &counter).unwrap().len();
        assert_eq!(n, 4);
        assert!(e.is_populated());
        assert!(e.populated_at().is_some());

        let err = e.populate(&config, &counter).unwrap_err();
        assert!(matches!(err, Error::AlreadyPopulated(_)));
        assert_eq!(counter.peek(), 4, "second call must not consume ids");
    }

    #[test]
    fn test_original_definition_preserved() {
        let raw = raw();
        let e = Experiment::new(ExperimentKind::Service, &raw).unwrap();
        assert_eq!(e.original_definition(), &raw);
    }

    #[test]
    fn test_pre_configuration() {
        let e = Experiment::new(ExperimentKind::Service, &raw()).unwrap();
        let pre = e.pre_configuration();
        assert_eq!(pre.len(), 1);
        assert_eq!(pre["mp.in"], vec![json!("ip a")]);
    }

    #[test]
    fn test_function_names() {
        let e = Experiment::new(ExperimentKind::Function, &raw()).unwrap();
        assert_eq!(e.function_names(None), vec!["fw", "mp.agent"]);
        assert_eq!(e.function_names(Some("mp.")), vec!["fw"]);
    }

    #[test]
    fn test_annotate_through_experiment() {
        let counter = RunIdCounter::new();
        let mut e = Experiment::new(ExperimentKind::Service, &raw()).unwrap();
        e.populate(&ExpansionConfig::default(), &counter).unwrap();
        for c in e.configurations_mut() {
            c.annotate("package_path", format!("/tmp/{}.tgo", c.name()));
        }
        assert!(e.configurations().iter().all(|c| c.annotation("package_path").is_some()));
    }

    /// 30 fields with 10 values each: 10^30 combinations
    fn huge() -> Value {
        let fields: serde_json::Map<String, Value> = (0..30)
            .map(|i| (format!("p{i:02}"), json!((0..10).collect::<Vec<u32>>())))
            .collect();
        let mut group = json!({"function": "fw"});
        group.as_object_mut().unwrap().extend(fields);
        json!({"name": "huge", "repetitions": 1, "experiment_parameters": [group]})
    }

    #[test]
    fn test_overflowing_space_needs_max_experiments() {
        let counter = RunIdCounter::new();
        let mut e = Experiment::new(ExperimentKind::Service, &huge()).unwrap();

        let err = e.populate(&ExpansionConfig::default(), &counter).unwrap_err();
        assert!(matches!(err, Error::SpaceTooLarge(ref name) if name == "huge"));
        assert!(!e.is_populated());
        assert_eq!(counter.peek(), 0);

        let config = ExpansionConfig::builder().max_experiments(5).build();
        assert_eq!(e.populate(&config, &counter).unwrap().len(), 5);
        assert_eq!(counter.peek(), 5);
    }

    #[test]
    fn test_populate_fails_when_run_ids_run_out() {
        let counter = RunIdCounter::starting_at(u64::MAX - 2);
        let mut e = Experiment::new(ExperimentKind::Service, &raw()).unwrap();
        let err = e.populate(&ExpansionConfig::default(), &counter).unwrap_err();
        assert!(matches!(err, Error::RunIdsExhausted { requested: 4, .. }));
        assert!(!e.is_populated());
        assert_eq!(counter.peek(), u64::MAX - 2);
    }
}
