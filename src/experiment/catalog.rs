//! Experiment Catalog - all experiments declared in one PED document
//!
//! A PED (profile experiment descriptor) lists experiments under two keys:
//!
//! ```text
//! { "service_experiments":  [ {name, repetitions, ...}, ... ],
//!   "function_experiments": [ {name, repetitions, ...}, ... ] }
//! ```
//!
//! The catalog builds one `Experiment` per entry (service experiments
//! first), populates them against a shared `RunIdCounter` and indexes the
//! resulting configurations by run id.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use super::{Experiment, ExperimentConfiguration, ExperimentKind, RunIdCounter};
use crate::config::ExpansionConfig;
use crate::{Error, Result};

/// PED key listing service experiments
pub const SERVICE_EXPERIMENTS_KEY: &str = "service_experiments";

/// PED key listing function experiments
pub const FUNCTION_EXPERIMENTS_KEY: &str = "function_experiments";

/// In-memory catalog of experiments and their configurations.
///
/// ## Design
///
/// Experiments are kept in declaration order. After population, a hash map
/// from run id to (experiment index, configuration index) gives O(1)
/// configuration lookups.
#[derive(Debug, Default)]
pub struct ExperimentCatalog {
    experiments: Vec<Experiment>,
    runs: HashMap<u64, (usize, usize)>,
}

impl ExperimentCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an (unpopulated) catalog from a parsed PED document.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not a mapping, if an experiment list
    /// is malformed, if an experiment definition is invalid, or if two
    /// experiments share a name.
    pub fn from_ped(ped: &Value) -> Result<Self> {
        let Some(doc) = ped.as_object() else {
            return Err(Error::Other(format!("PED document must be a mapping, got {ped}")));
        };

        let mut catalog = Self::new();
        for (key, kind) in [
            (SERVICE_EXPERIMENTS_KEY, ExperimentKind::Service),
            (FUNCTION_EXPERIMENTS_KEY, ExperimentKind::Function),
        ] {
            let entries = match doc.get(key) {
                None | Some(Value::Null) => continue,
                Some(Value::Array(entries)) => entries,
                Some(other) => {
                    return Err(Error::Other(format!("'{key}' must be a list, got {other}")))
                }
            };
            for raw in entries {
                catalog.add_experiment(Experiment::new(kind, raw)?)?;
            }
        }
        tracing::info!("Loaded PED with {} experiments", catalog.experiment_count());
        Ok(catalog)
    }

    /// Load and parse a PED document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON, or is not
    /// a valid PED document.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let ped: Value = serde_json::from_str(&contents)?;
        tracing::info!("Loaded PED file {:?}", path.as_ref());
        Self::from_ped(&ped)
    }

    /// Add an experiment.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidField` if an experiment with the same name
    /// already exists.
    pub fn add_experiment(&mut self, experiment: Experiment) -> Result<()> {
        if self.get_experiment(experiment.name()).is_some() {
            return Err(Error::InvalidField {
                experiment: experiment.name().to_string(),
                field: "name".into(),
                reason: "experiment names must be unique".into(),
            });
        }
        self.experiments.push(experiment);
        self.reindex();
        Ok(())
    }

    /// Populate every unpopulated experiment in declaration order.
    ///
    /// Returns the number of configurations created by this call.
    ///
    /// # Errors
    ///
    /// Returns the first population error; experiments before it stay
    /// populated.
    pub fn populate(&mut self, config: &ExpansionConfig, counter: &RunIdCounter) -> Result<usize> {
        let mut created = 0;
        let result = self
            .experiments
            .iter_mut()
            .filter(|e| !e.is_populated())
            .try_for_each(|e| {
                created += e.populate(config, counter)?.len();
                Ok::<(), Error>(())
            });
        self.reindex();
        result.map(|()| created)
    }

    /// Populate every unpopulated experiment concurrently.
    ///
    /// Run ids stay unique, but which experiment receives which id block
    /// depends on scheduling.
    ///
    /// # Errors
    ///
    /// Returns a population error if any experiment fails.
    #[cfg(feature = "rayon")]
    pub fn populate_parallel(
        &mut self,
        config: &ExpansionConfig,
        counter: &RunIdCounter,
    ) -> Result<usize> {
        use rayon::prelude::*;

        let result = self
            .experiments
            .par_iter_mut()
            .filter(|e| !e.is_populated())
            .map(|e| e.populate(config, counter).map(<[_]>::len))
            .try_reduce(|| 0, |a, b| Ok(a + b));
        self.reindex();
        result
    }

    fn reindex(&mut self) {
        self.runs = self
            .experiments
            .iter()
            .enumerate()
            .flat_map(|(e, experiment)| {
                experiment
                    .configurations()
                    .iter()
                    .enumerate()
                    .map(move |(c, configuration)| (configuration.run_id(), (e, c)))
            })
            .collect();
    }

    /// Check if the catalog holds no experiments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Get the number of experiments.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Get the number of configurations across all experiments.
    #[must_use]
    pub fn configuration_count(&self) -> usize {
        self.runs.len()
    }

    /// All experiments in declaration order.
    #[must_use]
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Experiments declared under `service_experiments`.
    pub fn service_experiments(&self) -> impl Iterator<Item = &Experiment> {
        self.experiments
            .iter()
            .filter(|e| e.kind() == ExperimentKind::Service)
    }

    /// Experiments declared under `function_experiments`.
    pub fn function_experiments(&self) -> impl Iterator<Item = &Experiment> {
        self.experiments
            .iter()
            .filter(|e| e.kind() == ExperimentKind::Function)
    }

    /// Get an experiment by name.
    #[must_use]
    pub fn get_experiment(&self, name: &str) -> Option<&Experiment> {
        self.experiments.iter().find(|e| e.name() == name)
    }

    /// Get a configuration by run id.
    #[must_use]
    pub fn get_configuration(&self, run_id: u64) -> Option<&ExperimentConfiguration> {
        let &(e, c) = self.runs.get(&run_id)?;
        self.experiments[e].configurations().get(c)
    }

    /// All configurations, experiment by experiment.
    pub fn configurations(&self) -> impl Iterator<Item = &ExperimentConfiguration> {
        self.experiments.iter().flat_map(Experiment::configurations)
    }
}
