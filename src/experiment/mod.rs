//! Experiment Expansion Schema
//!
//! This module turns declarative experiment definitions into the concrete
//! configurations a benchmarking run executes.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentCatalog (1) ──< Experiment (N)
//!                              │
//!                              ├── ExperimentDefinition [read-only]
//!                              ├── ConfigurationSpace [after populate]
//!                              └──< ExperimentConfiguration (N) [run_id, config_id]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use nfv_bench::config::ExpansionConfig;
//! use nfv_bench::experiment::{Experiment, ExperimentKind, RunIdCounter};
//! use serde_json::json;
//!
//! let raw = json!({
//!     "name": "throughput",
//!     "repetitions": 2,
//!     "experiment_parameters": [{"function": "fw", "cpu_cores": [1, 2]}]
//! });
//!
//! // One counter per expansion session keeps run ids unique
//! let counter = RunIdCounter::new();
//! let mut experiment = Experiment::new(ExperimentKind::Service, &raw)?;
//! let configurations = experiment.populate(&ExpansionConfig::default(), &counter)?;
//!
//! assert_eq!(configurations.len(), 4);
//! assert_eq!(configurations[0].name(), "throughput_00000");
//! # Ok::<(), nfv_bench::Error>(())
//! ```

pub mod aggregate;
pub mod catalog;
pub mod configuration;
pub mod definition;
pub mod factory;

pub use aggregate::Experiment;
pub use catalog::ExperimentCatalog;
pub use configuration::{Combination, ExperimentConfiguration, ExperimentConfigurationBuilder};
pub use definition::{
    ExperimentDefinition, ExperimentKind, GroupTarget, MeasurementPoint, ParameterGroup,
};
pub use factory::{config_ids, ConfigurationFactory, RunIdCounter};
