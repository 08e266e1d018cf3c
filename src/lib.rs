//! # nfv-bench: Experiment Parameter-Space Expansion
//!
//! **Version**: 0.1.0
//!
//! nfv-bench turns declarative NFV benchmarking experiments (repetitions,
//! per-function and per-service resource parameters, measurement-point
//! settings) into the flat list of concrete configurations to execute.
//!
//! ## Design Principles
//!
//! - **Namespaced keys**: every parameter lives under
//!   `ep::<kind>::<owner>::<field>`, so equal field names on different
//!   functions never clash
//! - **Deterministic order**: the Cartesian product is taken over sorted
//!   keys, the last key varying fastest
//! - **Unique run ids**: one `RunIdCounter` per session, injected by the caller
//! - **Bounded output**: `max_experiments` truncates lazily without
//!   materializing the full space
//!
//! ## Example Usage
//!
//! ```rust
//! use nfv_bench::config::ExpansionConfig;
//! use nfv_bench::experiment::{ExperimentCatalog, RunIdCounter};
//! use serde_json::json;
//!
//! let ped = json!({
//!     "service_experiments": [{
//!         "name": "latency",
//!         "repetitions": 1,
//!         "experiment_parameters": [
//!             {"function": "fw", "cpu_bw": {"min": 0.1, "max": 0.3, "step": 0.1}}
//!         ]
//!     }]
//! });
//!
//! let mut catalog = ExperimentCatalog::from_ped(&ped)?;
//! let config = ExpansionConfig::builder().max_experiments(100).build();
//! let created = catalog.populate(&config, &RunIdCounter::new())?;
//!
//! assert_eq!(created, 3);
//! for c in catalog.configurations() {
//!     println!("{} {:?}", c.name(), c.get("ep::function::fw::cpu_bw"));
//! }
//! # Ok::<(), nfv_bench::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod experiment;
pub mod space;

pub use error::{Error, Result};
