//! Configuration factory and the shared run-id counter
//!
//! Run ids are unique across every experiment populated from the same
//! `RunIdCounter`. Each experiment takes one contiguous block of ids with a
//! single atomic update, so experiments may be populated from several
//! threads at once. An allocation that would run past `u64::MAX` fails and
//! leaves the counter untouched.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};

use super::configuration::{Combination, ExperimentConfiguration};
use crate::config::ExpansionConfig;
use crate::space::builder::repetition_key;
use crate::{Error, Result};

/// Allocator of process-wide unique run ids, starting at 0.
#[derive(Debug, Default)]
pub struct RunIdCounter {
    next: AtomicU64,
}

impl RunIdCounter {
    /// Create a counter whose first id is 0.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a counter whose first id is `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Take a single id.
    ///
    /// # Errors
    ///
    /// Returns `Error::RunIdsExhausted` once every id has been handed out.
    pub fn next_id(&self) -> Result<u64> {
        self.allocate(1).map(|ids| ids.start)
    }

    /// Take `count` consecutive ids.
    ///
    /// # Errors
    ///
    /// Returns `Error::RunIdsExhausted` if the block would end past
    /// `u64::MAX`. No ids are consumed in that case.
    pub fn allocate(&self, count: u64) -> Result<Range<u64>> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                next.checked_add(count)
            })
            .map(|start| start..start + count)
            .map_err(|next| Error::RunIdsExhausted {
                requested: count,
                next,
            })
    }

    /// The id the next allocation will start at.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// Turns parameter combinations into `ExperimentConfiguration` records.
#[derive(Debug, Clone, Copy)]
pub struct ConfigurationFactory<'c> {
    counter: &'c RunIdCounter,
    max_experiments: Option<usize>,
    assign_config_ids: bool,
}

impl<'c> ConfigurationFactory<'c> {
    /// Create a factory drawing ids from `counter`.
    #[must_use]
    pub fn new(counter: &'c RunIdCounter, config: &ExpansionConfig) -> Self {
        Self {
            counter,
            max_experiments: config.max_experiments,
            assign_config_ids: config.assign_config_ids,
        }
    }

    /// Create one configuration per combination, in order.
    ///
    /// With `max_experiments` set, only the first N combinations are pulled
    /// from `combinations`; the rest are never materialized and consume no
    /// run ids.
    ///
    /// # Errors
    ///
    /// Returns `Error::RunIdsExhausted` if the counter has fewer ids left
    /// than there are configurations.
    pub fn instantiate<I>(
        &self,
        experiment: &str,
        combinations: I,
    ) -> Result<Vec<ExperimentConfiguration>>
    where
        I: IntoIterator<Item = Combination>,
    {
        let kept: Vec<Combination> = match self.max_experiments {
            Some(max) => combinations.into_iter().take(max).collect(),
            None => combinations.into_iter().collect(),
        };

        let group_ids = self.assign_config_ids.then(|| config_ids(&kept));
        let run_ids = self.counter.allocate(kept.len() as u64)?;

        Ok(kept
            .into_iter()
            .zip(run_ids)
            .enumerate()
            .map(|(i, (parameter, run_id))| {
                let builder = ExperimentConfiguration::builder(run_id, experiment, parameter);
                let configuration = match &group_ids {
                    Some(ids) => builder.config_id(ids[i]),
                    None => builder,
                }
                .build();
                tracing::debug!("Created: {configuration}");
                configuration
            })
            .collect())
    }
}

/// Config-group id of every combination, in first-seen order starting at 0.
///
/// Two combinations share an id exactly when they are equal after removing
/// the repetition key.
#[must_use]
pub fn config_ids(combinations: &[Combination]) -> Vec<usize> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    combinations
        .iter()
        .map(|c| {
            let next = seen.len();
            *seen.entry(canonical_form(c)).or_insert(next)
        })
        .collect()
}

/// Sorted-key JSON of a combination without its repetition key.
fn canonical_form(combination: &Combination) -> String {
    let repetition = repetition_key();
    let map: Map<String, Value> = combination
        .iter()
        .filter(|(k, _)| **k != repetition)
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    Value::Object(map).to_string()
}
