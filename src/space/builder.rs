//! Parameter space builder
//!
//! Flattens an experiment definition into one mapping from namespaced
//! parameter key to candidate values:
//!
//! ```text
//! ep::header::all::repetition     → [0, 1, ..., repetitions-1]
//! ep::header::all::time_limit     → [time_limit]
//! ep::header::all::time_warmup    → [time_warmup]
//! ep::function::<fn>::<field>     → expand(field)
//! ep::service::<ns>::<field>      → expand(field)
//! ep::mp::<mp>::<field>           → expand(field)
//! ```
//!
//! Every value in the result is a list, ready for the Cartesian product.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use super::expand::expand;
use super::key::ParameterKey;
use crate::config::{CollisionPolicy, ExpansionConfig};
use crate::experiment::definition::ExperimentDefinition;
use crate::{Error, Result};

/// Header field holding the repetition counter
pub const REPETITION_FIELD: &str = "repetition";

/// Header field holding the time limit
pub const TIME_LIMIT_FIELD: &str = "time_limit";

/// Header field holding the warmup time
pub const TIME_WARMUP_FIELD: &str = "time_warmup";

/// Flat mapping from parameter key to candidate values.
pub type ConfigurationSpace = BTreeMap<ParameterKey, Vec<Value>>;

/// Key of the repetition counter.
#[must_use]
pub fn repetition_key() -> ParameterKey {
    ParameterKey::header(REPETITION_FIELD)
}

/// Builds the configuration space of an experiment definition.
#[derive(Debug, Clone)]
pub struct SpaceBuilder {
    collision_policy: CollisionPolicy,
    excluded_mp_fields: Vec<String>,
    default_time_limit: f64,
    default_time_warmup: f64,
}

impl Default for SpaceBuilder {
    fn default() -> Self {
        Self::new(&ExpansionConfig::default())
    }
}

impl SpaceBuilder {
    /// Create a builder from the expansion configuration.
    #[must_use]
    pub fn new(config: &ExpansionConfig) -> Self {
        Self {
            collision_policy: config.collision_policy,
            excluded_mp_fields: config.excluded_mp_fields.clone(),
            default_time_limit: config.default_time_limit,
            default_time_warmup: config.default_time_warmup,
        }
    }

    /// Build the flat configuration space.
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyCollision` if two groups produce the same key and
    /// the collision policy is `CollisionPolicy::Error`.
    pub fn build(&self, definition: &ExperimentDefinition) -> Result<ConfigurationSpace> {
        let mut space = ConfigurationSpace::new();
        self.add_header_space(&mut space, definition)?;
        self.add_mp_space(&mut space, definition)?;
        self.add_parameter_space(&mut space, definition)?;
        tracing::debug!(
            "Configuration space of '{}': {} dimensions",
            definition.name(),
            space.len()
        );
        Ok(space)
    }

    fn add_header_space(
        &self,
        space: &mut ConfigurationSpace,
        definition: &ExperimentDefinition,
    ) -> Result<()> {
        let repetitions = (0..definition.repetitions()).map(Value::from).collect();
        self.insert(space, repetition_key(), repetitions)?;

        let time_limit = definition
            .time_limit()
            .map_or_else(|| number_value(self.default_time_limit), |n| Value::Number(n.clone()));
        self.insert(space, ParameterKey::header(TIME_LIMIT_FIELD), vec![time_limit])?;

        let time_warmup = definition
            .time_warmup()
            .map_or_else(|| number_value(self.default_time_warmup), |n| Value::Number(n.clone()));
        self.insert(space, ParameterKey::header(TIME_WARMUP_FIELD), vec![time_warmup])
    }

    fn add_parameter_space(
        &self,
        space: &mut ConfigurationSpace,
        definition: &ExperimentDefinition,
    ) -> Result<()> {
        for group in definition.experiment_parameters() {
            for (field, value) in group.fields() {
                let mut key = ParameterKey::new(group.target().key_kind(), group.owner(), field);
                if let Some(unit) = group.unit() {
                    key = key.with_unit(unit);
                }
                self.insert(space, key, expand(value).into_values())?;
            }
        }
        Ok(())
    }

    fn add_mp_space(
        &self,
        space: &mut ConfigurationSpace,
        definition: &ExperimentDefinition,
    ) -> Result<()> {
        for mp in definition.measurement_points() {
            for (field, value) in mp.fields() {
                if self.excluded_mp_fields.iter().any(|f| f == field) {
                    continue;
                }
                let key = ParameterKey::measurement_point(mp.name(), field);
                self.insert(space, key, expand(value).into_values())?;
            }
        }
        Ok(())
    }

    fn insert(
        &self,
        space: &mut ConfigurationSpace,
        key: ParameterKey,
        values: Vec<Value>,
    ) -> Result<()> {
        if space.contains_key(&key) {
            match self.collision_policy {
                CollisionPolicy::Warn => {
                    tracing::warn!("Parameter key '{key}' defined twice, keeping the last value");
                }
                CollisionPolicy::Error => return Err(Error::KeyCollision(key.to_string())),
            }
        }
        space.insert(key, values);
        Ok(())
    }
}

/// JSON number for `x`, as an integer if `x` has no fractional part.
#[allow(clippy::cast_possible_truncation)]
fn number_value(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < 9.0e15 {
        Value::Number(Number::from(x as i64))
    } else {
        Number::from_f64(x).map_or(Value::Null, Value::Number)
    }
}
