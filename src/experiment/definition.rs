//! Typed experiment definitions
//!
//! Deserializes one raw experiment mapping (as loaded from a PED document)
//! into a strongly typed definition. Missing or malformed required fields
//! fail the whole experiment instead of silently defaulting.
//!
//! Owner ids, units and field names become segments of parameter keys, so
//! they are checked here: a segment containing `::` would let two owners
//! collide on one key and could not be parsed back.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::space::key::{is_valid_segment, KeyKind, KEY_SEPARATOR, UNIT_SEPARATOR};
use crate::{Error, Result};

/// Experiment name used in errors raised before the name is known
const UNNAMED: &str = "<unnamed>";

/// Which PED list an experiment was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentKind {
    /// Declared under `service_experiments`
    #[default]
    Service,
    /// Declared under `function_experiments`
    Function,
}

/// What a parameter group targets, taken from its discriminator field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupTarget {
    /// `{function: <id>, ...}`
    Function,
    /// `{service: <id>, ...}`
    Service,
}

impl GroupTarget {
    /// Name of the discriminator field.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Service => "service",
        }
    }

    /// Key namespace used for this group's fields.
    #[must_use]
    pub const fn key_kind(self) -> KeyKind {
        match self {
            Self::Function => KeyKind::Function,
            Self::Service => KeyKind::Service,
        }
    }
}

/// One entry of `experiment_parameters`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawParameterGroup")]
pub struct ParameterGroup {
    target: GroupTarget,
    owner: String,
    unit: Option<String>,
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawParameterGroup {
    function: Option<String>,
    service: Option<String>,
    unit: Option<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl TryFrom<RawParameterGroup> for ParameterGroup {
    type Error = String;

    fn try_from(raw: RawParameterGroup) -> std::result::Result<Self, Self::Error> {
        let (target, owner) = match (raw.function, raw.service) {
            (Some(owner), None) => (GroupTarget::Function, owner),
            (None, Some(owner)) => (GroupTarget::Service, owner),
            (Some(_), Some(_)) => {
                return Err("parameter group has both 'function' and 'service'".into())
            }
            (None, None) => {
                return Err("parameter group has neither 'function' nor 'service'".into())
            }
        };
        check_owner(target.field_name(), &owner)?;
        if let Some(unit) = &raw.unit {
            check_segment("unit", unit)?;
        }
        check_fields(&raw.fields)?;
        Ok(Self {
            target,
            owner,
            unit: raw.unit,
            fields: raw.fields,
        })
    }
}

impl ParameterGroup {
    /// Target of the group.
    #[must_use]
    pub const fn target(&self) -> GroupTarget {
        self.target
    }

    /// Function or service id.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Explicit sub-unit, if the group carries a `unit` field.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Parameter fields, without the discriminator and `unit` fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// One entry of `measurement_points`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMeasurementPoint")]
pub struct MeasurementPoint {
    name: String,
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawMeasurementPoint {
    name: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl TryFrom<RawMeasurementPoint> for MeasurementPoint {
    type Error = String;

    fn try_from(raw: RawMeasurementPoint) -> std::result::Result<Self, Self::Error> {
        check_owner("measurement point name", &raw.name)?;
        check_fields(&raw.fields)?;
        Ok(Self {
            name: raw.name,
            fields: raw.fields,
        })
    }
}

impl MeasurementPoint {
    /// Measurement point name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields except `name`.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Typed form of one declarative experiment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExperimentDefinition {
    name: String,
    #[serde(skip)]
    kind: ExperimentKind,
    repetitions: u64,
    #[serde(default)]
    time_limit: Option<Number>,
    #[serde(default)]
    time_warmup: Option<Number>,
    #[serde(default, deserialize_with = "null_as_empty")]
    experiment_parameters: Vec<ParameterGroup>,
    #[serde(default, deserialize_with = "null_as_empty")]
    measurement_points: Vec<MeasurementPoint>,
}

impl ExperimentDefinition {
    /// Parse a raw experiment mapping.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingField` if `name` or `repetitions` is absent, and
    /// `Error::InvalidField` if any field has the wrong shape (including a
    /// parameter group without `function`/`service`, a measurement point
    /// without `name`, or an id or field name containing `::`).
    pub fn parse(kind: ExperimentKind, raw: &Value) -> Result<Self> {
        let Some(obj) = raw.as_object() else {
            return Err(Error::InvalidField {
                experiment: UNNAMED.into(),
                field: "<root>".into(),
                reason: format!("expected a mapping, got {raw}"),
            });
        };

        let name = match obj.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(Error::InvalidField {
                    experiment: UNNAMED.into(),
                    field: "name".into(),
                    reason: format!("expected a string, got {other}"),
                })
            }
            None => {
                return Err(Error::MissingField {
                    experiment: UNNAMED.into(),
                    field: "name".into(),
                })
            }
        };
        if !obj.contains_key("repetitions") {
            return Err(Error::MissingField {
                experiment: name,
                field: "repetitions".into(),
            });
        }

        let mut definition = Self::deserialize(raw).map_err(|e| Error::InvalidField {
            experiment: name,
            field: "<definition>".into(),
            reason: e.to_string(),
        })?;
        definition.kind = kind;
        Ok(definition)
    }

    /// Experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Which PED list the experiment came from.
    #[must_use]
    pub const fn kind(&self) -> ExperimentKind {
        self.kind
    }

    /// Number of repeated trials per distinct configuration.
    #[must_use]
    pub const fn repetitions(&self) -> u64 {
        self.repetitions
    }

    /// `time_limit`, if declared.
    #[must_use]
    pub const fn time_limit(&self) -> Option<&Number> {
        self.time_limit.as_ref()
    }

    /// `time_warmup`, if declared.
    #[must_use]
    pub const fn time_warmup(&self) -> Option<&Number> {
        self.time_warmup.as_ref()
    }

    /// Function and service parameter groups.
    #[must_use]
    pub fn experiment_parameters(&self) -> &[ParameterGroup] {
        &self.experiment_parameters
    }

    /// Measurement point groups.
    #[must_use]
    pub fn measurement_points(&self) -> &[MeasurementPoint] {
        &self.measurement_points
    }
}

/// Absent and `null` lists both mean "no entries".
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn check_segment(what: &str, segment: &str) -> std::result::Result<(), String> {
    if is_valid_segment(segment) {
        Ok(())
    } else {
        Err(format!(
            "{what} '{segment}' must be non-empty, must not contain '{KEY_SEPARATOR}' and must not start or end with ':'"
        ))
    }
}

/// Owners may carry a sub-unit as `owner/unit`; both parts must be valid.
fn check_owner(what: &str, owner: &str) -> std::result::Result<(), String> {
    match owner.split_once(UNIT_SEPARATOR) {
        Some((id, unit)) => {
            check_segment(what, id)?;
            check_segment("unit", unit)
        }
        None => check_segment(what, owner),
    }
}

fn check_fields(fields: &Map<String, Value>) -> std::result::Result<(), String> {
    fields.keys().try_for_each(|field| check_segment("field name", field))
}
