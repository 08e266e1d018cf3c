//! Parameter keys - namespaced names of configuration-space dimensions
//!
//! Textual format (kept stable for downstream generators):
//!
//! ```text
//! ep::<kind>::<owner>[/<unit>]::<field>
//!
//! ep::header::all::repetition
//! ep::function::fw-vnf::cpu_cores
//! ep::function::fw-vnf/vdu01::mem_max
//! ep::mp::mp.input::container
//! ```
//!
//! A `ParameterKey` is parsed (or built) once and caches its text. Equality,
//! hashing and ordering all use that text, so a `BTreeMap<ParameterKey, _>`
//! iterates in plain lexicographic key order.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Leading segment of every key
pub const KEY_PREFIX: &str = "ep";

/// Separator between key segments
pub const KEY_SEPARATOR: &str = "::";

/// Separator between owner and sub-unit inside the owner segment
pub const UNIT_SEPARATOR: char = '/';

/// Owner segment used by all header keys
pub const HEADER_OWNER: &str = "all";

/// Whether `segment` can be used as an owner, unit or field name.
///
/// Segments must be non-empty, must not contain `::` and must not start or
/// end with `:`. Otherwise two different owner/field pairs could produce the
/// same key text (`fw:` + `cpu` and `fw` + `:cpu` both give `fw:::cpu`).
#[must_use]
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.contains(KEY_SEPARATOR)
        && !segment.starts_with(':')
        && !segment.ends_with(':')
}

/// Which parameter group a key originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyKind {
    /// Experiment-wide header fields (`repetition`, `time_limit`, ...)
    Header,
    /// Parameter group targeting a single network function
    Function,
    /// Parameter group targeting the whole service
    Service,
    /// Measurement point fields
    MeasurementPoint,
}

impl KeyKind {
    /// Segment used for this kind in the textual key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Function => "function",
            Self::Service => "service",
            Self::MeasurementPoint => "mp",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "header" => Some(Self::Header),
            "function" => Some(Self::Function),
            "service" => Some(Self::Service),
            "mp" => Some(Self::MeasurementPoint),
            _ => None,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured, namespaced name of one configuration-space dimension.
#[derive(Debug, Clone)]
pub struct ParameterKey {
    kind: KeyKind,
    owner: String,
    unit: Option<String>,
    field: String,
    text: String,
}

impl ParameterKey {
    /// Create a key. An owner of the form `owner/unit` is split into its
    /// owner and sub-unit parts.
    ///
    /// Segments are not checked here; callers building keys from user input
    /// validate them with [`is_valid_segment`] first.
    #[must_use]
    pub fn new(kind: KeyKind, owner: impl Into<String>, field: impl Into<String>) -> Self {
        let owner = owner.into();
        let (owner, unit) = match owner.split_once(UNIT_SEPARATOR) {
            Some((owner, unit)) => (owner.to_string(), Some(unit.to_string())),
            None => (owner, None),
        };
        Self::from_parts(kind, owner, unit, field.into())
    }

    /// Header key, owned by `all`.
    #[must_use]
    pub fn header(field: impl Into<String>) -> Self {
        Self::new(KeyKind::Header, HEADER_OWNER, field)
    }

    /// Function parameter key.
    #[must_use]
    pub fn function(owner: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(KeyKind::Function, owner, field)
    }

    /// Service parameter key.
    #[must_use]
    pub fn service(owner: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(KeyKind::Service, owner, field)
    }

    /// Measurement point key.
    #[must_use]
    pub fn measurement_point(owner: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(KeyKind::MeasurementPoint, owner, field)
    }

    /// Replace the sub-unit of this key.
    #[must_use]
    pub fn with_unit(self, unit: impl Into<String>) -> Self {
        Self::from_parts(self.kind, self.owner, Some(unit.into()), self.field)
    }

    fn from_parts(kind: KeyKind, owner: String, unit: Option<String>, field: String) -> Self {
        let owner_segment = match &unit {
            Some(unit) => format!("{owner}{UNIT_SEPARATOR}{unit}"),
            None => owner.clone(),
        };
        let text = [KEY_PREFIX, kind.as_str(), &owner_segment, &field].join(KEY_SEPARATOR);
        Self {
            kind,
            owner,
            unit,
            field,
            text,
        }
    }

    /// Parse a key, logging and returning `None` if it is malformed.
    ///
    /// Downstream consumers that walk a configuration's parameters use this
    /// and skip keys they cannot interpret.
    #[must_use]
    pub fn parse_lenient(text: &str) -> Option<Self> {
        match text.parse() {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!("Couldn't parse parameter key '{text}': {e}");
                None
            }
        }
    }

    /// Group this key belongs to.
    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Owner id (function, service or measurement point name; `all` for headers).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Sub-unit within the owner, if any.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Textual form of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for ParameterKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<&str> = s.split(KEY_SEPARATOR).collect();
        let [prefix, kind, owner, field] = segments.as_slice() else {
            return Err(Error::InvalidParameterKey(format!(
                "'{s}' has {} segments, expected 4",
                segments.len()
            )));
        };
        if *prefix != KEY_PREFIX {
            return Err(Error::InvalidParameterKey(format!(
                "'{s}' does not start with '{KEY_PREFIX}'"
            )));
        }
        let kind = KeyKind::from_segment(kind).ok_or_else(|| {
            Error::InvalidParameterKey(format!("'{s}' has unknown kind '{kind}'"))
        })?;
        if owner.is_empty() || field.is_empty() {
            return Err(Error::InvalidParameterKey(format!(
                "'{s}' has an empty owner or field"
            )));
        }
        Ok(Self::new(kind, *owner, *field))
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq for ParameterKey {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for ParameterKey {}

impl Hash for ParameterKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialOrd for ParameterKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParameterKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text.cmp(&other.text)
    }
}

impl Borrow<str> for ParameterKey {
    fn borrow(&self) -> &str {
        &self.text
    }
}

impl Serialize for ParameterKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for ParameterKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_key_text() {
        let key = ParameterKey::header("repetition");
        assert_eq!(key.as_str(), "ep::header::all::repetition");
        assert_eq!(key.kind(), KeyKind::Header);
        assert_eq!(key.owner(), "all");
    }

    #[test]
    fn test_unit_split_from_owner() {
        let key = ParameterKey::function("fw/vdu01", "cpu_cores");
        assert_eq!(key.owner(), "fw");
        assert_eq!(key.unit(), Some("vdu01"));
        assert_eq!(key.as_str(), "ep::function::fw/vdu01::cpu_cores");
        assert_eq!(key, ParameterKey::function("fw", "cpu_cores").with_unit("vdu01"));
    }

    #[test]
    fn test_parse_valid() {
        let key: ParameterKey = "ep::mp::mp.input::container".parse().unwrap();
        assert_eq!(key.kind(), KeyKind::MeasurementPoint);
        assert_eq!(key.owner(), "mp.input");
        assert_eq!(key.field(), "container");
        assert!(key.unit().is_none());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("ep::function::fw".parse::<ParameterKey>().is_err());
        assert!("xx::function::fw::cpu".parse::<ParameterKey>().is_err());
        assert!("ep::vm::fw::cpu".parse::<ParameterKey>().is_err());
        assert!("ep::function::::cpu".parse::<ParameterKey>().is_err());
        assert!(ParameterKey::parse_lenient("garbage").is_none());
    }

    #[test]
    fn test_segment_validation() {
        assert!(is_valid_segment("fw-vnf.1"));
        assert!(is_valid_segment("opt:x"));
        assert!(!is_valid_segment(""));
        assert!(!is_valid_segment("opt::x"));
        assert!(!is_valid_segment("fw:"));
        assert!(!is_valid_segment(":cpu"));

        // every accepted owner/field pair parses back to itself
        for (owner, field) in [("fw-vnf.1", "opt:x"), ("a:b", "c"), ("a", "b:c")] {
            let key = ParameterKey::function(owner, field);
            assert_eq!(key.owner(), owner);
            assert_eq!(key.as_str().parse::<ParameterKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_ordering_is_textual() {
        let a = ParameterKey::function("b", "x");
        let b = ParameterKey::header("repetition");
        assert!(a < b, "function < header lexicographically");
    }

    #[test]
    fn test_serde_as_string() {
        let key = ParameterKey::service("ns1", "bandwidth");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"ep::service::ns1::bandwidth\"");
        let back: ParameterKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
