//! What a binding pass produces: a bound mapping or a list of field errors.

use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::json;

use crate::constraint::ConstraintKind;
use crate::field::Source;
use crate::value::Value;

/// Outcome of one binding pass.
pub type BindingResult = Result<Bound, BindErrors>;

/// An ordered mapping from field name to bound value.
///
/// Entries appear in schema declaration order. A successful binding
/// contains exactly one entry per declared field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bound {
    entries: Vec<(String, Value)>,
}

impl Bound {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns `true` if `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the bound names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Converts the mapping to a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(n, v)| (n.clone(), serde_json::Value::from(v)))
                .collect(),
        )
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }
}

impl Serialize for Bound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Why a field failed to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// A required field was absent
    Missing,
    /// A value was present but could not be coerced to the declared type
    TypeError,
    /// A coerced value violated a declared constraint
    ConstraintViolation {
        /// Which constraint was violated
        constraint: ConstraintKind,
    },
    /// A key not declared by a schema that forbids extra keys
    Unexpected,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::TypeError => write!(f, "type error"),
            Self::ConstraintViolation { constraint } => {
                write!(f, "constraint violation ({})", constraint)
            }
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

impl FieldErrorKind {
    /// Returns a stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::TypeError => "type_error",
            Self::ConstraintViolation { .. } => "constraint_violation",
            Self::Unexpected => "unexpected",
        }
    }
}

/// Location of a value inside a request, one segment per level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FieldPath(Vec<String>);

impl FieldPath {
    pub(crate) fn root() -> Self {
        Self::default()
    }

    pub(crate) fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    fn dotted(&self) -> String {
        self.0.join(".")
    }
}

/// A single field-level binding error.
///
/// `path` is the field name, prefixed by parent field names for nested
/// values and suffixed by the index for list items (`item.tags.1`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field
    pub path: String,
    /// Source the field was read from
    pub source: Source,
    /// Classification of the error
    #[serde(flatten)]
    pub kind: FieldErrorKind,
    /// Human-readable message
    pub message: String,
    #[serde(skip)]
    segments: Vec<String>,
}

impl FieldError {
    /// Creates a new field error.
    ///
    /// The location segments are taken from splitting `path` on `.`.
    pub fn new(
        path: impl Into<String>,
        source: Source,
        kind: FieldErrorKind,
        message: impl Into<String>,
    ) -> Self {
        let path = path.into();
        Self {
            segments: path.split('.').map(str::to_string).collect(),
            path,
            source,
            kind,
            message: message.into(),
        }
    }

    /// Creates an error whose segments are kept verbatim, so keys
    /// containing `.` stay one location segment.
    pub(crate) fn at(
        path: &FieldPath,
        source: Source,
        kind: FieldErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.dotted(),
            source,
            kind,
            message: message.into(),
            segments: path.0.clone(),
        }
    }

    pub(crate) fn missing(path: &FieldPath, source: Source) -> Self {
        Self::at(path, source, FieldErrorKind::Missing, "Field required")
    }

    /// Returns the violated constraint, for constraint violations.
    pub fn constraint(&self) -> Option<ConstraintKind> {
        match self.kind {
            FieldErrorKind::ConstraintViolation { constraint } => Some(constraint),
            _ => None,
        }
    }

    /// Returns the location as `[source, path segments...]`.
    pub fn loc(&self) -> Vec<String> {
        std::iter::once(self.source.to_string())
            .chain(self.segments.iter().cloned())
            .collect()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} [{}]",
            self.source, self.path, self.message, self.kind
        )
    }
}

/// Every error found in one binding pass, in field declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BindErrors {
    errors: Vec<FieldError>,
}

impl BindErrors {
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the errors as a slice.
    pub fn as_slice(&self) -> &[FieldError] {
        &self.errors
    }

    /// Iterates errors in order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    /// Returns the errors reported for `path`.
    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a FieldError> {
        self.errors.iter().filter(move |e| e.path == path)
    }

    /// Renders a `{"detail": [...]}` document for a rejection response.
    pub fn to_json(&self) -> serde_json::Value {
        let detail: Vec<serde_json::Value> = self
            .errors
            .iter()
            .map(|e| {
                let mut entry = json!({
                    "loc": e.loc(),
                    "type": e.kind.code(),
                    "msg": e.message,
                });
                if let (Some(c), Some(obj)) = (e.constraint(), entry.as_object_mut()) {
                    obj.insert("constraint".to_string(), json!(c));
                }
                entry
            })
            .collect();
        json!({ "detail": detail })
    }
}

impl fmt::Display for BindErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for BindErrors {}

impl<'a> IntoIterator for &'a BindErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
