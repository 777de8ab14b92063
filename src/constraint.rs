//! Declarative post-coercion constraints.

use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::error::{SchemaError, SchemaErrorKind};
use crate::field::FieldType;
use crate::value::{Number, Value};

/// A predicate a coerced value must satisfy.
///
/// Constraints are only evaluated once coercion has succeeded, and every
/// violated constraint is reported on its own.
///
/// # Examples
///
/// ```
/// use request_binder::Constraint;
///
/// let constraints = vec![
///     Constraint::MinLength(3),
///     Constraint::MaxLength(50),
///     Constraint::pattern("^fixedquery$").expect("valid regex"),
/// ];
/// assert_eq!(constraints.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Minimum length: characters for strings, items for lists
    MinLength(usize),
    /// Maximum length: characters for strings, items for lists
    MaxLength(usize),
    /// Regex the string must match (search semantics)
    Pattern(Pattern),
    /// Exclusive lower bound
    GreaterThan(Number),
    /// Inclusive lower bound
    GreaterOrEqual(Number),
    /// Exclusive upper bound
    LessThan(Number),
    /// Inclusive upper bound
    LessOrEqual(Number),
    /// Value must equal one of the listed values
    OneOf(Vec<Value>),
}

impl Constraint {
    /// Compiles a `Pattern` constraint.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the regex does not compile.
    pub fn pattern(pattern: &str) -> Result<Self, SchemaError> {
        Pattern::new(pattern).map(Constraint::Pattern)
    }

    /// Shorthand for [`Constraint::GreaterThan`].
    pub fn gt(bound: impl Into<Number>) -> Self {
        Constraint::GreaterThan(bound.into())
    }

    /// Shorthand for [`Constraint::GreaterOrEqual`].
    pub fn ge(bound: impl Into<Number>) -> Self {
        Constraint::GreaterOrEqual(bound.into())
    }

    /// Shorthand for [`Constraint::LessThan`].
    pub fn lt(bound: impl Into<Number>) -> Self {
        Constraint::LessThan(bound.into())
    }

    /// Shorthand for [`Constraint::LessOrEqual`].
    pub fn le(bound: impl Into<Number>) -> Self {
        Constraint::LessOrEqual(bound.into())
    }

    /// Shorthand for [`Constraint::OneOf`].
    pub fn one_of<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Constraint::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Returns which kind of constraint this is.
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::MinLength(_) => ConstraintKind::MinLength,
            Constraint::MaxLength(_) => ConstraintKind::MaxLength,
            Constraint::Pattern(_) => ConstraintKind::Pattern,
            Constraint::GreaterThan(_) => ConstraintKind::GreaterThan,
            Constraint::GreaterOrEqual(_) => ConstraintKind::GreaterOrEqual,
            Constraint::LessThan(_) => ConstraintKind::LessThan,
            Constraint::LessOrEqual(_) => ConstraintKind::LessOrEqual,
            Constraint::OneOf(_) => ConstraintKind::OneOf,
        }
    }

    /// Length constraints measure a list as a whole; every other
    /// constraint on a list is applied to each item.
    pub(crate) fn is_length(&self) -> bool {
        matches!(self, Constraint::MinLength(_) | Constraint::MaxLength(_))
    }

    /// Whether this constraint can be evaluated against values of `ty`.
    pub(crate) fn applies_to(&self, ty: &FieldType) -> bool {
        if let FieldType::List(item) = ty {
            return self.is_length() || self.applies_to(item);
        }

        match self {
            Constraint::MinLength(_) | Constraint::MaxLength(_) => {
                matches!(ty, FieldType::String)
            }
            Constraint::Pattern(_) => matches!(ty, FieldType::String | FieldType::Enum(_)),
            Constraint::GreaterThan(_)
            | Constraint::GreaterOrEqual(_)
            | Constraint::LessThan(_)
            | Constraint::LessOrEqual(_) => matches!(ty, FieldType::Int | FieldType::Float),
            Constraint::OneOf(_) => !matches!(ty, FieldType::Nested(_)),
        }
    }

    /// Evaluates the constraint, returning a message on violation.
    pub(crate) fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Constraint::MinLength(min) => match length_of(value) {
                Some((len, unit)) if len < *min => Err(format!(
                    "Value should have at least {} {}",
                    min,
                    plural(unit, *min)
                )),
                _ => Ok(()),
            },
            Constraint::MaxLength(max) => match length_of(value) {
                Some((len, unit)) if len > *max => Err(format!(
                    "Value should have at most {} {}",
                    max,
                    plural(unit, *max)
                )),
                _ => Ok(()),
            },
            Constraint::Pattern(pattern) => match value.as_str() {
                Some(s) if !pattern.is_match(s) => Err(format!(
                    "String should match pattern '{}'",
                    pattern.as_str()
                )),
                _ => Ok(()),
            },
            Constraint::GreaterThan(bound) => compare(value, bound, "greater than", |v, b| v > b),
            Constraint::GreaterOrEqual(bound) => {
                compare(value, bound, "greater than or equal to", |v, b| v >= b)
            }
            Constraint::LessThan(bound) => compare(value, bound, "less than", |v, b| v < b),
            Constraint::LessOrEqual(bound) => {
                compare(value, bound, "less than or equal to", |v, b| v <= b)
            }
            Constraint::OneOf(allowed) => {
                if allowed.iter().any(|a| same_value(a, value)) {
                    Ok(())
                } else {
                    let listed: Vec<String> = allowed.iter().map(|a| a.to_string()).collect();
                    Err(format!("Input should be one of {}", listed.join(", ")))
                }
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::MinLength(n) => write!(f, "min_length={}", n),
            Constraint::MaxLength(n) => write!(f, "max_length={}", n),
            Constraint::Pattern(p) => write!(f, "pattern='{}'", p.as_str()),
            Constraint::GreaterThan(n) => write!(f, "gt={}", n),
            Constraint::GreaterOrEqual(n) => write!(f, "ge={}", n),
            Constraint::LessThan(n) => write!(f, "lt={}", n),
            Constraint::LessOrEqual(n) => write!(f, "le={}", n),
            Constraint::OneOf(values) => write!(f, "one_of({} values)", values.len()),
        }
    }
}

/// Identifies a constraint in a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// [`Constraint::MinLength`]
    MinLength,
    /// [`Constraint::MaxLength`]
    MaxLength,
    /// [`Constraint::Pattern`]
    Pattern,
    /// [`Constraint::GreaterThan`]
    GreaterThan,
    /// [`Constraint::GreaterOrEqual`]
    GreaterOrEqual,
    /// [`Constraint::LessThan`]
    LessThan,
    /// [`Constraint::LessOrEqual`]
    LessOrEqual,
    /// [`Constraint::OneOf`]
    OneOf,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Pattern => "pattern",
            Self::GreaterThan => "greater_than",
            Self::GreaterOrEqual => "greater_or_equal",
            Self::LessThan => "less_than",
            Self::LessOrEqual => "less_or_equal",
            Self::OneOf => "one_of",
        };
        write!(f, "{}", name)
    }
}

/// A compiled regex, compared by its source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaErrorKind::InvalidPattern`] if the regex does not compile.
    pub fn new(pattern: &str) -> Result<Self, SchemaError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|e| {
                SchemaError::new(
                    SchemaErrorKind::InvalidPattern,
                    format!("pattern '{}' does not compile: {}", pattern, e),
                )
            })
    }

    /// Returns the source text of the pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns `true` if the pattern matches anywhere in `s`.
    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

fn length_of(value: &Value) -> Option<(usize, &'static str)> {
    match value {
        Value::String(s) => Some((s.chars().count(), "character")),
        Value::List(items) => Some((items.len(), "item")),
        _ => None,
    }
}

fn plural(unit: &str, n: usize) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}

fn compare(
    value: &Value,
    bound: &Number,
    relation: &str,
    holds: impl Fn(&Number, &Number) -> bool,
) -> Result<(), String> {
    match value.as_number() {
        Some(n) if !holds(&n, bound) => Err(format!("Input should be {} {}", relation, bound)),
        _ => Ok(()),
    }
}

// 1 and 1.0 are the same member of a OneOf set.
fn same_value(allowed: &Value, value: &Value) -> bool {
    match (allowed.as_number(), value.as_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b) == Some(std::cmp::Ordering::Equal),
        _ => allowed == value,
    }
}
