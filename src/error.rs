use std::fmt;

/// Errors that can occur while declaring or enforcing request contracts.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A schema (or projection) was declared incorrectly
    Schema(SchemaError),
    /// A gate check rejected the request
    Violation(Violation),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Schema(e) => write!(f, "Invalid schema: {}", e),
            Error::Violation(v) => write!(f, "Request rejected: {}", v),
        }
    }
}

impl std::error::Error for Error {}

impl From<SchemaError> for Error {
    fn from(e: SchemaError) -> Self {
        Error::Schema(e)
    }
}

impl From<Violation> for Error {
    fn from(v: Violation) -> Self {
        Error::Violation(v)
    }
}

/// A programmer error in a schema declaration.
///
/// These are reported when a [`Schema`](crate::Schema) or
/// [`Constraint`](crate::Constraint) is built, never during binding.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    /// The kind of declaration error
    pub kind: SchemaErrorKind,
    /// Human-readable message explaining the error
    pub message: String,
}

impl SchemaError {
    /// Creates a new schema error.
    pub fn new(kind: SchemaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for SchemaError {}

/// The kind of schema declaration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// Two fields share a name
    DuplicateField {
        /// The repeated field name
        field: String,
    },
    /// Two fields resolve to the same lookup key in the same source
    DuplicateKey {
        /// The repeated lookup key
        key: String,
    },
    /// A constraint cannot apply to the field's type
    IncompatibleConstraint {
        /// The offending field
        field: String,
    },
    /// An enum type was declared without members
    EmptyEnum {
        /// The offending field
        field: String,
    },
    /// A `Pattern` constraint did not compile
    InvalidPattern,
    /// Nested schemas exceed the configured depth
    TooDeep {
        /// The configured maximum depth
        max_depth: usize,
    },
    /// A field combines type, source and modifiers that can never bind
    UnsupportedDeclaration {
        /// The offending field
        field: String,
    },
    /// A projection names a field the schema does not declare
    UnknownField {
        /// The unknown field name
        field: String,
    },
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateField { field } => write!(f, "Duplicate field '{}'", field),
            Self::DuplicateKey { key } => write!(f, "Duplicate lookup key '{}'", key),
            Self::IncompatibleConstraint { field } => {
                write!(f, "Incompatible constraint on '{}'", field)
            }
            Self::EmptyEnum { field } => write!(f, "Empty enum on '{}'", field),
            Self::InvalidPattern => write!(f, "Invalid pattern"),
            Self::TooDeep { max_depth } => write!(f, "Nesting deeper than {}", max_depth),
            Self::UnsupportedDeclaration { field } => {
                write!(f, "Unsupported declaration of '{}'", field)
            }
            Self::UnknownField { field } => write!(f, "Unknown field '{}'", field),
        }
    }
}

/// A gate violation with details about which check failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Violation {}

/// The kind of gate violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// A header the check depends on was absent
    MissingHeader {
        /// The header name
        name: String,
    },
    /// A header was present but carried the wrong value
    InvalidHeader {
        /// The header name
        name: String,
    },
    /// A custom check denied the request
    Denied {
        /// Name of the check that denied
        check: String,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::MissingHeader { name } => write!(f, "Missing header '{}'", name),
            ViolationKind::InvalidHeader { name } => write!(f, "Invalid header '{}'", name),
            ViolationKind::Denied { check } => write!(f, "Denied by '{}'", check),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_display_includes_kind_and_message() {
        let v = Violation::new(
            ViolationKind::InvalidHeader {
                name: "x-token".to_string(),
            },
            "X-Token header invalid",
        );

        let output = format!("{}", v);
        assert!(output.contains("Invalid header 'x-token'"));
        assert!(output.contains("X-Token header invalid"));
    }

    #[test]
    fn schema_error_converts_into_error() {
        let err: Error = SchemaError::new(
            SchemaErrorKind::DuplicateField {
                field: "q".to_string(),
            },
            "field 'q' declared twice",
        )
        .into();

        assert!(matches!(err, Error::Schema(_)));
        assert!(format!("{}", err).starts_with("Invalid schema"));
    }
}
