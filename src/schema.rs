use std::collections::HashSet;

use crate::error::{SchemaError, SchemaErrorKind};
use crate::field::{FieldSpec, Source};

/// Construction-time limits for schemas.
///
/// # Examples
///
/// ```
/// use request_binder::{FieldSpec, FieldType, Schema, SchemaLimits, Source};
///
/// let schema = Schema::builder()
///     .limits(SchemaLimits { max_depth: 4 })
///     .field(FieldSpec::new("q", Source::Query, FieldType::String).optional())
///     .build()
///     .expect("valid schema");
/// assert_eq!(schema.depth(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaLimits {
    /// Maximum nesting depth; a flat schema has depth 1
    pub max_depth: usize,
}

impl Default for SchemaLimits {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

/// An immutable, validated, ordered set of field declarations.
///
/// `Schema` can only be obtained through [`SchemaBuilder::build`] (or the
/// [`Schema::new`] shorthand), which rejects duplicate names, colliding
/// lookup keys, empty enums, constraints that cannot apply to their
/// field's type, and nesting deeper than [`SchemaLimits::max_depth`].
///
/// Nested schemas are owned (behind `Arc`), so a schema can never contain
/// itself.
///
/// # Examples
///
/// ```
/// use request_binder::{Constraint, FieldSpec, FieldType, Schema, Source};
///
/// let schema = Schema::new([
///     FieldSpec::new("item_id", Source::Path, FieldType::Int)
///         .constraints([Constraint::ge(0), Constraint::le(1000)]),
///     FieldSpec::new("q", Source::Query, FieldType::String).optional(),
/// ])
/// .expect("valid schema");
///
/// assert_eq!(schema.len(), 2);
/// assert!(schema.field("item_id").is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    forbid_extra: bool,
    depth: usize,
}

impl Schema {
    /// Starts building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Builds a schema from fields with default limits.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the declaration is malformed.
    pub fn new(fields: impl IntoIterator<Item = FieldSpec>) -> Result<Self, SchemaError> {
        Self::builder().fields(fields).build()
    }

    /// Returns the fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Returns `true` if undeclared keys are reported as errors.
    pub fn forbids_extra(&self) -> bool {
        self.forbid_extra
    }

    /// Returns the nesting depth; a schema without nested fields has depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
    forbid_extra: bool,
    limits: SchemaLimits,
}

impl SchemaBuilder {
    /// Creates an empty builder with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends several fields, preserving their order.
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Reports keys the schema does not declare as errors when it is bound
    /// as a parameter model or a JSON object.
    pub fn forbid_extra(mut self) -> Self {
        self.forbid_extra = true;
        self
    }

    /// Overrides the construction limits.
    pub fn limits(mut self, limits: SchemaLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Validates the declaration and produces an immutable [`Schema`].
    ///
    /// # Errors
    ///
    /// Returns the first declaration problem found, in field order.
    pub fn build(self) -> Result<Schema, SchemaError> {
        match self.validate() {
            Ok(depth) => Ok(Schema {
                fields: self.fields,
                forbid_extra: self.forbid_extra,
                depth,
            }),
            Err(err) => {
                tracing::debug!(kind = %err.kind, "rejected schema declaration");
                Err(err)
            }
        }
    }

    /// Checks every field and returns the resulting depth.
    fn validate(&self) -> Result<usize, SchemaError> {
        let mut names = HashSet::new();
        let mut keys: HashSet<(Source, String)> = HashSet::new();
        let mut depth = 1;

        for field in &self.fields {
            if !names.insert(field.name()) {
                return Err(SchemaError::new(
                    SchemaErrorKind::DuplicateField {
                        field: field.name().to_string(),
                    },
                    format!("field '{}' is declared more than once", field.name()),
                ));
            }

            if field.source() != Source::Body && field.ty().has_list_of_models() {
                return Err(SchemaError::new(
                    SchemaErrorKind::UnsupportedDeclaration {
                        field: field.name().to_string(),
                    },
                    format!(
                        "field '{}' reads a list of models from {}, which only carries text",
                        field.name(),
                        field.source()
                    ),
                ));
            }

            if field.is_parameter_model(field.source()) && !field.is_required() {
                return Err(SchemaError::new(
                    SchemaErrorKind::UnsupportedDeclaration {
                        field: field.name().to_string(),
                    },
                    format!(
                        "parameter model '{}' cannot be optional or carry a default",
                        field.name()
                    ),
                ));
            }

            // Parameter models read the whole bag, so they own no single key.
            if !field.is_parameter_model(field.source()) {
                let key = if field.is_whole_body() {
                    String::new()
                } else {
                    field.lookup_key()
                };
                if !keys.insert((field.source(), key.clone())) {
                    return Err(SchemaError::new(
                        SchemaErrorKind::DuplicateKey { key: key.clone() },
                        format!(
                            "field '{}' reads {} key '{}' already read by another field",
                            field.name(),
                            field.source(),
                            key
                        ),
                    ));
                }
            }

            if field.ty().has_empty_enum() {
                return Err(SchemaError::new(
                    SchemaErrorKind::EmptyEnum {
                        field: field.name().to_string(),
                    },
                    format!("field '{}' declares an enum without members", field.name()),
                ));
            }

            if let Some(c) = field
                .constraint_list()
                .iter()
                .find(|c| !c.applies_to(field.ty()))
            {
                return Err(SchemaError::new(
                    SchemaErrorKind::IncompatibleConstraint {
                        field: field.name().to_string(),
                    },
                    format!(
                        "constraint {} cannot apply to {} field '{}'",
                        c,
                        field.ty().type_name(),
                        field.name()
                    ),
                ));
            }

            depth = depth.max(1 + field.ty().depth());
        }

        if depth > self.limits.max_depth {
            return Err(SchemaError::new(
                SchemaErrorKind::TooDeep {
                    max_depth: self.limits.max_depth,
                },
                format!(
                    "schema nests {} levels, limit is {}",
                    depth, self.limits.max_depth
                ),
            ));
        }

        Ok(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use crate::field::FieldType;
    use crate::value::Value;

    fn image_schema() -> Schema {
        Schema::new([
            FieldSpec::new("url", Source::Body, FieldType::String),
            FieldSpec::new("name", Source::Body, FieldType::String),
        ])
        .expect("valid schema")
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Schema::new([
            FieldSpec::new("q", Source::Query, FieldType::String),
            FieldSpec::new("q", Source::Header, FieldType::String),
        ])
        .unwrap_err();

        assert_eq!(
            err.kind,
            SchemaErrorKind::DuplicateField {
                field: "q".to_string()
            }
        );
    }

    #[test]
    fn rejects_alias_collisions_within_a_source() {
        let err = Schema::new([
            FieldSpec::new("q", Source::Query, FieldType::String).alias("item-query"),
            FieldSpec::new("item-query", Source::Query, FieldType::String),
        ])
        .unwrap_err();

        assert!(matches!(err.kind, SchemaErrorKind::DuplicateKey { .. }));
    }

    #[test]
    fn same_key_in_different_sources_is_allowed() {
        let schema = Schema::new([
            FieldSpec::new("q", Source::Query, FieldType::String),
            FieldSpec::new("last_query", Source::Cookie, FieldType::String).alias("q"),
        ]);

        assert!(schema.is_ok());
    }

    #[test]
    fn header_keys_collide_case_insensitively() {
        let err = Schema::new([
            FieldSpec::new("token", Source::Header, FieldType::String).alias("X-Token"),
            FieldSpec::new("x_token", Source::Header, FieldType::String),
        ])
        .unwrap_err();

        assert!(matches!(err.kind, SchemaErrorKind::DuplicateKey { .. }));
    }

    #[test]
    fn rejects_incompatible_constraints() {
        let err = Schema::new([FieldSpec::new("item_id", Source::Path, FieldType::Int)
            .constraint(Constraint::pattern("^[0-9]+$").unwrap())])
        .unwrap_err();

        assert!(matches!(
            err.kind,
            SchemaErrorKind::IncompatibleConstraint { .. }
        ));
    }

    #[test]
    fn rejects_empty_enum() {
        let err = Schema::new([FieldSpec::new(
            "model_name",
            Source::Path,
            FieldType::enumeration(Vec::<String>::new()),
        )])
        .unwrap_err();

        assert!(matches!(err.kind, SchemaErrorKind::EmptyEnum { .. }));
    }

    #[test]
    fn depth_counts_nested_levels() {
        let item = Schema::new([
            FieldSpec::new("name", Source::Body, FieldType::String),
            FieldSpec::new("image", Source::Body, FieldType::nested(image_schema())).optional(),
        ])
        .unwrap();

        assert_eq!(image_schema().depth(), 1);
        assert_eq!(item.depth(), 2);
    }

    #[test]
    fn rejects_nesting_beyond_limit() {
        let item = FieldSpec::new("image", Source::Body, FieldType::nested(image_schema()));
        let err = Schema::builder()
            .limits(SchemaLimits { max_depth: 1 })
            .field(item)
            .build()
            .unwrap_err();

        assert_eq!(err.kind, SchemaErrorKind::TooDeep { max_depth: 1 });
    }

    #[test]
    fn parameter_models_do_not_claim_keys() {
        let filter = Schema::new([
            FieldSpec::new("limit", Source::Query, FieldType::Int).default(100),
            FieldSpec::new("offset", Source::Query, FieldType::Int).default(0),
        ])
        .unwrap();

        let schema = Schema::new([
            FieldSpec::new("filter", Source::Query, FieldType::nested(filter)),
            FieldSpec::new("q", Source::Query, FieldType::String).optional(),
        ]);

        assert!(schema.is_ok());
    }

    #[test]
    fn rejects_lists_of_models_on_text_sources() {
        let err = Schema::new([FieldSpec::new(
            "images",
            Source::Query,
            FieldType::list(FieldType::nested(image_schema())),
        )])
        .unwrap_err();
        assert!(matches!(
            err.kind,
            SchemaErrorKind::UnsupportedDeclaration { .. }
        ));

        let body = Schema::new([FieldSpec::new(
            "images",
            Source::Body,
            FieldType::list(FieldType::nested(image_schema())),
        )]);
        assert!(body.is_ok());
    }

    #[test]
    fn rejects_optional_parameter_models() {
        let filter = Schema::new([
            FieldSpec::new("limit", Source::Query, FieldType::Int).default(100),
        ])
        .unwrap();

        for field in [
            FieldSpec::new("filter", Source::Query, FieldType::nested(filter.clone())).optional(),
            FieldSpec::new("filter", Source::Query, FieldType::nested(filter.clone()))
                .default(Value::Null),
        ] {
            let err = Schema::new([field]).unwrap_err();
            assert!(matches!(
                err.kind,
                SchemaErrorKind::UnsupportedDeclaration { .. }
            ));
        }
    }

    #[test]
    fn forbid_extra_is_recorded() {
        let schema = Schema::builder()
            .field(FieldSpec::new("username", Source::Form, FieldType::String))
            .forbid_extra()
            .build()
            .unwrap();

        assert!(schema.forbids_extra());
    }
}
