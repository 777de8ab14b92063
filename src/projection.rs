//! Response shaping: field subsets and renames over bound values.

use std::collections::HashSet;

use crate::error::{SchemaError, SchemaErrorKind};
use crate::outcome::Bound;
use crate::schema::Schema;

/// A view over a schema's fields, for shaping what leaves a handler.
///
/// A projection with no `include` keeps every field; `exclude` then drops
/// fields, and `rename` changes the output name of the fields that remain.
/// Output order always follows the source order.
///
/// # Examples
///
/// ```
/// use request_binder::{bind, FieldSpec, FieldType, Projection, RawRequest, Schema, Source};
///
/// let user_in = Schema::new([
///     FieldSpec::new("username", Source::Form, FieldType::String),
///     FieldSpec::new("password", Source::Form, FieldType::String),
/// ])
/// .unwrap();
/// let user_out = Projection::new().exclude("password");
/// user_out.validate(&user_in).expect("known fields");
///
/// let mut request = RawRequest::new("req-1");
/// request.add_form_field("username", "johndoe");
/// request.add_form_field("password", "secret");
///
/// let bound = bind(&user_in, &request).unwrap();
/// assert_eq!(user_out.apply(&bound).names(), vec!["username"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    include: Option<Vec<String>>,
    exclude: Vec<String>,
    renames: Vec<(String, String)>,
}

impl Projection {
    /// Creates a projection that keeps every field unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps `name`. Once any field is included, unlisted fields are dropped.
    pub fn include(mut self, name: impl Into<String>) -> Self {
        self.include.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    /// Drops `name`.
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclude.push(name.into());
        self
    }

    /// Outputs the field `from` under the name `to`.
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.push((from.into(), to.into()));
        self
    }

    /// Checks that every referenced field exists in `schema` and that the
    /// projected names are distinct.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaErrorKind::UnknownField`] or
    /// [`SchemaErrorKind::DuplicateField`].
    pub fn validate(&self, schema: &Schema) -> Result<(), SchemaError> {
        let referenced = self
            .include
            .iter()
            .flatten()
            .chain(&self.exclude)
            .chain(self.renames.iter().map(|(from, _)| from));

        for name in referenced {
            if schema.field(name).is_none() {
                return Err(SchemaError::new(
                    SchemaErrorKind::UnknownField {
                        field: name.clone(),
                    },
                    format!("projection references undeclared field '{}'", name),
                ));
            }
        }

        let mut seen = HashSet::new();
        for field in schema.fields().iter().filter(|f| self.keeps(f.name())) {
            let output = self.output_name(field.name());
            if !seen.insert(output) {
                return Err(SchemaError::new(
                    SchemaErrorKind::DuplicateField {
                        field: output.to_string(),
                    },
                    format!("projection produces '{}' more than once", output),
                ));
            }
        }

        Ok(())
    }

    /// Applies the projection to a bound mapping.
    ///
    /// Names the mapping does not contain are ignored.
    pub fn apply(&self, bound: &Bound) -> Bound {
        let mut out = Bound::new();
        for (name, value) in bound.iter().filter(|(name, _)| self.keeps(name)) {
            out.insert(self.output_name(name), value.clone());
        }
        out
    }

    /// Derives the projected schema.
    ///
    /// Renamed fields keep their lookup keys, so the derived schema reads
    /// the same request keys as the original.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`validate`](Self::validate).
    pub fn schema(&self, schema: &Schema) -> Result<Schema, SchemaError> {
        self.validate(schema)?;

        let fields = schema
            .fields()
            .iter()
            .filter(|f| self.keeps(f.name()))
            .map(|f| match self.renamed_to(f.name()) {
                Some(to) => f.renamed(to),
                None => f.clone(),
            });

        let builder = Schema::builder().fields(fields);
        if schema.forbids_extra() {
            builder.forbid_extra().build()
        } else {
            builder.build()
        }
    }

    fn keeps(&self, name: &str) -> bool {
        let included = match &self.include {
            Some(include) => include.iter().any(|n| n == name),
            None => true,
        };
        included && !self.exclude.iter().any(|n| n == name)
    }

    fn renamed_to(&self, name: &str) -> Option<&str> {
        self.renames
            .iter()
            .rev()
            .find(|(from, _)| from == name)
            .map(|(_, to)| to.as_str())
    }

    fn output_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.renamed_to(name).unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldSpec, FieldType, Source};
    use crate::value::Value;

    fn user_in() -> Schema {
        Schema::new([
            FieldSpec::new("username", Source::Body, FieldType::String),
            FieldSpec::new("password", Source::Body, FieldType::String),
            FieldSpec::new("email", Source::Body, FieldType::String),
            FieldSpec::new("full_name", Source::Body, FieldType::String).optional(),
        ])
        .unwrap()
    }

    fn bound_user() -> Bound {
        let mut bound = Bound::new();
        bound.insert("username", Value::from("johndoe"));
        bound.insert("password", Value::from("secret"));
        bound.insert("email", Value::from("john@example.com"));
        bound.insert("full_name", Value::Null);
        bound
    }

    #[test]
    fn exclude_drops_fields() {
        let out = Projection::new().exclude("password").apply(&bound_user());
        assert_eq!(out.names(), vec!["username", "email", "full_name"]);
    }

    #[test]
    fn include_keeps_source_order() {
        let out = Projection::new()
            .include("email")
            .include("username")
            .apply(&bound_user());
        assert_eq!(out.names(), vec!["username", "email"]);
    }

    #[test]
    fn rename_changes_output_name() {
        let out = Projection::new()
            .include("full_name")
            .rename("full_name", "display_name")
            .apply(&bound_user());

        assert_eq!(out.names(), vec!["display_name"]);
        assert_eq!(out.get("display_name"), Some(&Value::Null));
    }

    #[test]
    fn validate_rejects_unknown_fields() {
        let err = Projection::new()
            .exclude("passwrd")
            .validate(&user_in())
            .unwrap_err();

        assert_eq!(
            err.kind,
            SchemaErrorKind::UnknownField {
                field: "passwrd".to_string()
            }
        );
    }

    #[test]
    fn validate_rejects_colliding_renames() {
        let err = Projection::new()
            .rename("full_name", "email")
            .validate(&user_in())
            .unwrap_err();

        assert!(matches!(err.kind, SchemaErrorKind::DuplicateField { .. }));
    }

    #[test]
    fn projected_schema_keeps_lookup_keys() {
        let schema = Projection::new()
            .exclude("password")
            .rename("full_name", "display_name")
            .schema(&user_in())
            .unwrap();

        assert_eq!(schema.len(), 3);
        let display = schema.field("display_name").unwrap();
        assert_eq!(display.lookup_key(), "full_name");
        assert!(!display.is_required());
    }
}
