//! Field declarations: where a value comes from, what type it has, and
//! which rules it must satisfy.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::constraint::Constraint;
use crate::schema::Schema;
use crate::value::Value;

/// The part of a request a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Router-extracted path segment
    Path,
    /// Query string parameter
    Query,
    /// Request header (names compared case-insensitively)
    Header,
    /// Cookie
    Cookie,
    /// Form field
    Form,
    /// JSON body
    Body,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::Path => "path",
            Source::Query => "query",
            Source::Header => "header",
            Source::Cookie => "cookie",
            Source::Form => "form",
            Source::Body => "body",
        };
        write!(f, "{}", name)
    }
}

/// The declared type a raw value is coerced to.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Signed 64-bit integer, strict decimal
    Int,
    /// Finite 64-bit float
    Float,
    /// Boolean from a fixed literal set
    Bool,
    /// Unmodified string
    String,
    /// String restricted to the listed members
    Enum(Vec<String>),
    /// Repeated values or a JSON array
    List(Box<FieldType>),
    /// A nested schema: a JSON object, or a parameter model on a non-body source
    ///
    /// A parameter model is always bound against the whole source bag, so
    /// it must be declared required and without a default.
    Nested(Arc<Schema>),
}

impl FieldType {
    /// Declares an enum over the given members.
    pub fn enumeration<S: Into<String>>(members: impl IntoIterator<Item = S>) -> Self {
        FieldType::Enum(members.into_iter().map(Into::into).collect())
    }

    /// Declares a list of `item`.
    pub fn list(item: FieldType) -> Self {
        FieldType::List(Box::new(item))
    }

    /// Declares a nested schema.
    pub fn nested(schema: impl Into<Arc<Schema>>) -> Self {
        FieldType::Nested(schema.into())
    }

    /// Returns a short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Int => "integer",
            FieldType::Float => "float",
            FieldType::Bool => "boolean",
            FieldType::String => "string",
            FieldType::Enum(_) => "enum",
            FieldType::List(_) => "list",
            FieldType::Nested(_) => "object",
        }
    }

    /// Nesting depth contributed by this type (0 for scalars).
    pub(crate) fn depth(&self) -> usize {
        match self {
            FieldType::List(item) => item.depth(),
            FieldType::Nested(schema) => schema.depth(),
            _ => 0,
        }
    }

    /// Whether a list somewhere in this type holds nested models.
    pub(crate) fn has_list_of_models(&self) -> bool {
        match self {
            FieldType::List(item) => {
                matches!(**item, FieldType::Nested(_)) || item.has_list_of_models()
            }
            _ => false,
        }
    }

    pub(crate) fn has_empty_enum(&self) -> bool {
        match self {
            FieldType::Enum(members) => members.is_empty(),
            FieldType::List(item) => item.has_empty_enum(),
            _ => false,
        }
    }
}

/// Declaration of a single bound field.
///
/// A field built with [`FieldSpec::new`] is required. Calling
/// [`optional`](Self::optional) or [`default`](Self::default) makes it
/// optional; a required field never carries a default.
///
/// # Examples
///
/// ```
/// use request_binder::{Constraint, FieldSpec, FieldType, Source};
///
/// let q = FieldSpec::new("q", Source::Query, FieldType::String)
///     .alias("item-query")
///     .optional()
///     .constraint(Constraint::MinLength(3));
///
/// assert!(!q.is_required());
/// assert_eq!(q.lookup_key(), "item-query");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    alias: Option<String>,
    source: Source,
    ty: FieldType,
    required: bool,
    default: Option<Value>,
    constraints: Vec<Constraint>,
    whole_body: bool,
    description: Option<String>,
}

impl FieldSpec {
    /// Creates a required field.
    pub fn new(name: impl Into<String>, source: Source, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            source,
            ty,
            required: true,
            default: None,
            constraints: Vec::new(),
            whole_body: false,
            description: None,
        }
    }

    /// Looks the value up under `alias` instead of the field name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Makes the field optional; absent values bind to `Null`.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self.default = None;
        self
    }

    /// Makes the field optional with a default used when it is absent.
    ///
    /// Defaults are stored as given: they are neither coerced nor checked
    /// against constraints.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    /// Appends a constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Appends several constraints, preserving their order.
    pub fn constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Reads the entire body payload instead of a key of the body object.
    ///
    /// Only meaningful for [`Source::Body`].
    pub fn whole_body(mut self) -> Self {
        self.whole_body = true;
        self
    }

    /// Attaches a description for documentation.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the same declaration under a different name.
    ///
    /// The lookup key is unchanged: the old name becomes the alias unless
    /// an alias was already set.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut spec = self.clone();
        if spec.alias.is_none() {
            spec.alias = Some(self.lookup_key_in(self.source));
        }
        spec.name = name.into();
        spec
    }

    /// Returns the field name used in results and error paths.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the alias, if one was set.
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Returns the declared source.
    pub fn source(&self) -> Source {
        self.source
    }

    /// Returns the declared type.
    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    /// Returns `true` if absence is an error.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the default value, if any.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the constraints in declaration order.
    pub fn constraint_list(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns `true` if the field takes the entire body payload.
    pub fn is_whole_body(&self) -> bool {
        self.whole_body
    }

    /// Returns the description, if any.
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the key this field is looked up by in its own source.
    pub fn lookup_key(&self) -> String {
        self.lookup_key_in(self.source)
    }

    /// Returns the key this field is looked up by when read from `source`.
    ///
    /// Without an alias, header lookups use the field name with `_`
    /// replaced by `-` (`user_agent` reads `user-agent`). Header keys are
    /// lowercased because header names are case-insensitive.
    pub(crate) fn lookup_key_in(&self, source: Source) -> String {
        match (&self.alias, source) {
            (Some(alias), Source::Header) => alias.to_ascii_lowercase(),
            (Some(alias), _) => alias.clone(),
            (None, Source::Header) => self.name.replace('_', "-").to_ascii_lowercase(),
            (None, _) => self.name.clone(),
        }
    }

    /// Nested schemas on non-body sources are bound against the source bag
    /// itself rather than a single located value.
    pub(crate) fn is_parameter_model(&self, source: Source) -> bool {
        source != Source::Body && matches!(self.ty, FieldType::Nested(_))
    }
}
