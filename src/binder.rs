//! The binding pass: locate, coerce, constrain, accumulate.

use std::collections::HashSet;

use crate::coerce::{coerce_json, coerce_text, json_type_name};
use crate::constraint::Constraint;
use crate::field::{FieldSpec, FieldType, Source};
use crate::outcome::{BindErrors, BindingResult, Bound, FieldError, FieldErrorKind, FieldPath};
use crate::request::RawRequest;
use crate::schema::Schema;
use crate::value::Value;

/// Binds a request against a schema.
///
/// Fields are processed in declaration order. Every problem is collected:
/// a missing or invalid field never hides errors on the fields after it,
/// and every violated constraint on a field is reported. The function is
/// pure; it does not mutate the request, perform I/O, or log.
///
/// # Examples
///
/// ```
/// use request_binder::{bind, Constraint, FieldSpec, FieldType, RawRequest, Schema, Source, Value};
///
/// let schema = Schema::new([
///     FieldSpec::new("item_id", Source::Path, FieldType::Int)
///         .constraints([Constraint::ge(0), Constraint::le(1000)]),
///     FieldSpec::new("short", Source::Query, FieldType::Bool).default(false),
/// ])
/// .unwrap();
///
/// let mut request = RawRequest::new("req-1");
/// request.add_path_param("item_id", "42");
/// request.add_query_param("short", "yes");
///
/// let bound = bind(&schema, &request).expect("valid request");
/// assert_eq!(bound.get("item_id"), Some(&Value::Int(42)));
/// assert_eq!(bound.get("short"), Some(&Value::Bool(true)));
/// ```
pub fn bind(schema: &Schema, request: &RawRequest) -> BindingResult {
    let mut errors = Vec::new();
    let bound = bind_fields(schema, Scope::Request(request), &FieldPath::root(), &mut errors);

    if errors.is_empty() {
        Ok(bound)
    } else {
        Err(BindErrors::new(errors))
    }
}

/// Where the fields of a schema are looked up.
#[derive(Clone, Copy)]
enum Scope<'a> {
    /// Top level: each field reads its own declared source.
    Request(&'a RawRequest),
    /// Parameter model: every field reads the same textual source.
    Bag(&'a RawRequest, Source),
    /// Nested JSON object inside the body.
    Object(&'a serde_json::Map<String, serde_json::Value>),
}

impl<'a> Scope<'a> {
    fn source_for(&self, field: &FieldSpec) -> Source {
        match self {
            Scope::Request(_) => field.source(),
            Scope::Bag(_, source) => *source,
            Scope::Object(_) => Source::Body,
        }
    }

    fn locate(&self, field: &FieldSpec) -> Option<Raw<'a>> {
        let source = self.source_for(field);
        let key = field.lookup_key_in(source);

        match *self {
            Scope::Object(map) => present(map.get(&key)).map(Raw::Json),
            Scope::Request(request) | Scope::Bag(request, _) => {
                if source == Source::Body {
                    let body = present(request.body())?;
                    if field.is_whole_body() {
                        Some(Raw::Json(body))
                    } else {
                        present(body.as_object()?.get(&key)).map(Raw::Json)
                    }
                } else {
                    let values = request.text_values(source, &key);
                    if values.is_empty() {
                        None
                    } else {
                        Some(Raw::Text(values))
                    }
                }
            }
        }
    }

    /// Keys available in this scope, for the extra-key check.
    fn available_keys(&self) -> Vec<String> {
        match self {
            Scope::Request(_) => Vec::new(),
            Scope::Bag(request, source) => request.keys(*source),
            Scope::Object(map) => map.keys().cloned().collect(),
        }
    }

    /// Keys a schema reads in this scope, including those read by the
    /// parameter models it contains.
    fn declared_keys(&self, schema: &Schema, keys: &mut HashSet<String>) {
        for field in schema.fields() {
            let source = self.source_for(field);
            match field.ty() {
                FieldType::Nested(model) if field.is_parameter_model(source) => {
                    self.declared_keys(model, keys)
                }
                _ => {
                    keys.insert(field.lookup_key_in(source));
                }
            }
        }
    }
}

/// A located raw value.
enum Raw<'a> {
    /// Every textual value for the key, in arrival order
    Text(Vec<&'a str>),
    /// A JSON value from the body
    Json(&'a serde_json::Value),
}

// A JSON null counts as absent.
fn present(value: Option<&serde_json::Value>) -> Option<&serde_json::Value> {
    value.filter(|v| !v.is_null())
}

fn bind_fields(
    schema: &Schema,
    scope: Scope<'_>,
    prefix: &FieldPath,
    errors: &mut Vec<FieldError>,
) -> Bound {
    let mut bound = Bound::new();

    for field in schema.fields() {
        let path = prefix.child(field.name());
        let source = scope.source_for(field);
        let before = errors.len();

        // Parameter models read the whole source bag instead of one key.
        if field.is_parameter_model(source) {
            if let (FieldType::Nested(model), Scope::Request(r) | Scope::Bag(r, _)) =
                (field.ty(), scope)
            {
                let inner = bind_fields(model, Scope::Bag(r, source), &path, errors);
                if errors.len() == before {
                    bound.insert(field.name(), Value::Object(inner));
                }
                continue;
            }
        }

        match scope.locate(field) {
            None => {
                if let Some(default) = field.default_value() {
                    bound.insert(field.name(), default.clone());
                } else if field.is_required() {
                    errors.push(FieldError::missing(&path, source));
                } else {
                    bound.insert(field.name(), Value::Null);
                }
            }
            Some(raw) => {
                if let Some(value) = coerce_field(field.ty(), raw, &path, source, errors) {
                    for constraint in field.constraint_list() {
                        check_constraint(constraint, &value, &path, source, errors);
                    }
                    if errors.len() == before {
                        bound.insert(field.name(), value);
                    }
                }
            }
        }
    }

    if schema.forbids_extra() {
        let mut declared = HashSet::new();
        scope.declared_keys(schema, &mut declared);
        let source = match scope {
            Scope::Bag(_, source) => source,
            _ => Source::Body,
        };
        for key in scope.available_keys() {
            if !declared.contains(&key) {
                errors.push(FieldError::at(
                    &prefix.child(key),
                    source,
                    FieldErrorKind::Unexpected,
                    "Extra inputs are not permitted",
                ));
            }
        }
    }

    bound
}

fn type_error(path: &FieldPath, source: Source, message: impl Into<String>) -> FieldError {
    FieldError::at(path, source, FieldErrorKind::TypeError, message)
}

/// Coerces a located value, pushing errors for it and its members.
///
/// Returns `None` if any error was recorded.
fn coerce_field(
    ty: &FieldType,
    raw: Raw<'_>,
    path: &FieldPath,
    source: Source,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    let before = errors.len();

    let value = match (ty, raw) {
        (FieldType::List(item), Raw::Text(values)) => {
            let items: Vec<Option<Value>> = values
                .into_iter()
                .enumerate()
                .map(|(i, v)| coerce_field(item, Raw::Text(vec![v]), &path.child(i.to_string()), source, errors))
                .collect();
            Value::List(items.into_iter().flatten().collect())
        }
        (FieldType::List(item), Raw::Json(serde_json::Value::Array(values))) => {
            let items: Vec<Option<Value>> = values
                .iter()
                .enumerate()
                .map(|(i, v)| coerce_field(item, Raw::Json(v), &path.child(i.to_string()), source, errors))
                .collect();
            Value::List(items.into_iter().flatten().collect())
        }
        (FieldType::List(_), Raw::Json(other)) => {
            errors.push(type_error(
                path,
                source,
                format!("Input should be a valid list, got {}", json_type_name(other)),
            ));
            return None;
        }
        (FieldType::Nested(schema), Raw::Json(serde_json::Value::Object(map))) => {
            Value::Object(bind_fields(schema, Scope::Object(map), path, errors))
        }
        (FieldType::Nested(_), Raw::Json(other)) => {
            errors.push(type_error(
                path,
                source,
                format!("Input should be an object, got {}", json_type_name(other)),
            ));
            return None;
        }
        (ty, Raw::Text(values)) => {
            // Scalars take the last value of a repeated key.
            let last = values.last().copied().unwrap_or_default();
            match coerce_text(last, ty) {
                Ok(v) => v,
                Err(message) => {
                    errors.push(type_error(path, source, message));
                    return None;
                }
            }
        }
        (ty, Raw::Json(json)) => match coerce_json(json, ty) {
            Ok(v) => v,
            Err(message) => {
                errors.push(type_error(path, source, message));
                return None;
            }
        },
    };

    if errors.len() == before {
        Some(value)
    } else {
        None
    }
}

/// Evaluates one constraint against a coerced value.
///
/// Length constraints measure the outermost list. Every other constraint
/// descends through nested lists and applies to each leaf item, reporting
/// it under its index path (`grid.0.1`).
fn check_constraint(
    constraint: &Constraint,
    value: &Value,
    path: &FieldPath,
    source: Source,
    errors: &mut Vec<FieldError>,
) {
    match value {
        Value::List(items) if !constraint.is_length() => {
            for (i, item) in items.iter().enumerate() {
                check_constraint(constraint, item, &path.child(i.to_string()), source, errors);
            }
        }
        _ => {
            if let Err(message) = constraint.check(value) {
                errors.push(FieldError::at(
                    path,
                    source,
                    FieldErrorKind::ConstraintViolation {
                        constraint: constraint.kind(),
                    },
                    message,
                ));
            }
        }
    }
}
