use std::fmt;
use std::sync::Arc;

use crate::binder::bind;
use crate::error::Violation;
use crate::gate::{Check, Gate};
use crate::logging::RequestLog;
use crate::outcome::{BindErrors, Bound};
use crate::request::{ExtractRequest, RawRequest};
use crate::schema::Schema;

/// Why an endpoint refused a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// A gate check failed; no field was bound
    Denied(Violation),
    /// Binding produced field errors
    Invalid(BindErrors),
}

impl Rejection {
    /// Suggested HTTP status: 400 for gate denials, 422 for field errors.
    pub fn status(&self) -> u16 {
        match self {
            Rejection::Denied(_) => 400,
            Rejection::Invalid(_) => 422,
        }
    }

    /// Renders a `{"detail": ...}` response document.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Rejection::Denied(v) => serde_json::json!({ "detail": v.message }),
            Rejection::Invalid(errors) => errors.to_json(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Denied(v) => write!(f, "Request denied: {}", v),
            Rejection::Invalid(errors) => write!(f, "Request invalid: {}", errors),
        }
    }
}

impl std::error::Error for Rejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Rejection::Denied(v) => Some(v),
            Rejection::Invalid(errors) => Some(errors),
        }
    }
}

impl From<Violation> for Rejection {
    fn from(v: Violation) -> Self {
        Rejection::Denied(v)
    }
}

impl From<BindErrors> for Rejection {
    fn from(errors: BindErrors) -> Self {
        Rejection::Invalid(errors)
    }
}

/// A named handler contract: gate checks followed by a binding schema.
///
/// An `Endpoint` is immutable once built and can be shared across threads;
/// each call to [`handle`](Self::handle) is independent.
///
/// # Examples
///
/// ```
/// use request_binder::{Endpoint, FieldSpec, FieldType, RawRequest, RequireHeader, Schema, Source};
///
/// let schema = Schema::new([FieldSpec::new("item_id", Source::Path, FieldType::Int)])
///     .expect("valid schema");
/// let endpoint = Endpoint::new("read_item", schema)
///     .require(RequireHeader::equals("X-Token", "fake-super-secret-token"));
///
/// let mut request = RawRequest::new("req-1");
/// request.add_path_param("item_id", "5");
/// assert_eq!(endpoint.handle(&request).unwrap_err().status(), 400);
///
/// request.add_header("X-Token", "fake-super-secret-token");
/// assert!(endpoint.handle(&request).is_ok());
/// ```
#[derive(Debug)]
pub struct Endpoint {
    name: String,
    gate: Gate,
    schema: Arc<Schema>,
}

impl Endpoint {
    /// Creates an endpoint with no gate checks.
    pub fn new(name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            name: name.into(),
            gate: Gate::new(),
            schema: schema.into(),
        }
    }

    /// Adds a gate check; see [`Gate::require`].
    pub fn require(mut self, check: impl Check + 'static) -> Self {
        self.gate = self.gate.require(check);
        self
    }

    /// Returns the endpoint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the binding schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the gate.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Runs the gate, then binds the request.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::Denied`] for the first failing check, or
    /// [`Rejection::Invalid`] with every field error.
    pub fn handle(&self, request: &RawRequest) -> Result<Bound, Rejection> {
        let log = RequestLog::new(request.request_id(), &self.name);

        if let Err(violation) = self.gate.run(request) {
            log.warn(format_args!("denied: {}", violation.kind));
            return Err(violation.into());
        }

        match bind(&self.schema, request) {
            Ok(bound) => {
                log.debug(format_args!("bound {} fields", bound.len()));
                Ok(bound)
            }
            Err(errors) => {
                log.info(format_args!("rejected with {} field errors", errors.len()));
                Err(errors.into())
            }
        }
    }

    /// Extracts a framework request and handles it.
    ///
    /// # Errors
    ///
    /// See [`handle`](Self::handle).
    pub fn handle_from<R: ExtractRequest>(&self, request: &R) -> Result<Bound, Rejection> {
        self.handle(&request.extract_request())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;
    use crate::field::{FieldSpec, FieldType, Source};
    use crate::gate::RequireHeader;
    use crate::outcome::FieldErrorKind;
    use crate::value::Value;

    fn items_endpoint() -> Endpoint {
        let schema = Schema::new([
            FieldSpec::new("item_id", Source::Path, FieldType::String),
            FieldSpec::new("q", Source::Query, FieldType::String).optional(),
        ])
        .unwrap();

        Endpoint::new("read_item", schema)
            .require(RequireHeader::equals("X-Token", "fake-super-secret-token"))
            .require(RequireHeader::equals("X-Key", "fake-super-secret-key"))
    }

    fn authorized(id: &str) -> RawRequest {
        let mut request = RawRequest::new(id);
        request.add_header("X-Token", "fake-super-secret-token");
        request.add_header("X-Key", "fake-super-secret-key");
        request
    }

    #[test]
    fn gate_runs_before_binding() {
        let mut request = RawRequest::new("req-1");
        request.add_header("X-Token", "fake-super-secret-token");

        let rejection = items_endpoint().handle(&request).unwrap_err();
        assert_eq!(rejection.status(), 400);
        assert!(matches!(
            rejection,
            Rejection::Denied(Violation {
                kind: ViolationKind::MissingHeader { .. },
                ..
            })
        ));
        assert_eq!(rejection.to_json()["detail"], "X-Key header missing");
    }

    #[test]
    fn field_errors_become_invalid() {
        let rejection = items_endpoint().handle(&authorized("req-2")).unwrap_err();

        assert_eq!(rejection.status(), 422);
        match rejection {
            Rejection::Invalid(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors.as_slice()[0].kind, FieldErrorKind::Missing);
            }
            other => panic!("expected invalid, got {other}"),
        }
    }

    #[test]
    fn accepted_request_binds_all_fields() {
        let mut request = authorized("req-3");
        request.add_path_param("item_id", "foo");

        let bound = items_endpoint().handle(&request).unwrap();
        assert_eq!(bound.get("item_id"), Some(&Value::from("foo")));
        assert_eq!(bound.get("q"), Some(&Value::Null));
    }

    #[test]
    fn endpoint_is_shareable_across_threads() {
        let endpoint = Arc::new(items_endpoint());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let endpoint = Arc::clone(&endpoint);
                std::thread::spawn(move || {
                    let mut request = authorized(&format!("req-{i}"));
                    request.add_path_param("item_id", i.to_string());
                    endpoint.handle(&request).is_ok()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
