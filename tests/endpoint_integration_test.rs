//! End-to-end handler flows: gate, binding, rejection rendering and
//! output projection.

use std::collections::HashMap;

use request_binder::{
    check_fn, Constraint, Endpoint, ExtractRequest, FieldErrorKind, FieldSpec, FieldType,
    Projection, RawRequest, Rejection, RequireHeader, Schema, Source, Value, Violation,
    ViolationKind,
};
use serde_json::json;

/// A stand-in for a web framework's request type.
struct FrameworkRequest {
    id: String,
    path: HashMap<String, String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ExtractRequest for FrameworkRequest {
    fn extract_request(&self) -> RawRequest {
        let mut request = RawRequest::new(self.id.clone());
        for (k, v) in &self.path {
            request.add_path_param(k.clone(), v.clone());
        }
        for (k, v) in &self.query {
            request.add_query_param(k.clone(), v.clone());
        }
        for (k, v) in &self.headers {
            request.add_header(k.clone(), v.clone());
        }
        if let Some(body) = &self.body {
            request.set_body(body.clone());
        }
        request
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn filter_params() -> Schema {
    Schema::builder()
        .fields([
            FieldSpec::new("limit", Source::Query, FieldType::Int)
                .default(100)
                .constraints([Constraint::gt(0), Constraint::le(100)]),
            FieldSpec::new("offset", Source::Query, FieldType::Int)
                .default(0)
                .constraint(Constraint::ge(0)),
            FieldSpec::new("order_by", Source::Query, FieldType::String)
                .default("created_at")
                .constraint(Constraint::one_of(["created_at", "updated_at"])),
            FieldSpec::new("tags", Source::Query, FieldType::list(FieldType::String))
                .default(Vec::<Value>::new()),
        ])
        .forbid_extra()
        .build()
        .expect("valid schema")
}

fn read_items() -> Endpoint {
    let schema = Schema::new([FieldSpec::new(
        "filter_query",
        Source::Query,
        FieldType::nested(filter_params()),
    )])
    .expect("valid schema");

    Endpoint::new("read_items", schema)
        .require(RequireHeader::equals("X-Token", "fake-super-secret-token"))
        .require(RequireHeader::equals("X-Key", "fake-super-secret-key"))
}

fn with_credentials(request: &mut RawRequest) {
    request.add_header("X-Token", "fake-super-secret-token");
    request.add_header("X-Key", "fake-super-secret-key");
}

#[test]
fn invalid_key_is_rejected_before_binding() {
    init_tracing();
    let mut request = RawRequest::new("req-1");
    request.add_header("X-Token", "fake-super-secret-token");
    request.add_header("X-Key", "wrong");
    request.add_query_param("limit", "not-a-number");

    let rejection = read_items().handle(&request).unwrap_err();
    assert_eq!(rejection.status(), 400);
    assert_eq!(rejection.to_json(), json!({ "detail": "X-Key header invalid" }));
}

#[test]
fn parameter_model_binds_with_defaults() {
    init_tracing();
    let mut request = RawRequest::new("req-2");
    with_credentials(&mut request);
    request.add_query_param("limit", "10");
    request.add_query_param("tags", "a");
    request.add_query_param("tags", "b");

    let bound = read_items().handle(&request).unwrap();
    assert_eq!(
        bound.to_json(),
        json!({
            "filter_query": {
                "limit": 10,
                "offset": 0,
                "order_by": "created_at",
                "tags": ["a", "b"]
            }
        })
    );
}

#[test]
fn parameter_model_reports_every_problem() {
    init_tracing();
    let mut request = RawRequest::new("req-3");
    with_credentials(&mut request);
    request.add_query_param("limit", "500");
    request.add_query_param("order_by", "price");
    request.add_query_param("tool", "plumbus");

    let rejection = read_items().handle(&request).unwrap_err();
    assert_eq!(rejection.status(), 422);
    let Rejection::Invalid(errors) = rejection else {
        panic!("expected field errors");
    };

    let summary: Vec<_> = errors.iter().map(|e| (e.path.as_str(), e.kind.code())).collect();
    assert_eq!(
        summary,
        vec![
            ("filter_query.limit", "constraint_violation"),
            ("filter_query.order_by", "constraint_violation"),
            ("filter_query.tool", "unexpected"),
        ]
    );
}

#[test]
fn login_form_rejects_extra_fields() {
    init_tracing();
    let form = Schema::builder()
        .fields([
            FieldSpec::new("username", Source::Form, FieldType::String),
            FieldSpec::new("password", Source::Form, FieldType::String),
        ])
        .forbid_extra()
        .build()
        .unwrap();
    let schema =
        Schema::new([FieldSpec::new("data", Source::Form, FieldType::nested(form))]).unwrap();
    let login = Endpoint::new("login", schema);

    let mut request = RawRequest::new("req-4");
    request.add_form_field("username", "johndoe");
    request.add_form_field("extra", "seriously");

    let Err(Rejection::Invalid(errors)) = login.handle(&request) else {
        panic!("expected field errors");
    };
    let summary: Vec<_> = errors.iter().map(|e| (e.path.as_str(), e.kind)).collect();
    assert_eq!(
        summary,
        vec![
            ("data.password", FieldErrorKind::Missing),
            ("data.extra", FieldErrorKind::Unexpected),
        ]
    );
    assert!(errors.iter().all(|e| e.source == Source::Form));
}

#[test]
fn user_output_drops_password() {
    init_tracing();
    let user_in = Schema::new([
        FieldSpec::new("username", Source::Body, FieldType::String),
        FieldSpec::new("password", Source::Body, FieldType::String),
        FieldSpec::new("email", Source::Body, FieldType::String)
            .constraint(Constraint::pattern("^[^@]+@[^@]+$").unwrap()),
        FieldSpec::new("full_name", Source::Body, FieldType::String).optional(),
    ])
    .unwrap();
    let user_out = Projection::new().exclude("password");
    user_out.validate(&user_in).unwrap();

    let create_user = Endpoint::new("create_user", user_in);
    let mut request = RawRequest::new("req-5");
    request.set_body(json!({
        "username": "john",
        "password": "hunter2",
        "email": "john@example.com"
    }));

    let bound = create_user.handle(&request).unwrap();
    assert_eq!(
        user_out.apply(&bound).to_json(),
        json!({ "username": "john", "email": "john@example.com", "full_name": null })
    );
}

#[test]
fn framework_requests_are_extracted_then_handled() {
    init_tracing();
    let schema = Schema::new([
        FieldSpec::new("item_id", Source::Path, FieldType::Int),
        FieldSpec::new("q", Source::Query, FieldType::String)
            .alias("item-query")
            .optional(),
        FieldSpec::new("user_agent", Source::Header, FieldType::String).optional(),
    ])
    .unwrap();
    let endpoint = Endpoint::new("read_item", schema).require(check_fn(
        "no-body",
        |request: &RawRequest| match request.body() {
            None => Ok(()),
            Some(_) => Err(Violation::new(
                ViolationKind::Denied {
                    check: "no-body".to_string(),
                },
                "GET requests carry no body",
            )),
        },
    ));

    let mut framework = FrameworkRequest {
        id: "req-6".to_string(),
        path: HashMap::from([("item_id".to_string(), "7".to_string())]),
        query: vec![("item-query".to_string(), "fixedquery".to_string())],
        headers: vec![("User-Agent".to_string(), "curl/8.0".to_string())],
        body: None,
    };

    let bound = endpoint.handle_from(&framework).unwrap();
    assert_eq!(bound.get("item_id"), Some(&Value::Int(7)));
    assert_eq!(bound.get("q"), Some(&Value::from("fixedquery")));
    assert_eq!(bound.get("user_agent"), Some(&Value::from("curl/8.0")));

    framework.body = Some(json!({}));
    let rejection = endpoint.handle_from(&framework).unwrap_err();
    assert!(matches!(
        rejection,
        Rejection::Denied(Violation {
            kind: ViolationKind::Denied { .. },
            ..
        })
    ));
}
