//! Endpoint flow demonstration.
//!
//! This example wires schemas behind endpoints the way a web handler would:
//! 1. Verify token headers with a gate
//! 2. Bind a parameter model and a nested JSON body
//! 3. Shape the response with a projection
//!
//! Run with: `cargo run --example tutorial_endpoints`

use std::sync::Arc;

use request_binder::{
    Constraint, Endpoint, Error, FieldSpec, FieldType, Projection, RawRequest, RequireHeader,
    Schema, Source, Value,
};
use serde_json::json;

fn items_endpoint() -> Result<Endpoint, Error> {
    let filter = Schema::builder()
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
        ])
        .forbid_extra()
        .build()?;

    let schema = Schema::new([FieldSpec::new(
        "filter_query",
        Source::Query,
        FieldType::nested(filter),
    )])?;

    Ok(Endpoint::new("read_items", schema)
        .require(RequireHeader::equals("X-Token", "fake-super-secret-token"))
        .require(RequireHeader::equals("X-Key", "fake-super-secret-key")))
}

fn item_schema() -> Result<Arc<Schema>, Error> {
    let image = Schema::new([
        FieldSpec::new("url", Source::Body, FieldType::String)
            .constraint(Constraint::pattern("^https?://")?),
        FieldSpec::new("name", Source::Body, FieldType::String),
    ])?;
    let item = Schema::new([
        FieldSpec::new("name", Source::Body, FieldType::String),
        FieldSpec::new("description", Source::Body, FieldType::String).optional(),
        FieldSpec::new("price", Source::Body, FieldType::Float).constraint(Constraint::gt(0)),
        FieldSpec::new("tax", Source::Body, FieldType::Float).optional(),
        FieldSpec::new("tags", Source::Body, FieldType::list(FieldType::String))
            .default(Vec::<Value>::new()),
        FieldSpec::new("image", Source::Body, FieldType::nested(image)).optional(),
    ])?;
    Ok(Arc::new(item))
}

fn update_item_endpoint(item: Arc<Schema>) -> Result<Endpoint, Error> {
    let schema = Schema::new([
        FieldSpec::new("item_id", Source::Path, FieldType::Int),
        FieldSpec::new("item", Source::Body, FieldType::nested(item)).whole_body(),
    ])?;

    Ok(Endpoint::new("update_item", schema))
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Endpoint Flow Example ===\n");

    let read_items = items_endpoint()?;
    let item = item_schema()?;
    let update_item = update_item_endpoint(Arc::clone(&item))?;

    // Scenario 1: Missing credentials
    println!("--- Scenario 1: Gate Denial ---");
    let mut request = RawRequest::new("req-gate-001");
    request.add_header("X-Token", "fake-super-secret-token");
    match read_items.handle(&request) {
        Ok(_) => println!("✗ Unexpected success"),
        Err(rejection) => println!("✓ {} -> {}", rejection.status(), rejection.to_json()),
    }

    // Scenario 2: Parameter model with defaults
    println!("\n--- Scenario 2: Query Parameter Model ---");
    request.add_header("X-Key", "fake-super-secret-key");
    request.add_query_param("limit", "10");
    match read_items.handle(&request) {
        Ok(bound) => println!("✓ {}", bound.to_json()),
        Err(rejection) => println!("✗ {}", rejection),
    }

    // Scenario 3: Nested body with an invalid image
    println!("\n--- Scenario 3: Nested Body ---");
    let mut request = RawRequest::new("req-body-003");
    request.add_path_param("item_id", "5");
    request.set_body(json!({
        "name": "Foo",
        "price": 42.0,
        "tags": ["rock", "metal", "bar"],
        "image": { "url": "ftp://example.com/baz.jpg", "name": "The Foo live" }
    }));
    match update_item.handle(&request) {
        Ok(bound) => println!("✗ Unexpected success: {}", bound.to_json()),
        Err(rejection) => println!("✓ {} -> {:#}", rejection.status(), rejection.to_json()),
    }

    // Scenario 4: Projection over the bound item
    println!("\n--- Scenario 4: Response Projection ---");
    request.set_body(json!({ "name": "Foo", "price": 42.0, "tax": 3.2 }));
    let summary = Projection::new()
        .include("name")
        .include("price")
        .rename("price", "unit_price");
    summary.validate(&item)?;
    match update_item.handle(&request) {
        Ok(bound) => {
            if let Some(bound_item) = bound.get("item").and_then(Value::as_object) {
                println!("✓ {}", summary.apply(bound_item).to_json());
            }
        }
        Err(rejection) => println!("✗ {}", rejection),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
