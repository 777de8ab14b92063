//! Request validation demonstration.
//!
//! This example shows how a schema turns raw request data into typed values:
//! 1. Declare fields with sources, types and constraints
//! 2. Bind valid and invalid requests
//! 3. Render the error document a handler would return
//!
//! Run with: `cargo run --example request_validation`

use request_binder::{
    bind, Constraint, FieldSpec, FieldType, RawRequest, Schema, SchemaError, Source,
};
use serde_json::json;

fn main() -> Result<(), SchemaError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Request Validation Example ===\n");

    let schema = Schema::new([
        FieldSpec::new("item_id", Source::Path, FieldType::Int)
            .constraints([Constraint::ge(0), Constraint::le(1000)]),
        FieldSpec::new("q", Source::Query, FieldType::String)
            .alias("item-query")
            .optional()
            .constraints([
                Constraint::MinLength(3),
                Constraint::MaxLength(50),
                Constraint::pattern("^fixedquery$")?,
            ]),
        FieldSpec::new("size", Source::Query, FieldType::Float)
            .default(1.0)
            .constraints([Constraint::gt(0), Constraint::lt(10.5)]),
        FieldSpec::new("importance", Source::Body, FieldType::Int).constraint(Constraint::gt(0)),
    ])?;

    // Scenario 1: Valid request
    println!("--- Scenario 1: Valid Request ---");
    let mut request = RawRequest::new("req-valid-001");
    request.add_path_param("item_id", "42");
    request.add_query_param("item-query", "fixedquery");
    request.set_body(json!({ "importance": 5 }));

    match bind(&schema, &request) {
        Ok(bound) => println!("✓ Bound: {}", bound.to_json()),
        Err(errors) => println!("✗ Unexpected: {}", errors),
    }

    // Scenario 2: Every problem is reported at once
    println!("\n--- Scenario 2: Invalid Request ---");
    let mut request = RawRequest::new("req-invalid-002");
    request.add_path_param("item_id", "1500");
    request.add_query_param("item-query", "ab");
    request.add_query_param("size", "big");

    match bind(&schema, &request) {
        Ok(bound) => println!("✗ Unexpected success: {}", bound.to_json()),
        Err(errors) => {
            println!("✓ {}", errors);
            println!("\nResponse body (422):");
            println!("{:#}", errors.to_json());
        }
    }

    // Scenario 3: Malformed declarations fail at construction
    println!("\n--- Scenario 3: Invalid Schema ---");
    let result = Schema::new([FieldSpec::new("item_id", Source::Path, FieldType::Int)
        .constraint(Constraint::MinLength(1))]);
    match result {
        Ok(_) => println!("✗ Unexpected success"),
        Err(err) => println!("✓ Rejected: {}", err),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
