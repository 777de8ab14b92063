//! Declarative request binding and validation.
//!
//! A handler declares the fields it expects as a [`Schema`]: where each
//! value comes from ([`Source`]), what type it has ([`FieldType`]), and
//! which rules it must satisfy ([`Constraint`]). [`bind`] maps an
//! already-demultiplexed [`RawRequest`] onto that schema and either returns
//! every field as a typed [`Value`] or the complete list of [`FieldError`]s.
//!
//! # Core Types
//!
//! - [`FieldSpec`] / [`Schema`]: immutable, validated field declarations
//! - [`RawRequest`]: per-source bags of raw request data
//! - [`Bound`] / [`BindErrors`]: the two outcomes of [`bind`]
//! - [`Gate`] / [`Check`]: pre-binding checks such as token headers
//! - [`Endpoint`]: a gate and a schema behind one `handle` call
//! - [`Projection`]: field subsets and renames for shaping output
//!
//! # Examples
//!
//! ```
//! use request_binder::{bind, Constraint, FieldSpec, FieldType, RawRequest, Schema, Source};
//!
//! let schema = Schema::new([
//!     FieldSpec::new("q", Source::Query, FieldType::String)
//!         .optional()
//!         .constraints([
//!             Constraint::MinLength(3),
//!             Constraint::MaxLength(50),
//!             Constraint::pattern("^fixedquery$").expect("valid regex"),
//!         ]),
//! ])
//! .expect("valid schema");
//!
//! let mut request = RawRequest::new("req-123");
//! request.add_query_param("q", "short");
//!
//! let errors = bind(&schema, &request).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors.as_slice()[0].path, "q");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod binder;
mod coerce;
mod constraint;
mod endpoint;
mod error;
mod field;
mod gate;
mod logging;
mod outcome;
mod projection;
mod request;
mod schema;
mod value;

#[cfg(test)]
mod test_utils;

pub use binder::bind;
pub use constraint::{Constraint, ConstraintKind, Pattern};
pub use endpoint::{Endpoint, Rejection};
pub use error::{Error, SchemaError, SchemaErrorKind, Violation, ViolationKind};
pub use field::{FieldSpec, FieldType, Source};
pub use gate::{check_fn, Check, FnCheck, Gate, RequireHeader};
pub use outcome::{BindErrors, BindingResult, Bound, FieldError, FieldErrorKind};
pub use projection::Projection;
pub use request::{ExtractRequest, RawRequest};
pub use schema::{Schema, SchemaBuilder, SchemaLimits};
pub use value::{Number, Value};
