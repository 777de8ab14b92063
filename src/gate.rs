use std::fmt;

use crate::error::{Violation, ViolationKind};
use crate::request::RawRequest;

/// A pre-binding check run against the raw request.
///
/// Checks see the request before any field is bound, which makes them the
/// place for token or API-key verification that must reject a request
/// outright rather than report field errors.
pub trait Check: Send + Sync {
    /// A stable name, used for de-duplication and logging.
    fn name(&self) -> &str;

    /// Inspects the request.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] if the request must be rejected.
    fn check(&self, request: &RawRequest) -> Result<(), Violation>;
}

/// Requires a header to carry an exact value.
///
/// # Examples
///
/// ```
/// use request_binder::{Check, RawRequest, RequireHeader};
///
/// let check = RequireHeader::equals("X-Token", "fake-super-secret-token");
///
/// let mut request = RawRequest::new("req-1");
/// request.add_header("x-token", "fake-super-secret-token");
/// assert!(check.check(&request).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RequireHeader {
    name: String,
    header: String,
    expected: String,
}

impl RequireHeader {
    /// Requires `header` to be present and equal to `expected`.
    pub fn equals(header: impl Into<String>, expected: impl Into<String>) -> Self {
        let header = header.into();
        Self {
            name: format!("require-header:{}", header.to_ascii_lowercase()),
            header,
            expected: expected.into(),
        }
    }
}

impl Check for RequireHeader {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, request: &RawRequest) -> Result<(), Violation> {
        match request.header(&self.header) {
            None => Err(Violation::new(
                ViolationKind::MissingHeader {
                    name: self.header.clone(),
                },
                format!("{} header missing", self.header),
            )),
            // Never echo the expected value.
            Some(value) if value != self.expected => Err(Violation::new(
                ViolationKind::InvalidHeader {
                    name: self.header.clone(),
                },
                format!("{} header invalid", self.header),
            )),
            Some(_) => Ok(()),
        }
    }
}

/// A check backed by a closure. Created with [`check_fn`].
pub struct FnCheck<F> {
    name: String,
    f: F,
}

impl<F> fmt::Debug for FnCheck<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCheck").field("name", &self.name).finish()
    }
}

impl<F> Check for FnCheck<F>
where
    F: Fn(&RawRequest) -> Result<(), Violation> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, request: &RawRequest) -> Result<(), Violation> {
        (self.f)(request)
    }
}

/// Wraps a closure as a named [`Check`].
///
/// # Examples
///
/// ```
/// use request_binder::{check_fn, Check, RawRequest, Violation, ViolationKind};
///
/// let has_body = check_fn("has-body", |request: &RawRequest| {
///     if request.body().is_some() {
///         Ok(())
///     } else {
///         Err(Violation::new(
///             ViolationKind::Denied { check: "has-body".to_string() },
///             "body required",
///         ))
///     }
/// });
///
/// assert!(has_body.check(&RawRequest::new("req-1")).is_err());
/// ```
pub fn check_fn<F>(name: impl Into<String>, f: F) -> FnCheck<F>
where
    F: Fn(&RawRequest) -> Result<(), Violation> + Send + Sync,
{
    FnCheck {
        name: name.into(),
        f,
    }
}

/// An ordered list of checks run before binding.
///
/// # Examples
///
/// ```
/// use request_binder::{Gate, RawRequest, RequireHeader};
///
/// let gate = Gate::new()
///     .require(RequireHeader::equals("X-Token", "fake-super-secret-token"))
///     .require(RequireHeader::equals("X-Key", "fake-super-secret-key"))
///     .require(RequireHeader::equals("X-Token", "fake-super-secret-token"));
/// assert_eq!(gate.len(), 2);
///
/// let request = RawRequest::new("req-1");
/// assert!(gate.run(&request).is_err());
/// ```
#[derive(Default)]
pub struct Gate {
    checks: Vec<Box<dyn Check>>,
}

impl Gate {
    /// Creates an empty gate, which admits every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a check, unless one with the same name is already present.
    pub fn require(mut self, check: impl Check + 'static) -> Self {
        if !self.checks.iter().any(|c| c.name() == check.name()) {
            self.checks.push(Box::new(check));
        }
        self
    }

    /// Runs every check in order.
    ///
    /// # Errors
    ///
    /// Returns the [`Violation`] of the first failing check; later checks
    /// are not run.
    pub fn run(&self, request: &RawRequest) -> Result<(), Violation> {
        for check in &self.checks {
            tracing::trace!(request_id = %request.request_id(), check = check.name(), "running check");
            check.check(request)?;
        }
        Ok(())
    }

    /// Returns the number of checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns `true` if the gate has no checks.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Returns the check names in run order.
    pub fn names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate").field("checks", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn token_check() -> RequireHeader {
        RequireHeader::equals("X-Token", "fake-super-secret-token")
    }

    #[test]
    fn missing_header_is_reported() {
        let err = token_check().check(&RawRequest::new("req-1")).unwrap_err();

        assert_eq!(
            err.kind,
            ViolationKind::MissingHeader {
                name: "X-Token".to_string()
            }
        );
    }

    #[test]
    fn wrong_header_value_is_invalid() {
        let mut request = RawRequest::new("req-1");
        request.add_header("X-Token", "nope");

        let err = token_check().check(&request).unwrap_err();
        assert!(matches!(err.kind, ViolationKind::InvalidHeader { .. }));
        assert_eq!(err.message, "X-Token header invalid");
        assert!(!err.to_string().contains("fake-super-secret-token"));
    }

    #[test]
    fn require_deduplicates_by_name() {
        let gate = Gate::new()
            .require(token_check())
            .require(token_check())
            .require(RequireHeader::equals("x-token", "other"));

        assert_eq!(gate.len(), 1);
        assert_eq!(gate.names(), vec!["require-header:x-token"]);
    }

    #[test]
    fn run_stops_at_first_violation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let gate = Gate::new()
            .require(token_check())
            .require(check_fn("count", move |_: &RawRequest| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));

        assert!(gate.run(&RawRequest::new("req-1")).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let mut request = RawRequest::new("req-2");
        request.add_header("x-token", "fake-super-secret-token");
        assert!(gate.run(&request).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_gate_admits_everything() {
        let gate = Gate::new();
        assert!(gate.is_empty());
        assert!(gate.run(&RawRequest::new("req-1")).is_ok());
    }
}
