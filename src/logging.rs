use std::fmt;

/// A request-scoped logging handle.
///
/// Every event carries the request ID and the endpoint name so that one
/// request can be followed across gate and binding.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestLog<'a> {
    request_id: &'a str,
    endpoint: &'a str,
}

impl<'a> RequestLog<'a> {
    pub(crate) fn new(request_id: &'a str, endpoint: &'a str) -> Self {
        Self {
            request_id,
            endpoint,
        }
    }

    pub(crate) fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, endpoint = %self.endpoint, "{}", args);
    }

    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, endpoint = %self.endpoint, "{}", args);
    }

    pub(crate) fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, endpoint = %self.endpoint, "{}", args);
    }
}
