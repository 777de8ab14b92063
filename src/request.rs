use std::collections::HashMap;

use crate::field::Source;

/// Already-demultiplexed request data, one bag per source.
///
/// `RawRequest` does not parse wire formats: framework integration code is
/// expected to fill it from its own request type (see [`ExtractRequest`]).
/// Query, header and form bags keep every value for a repeated key in
/// arrival order; header names are matched case-insensitively.
///
/// # Examples
///
/// ```
/// use request_binder::RawRequest;
///
/// let mut request = RawRequest::new("req-001");
/// request.add_path_param("item_id", "42");
/// request.add_query_param("tags", "rock");
/// request.add_query_param("tags", "metal");
/// request.add_header("User-Agent", "curl/8.0");
///
/// assert_eq!(request.request_id(), "req-001");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRequest {
    request_id: String,
    path_params: HashMap<String, String>,
    query_params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    cookies: HashMap<String, String>,
    form_fields: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl RawRequest {
    /// Creates an empty request with the given request ID.
    ///
    /// The ID is only used to correlate log events.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Sets a path parameter, replacing any previous value.
    pub fn add_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.path_params.insert(key.into(), value.into());
    }

    /// Appends a query parameter.
    pub fn add_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query_params.push((key.into(), value.into()));
    }

    /// Appends a header value.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Sets a cookie, replacing any previous value.
    pub fn add_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Appends a form field value.
    pub fn add_form_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.form_fields.push((key.into(), value.into()));
    }

    /// Sets the decoded JSON body.
    pub fn set_body(&mut self, body: serde_json::Value) {
        self.body = Some(body);
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the decoded JSON body, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Returns the last value of a header, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.text_values(Source::Header, name).last().copied()
    }

    /// Returns every textual value for `key` in `source`, in arrival order.
    ///
    /// The body is not a textual source and always yields nothing here.
    pub(crate) fn text_values(&self, source: Source, key: &str) -> Vec<&str> {
        match source {
            Source::Path => self.path_params.get(key).map(String::as_str).into_iter().collect(),
            Source::Query => values_for(&self.query_params, |k| k == key),
            Source::Header => values_for(&self.headers, |k| k.eq_ignore_ascii_case(key)),
            Source::Cookie => self.cookies.get(key).map(String::as_str).into_iter().collect(),
            Source::Form => values_for(&self.form_fields, |k| k == key),
            Source::Body => Vec::new(),
        }
    }

    /// Returns the distinct keys present in a textual source.
    ///
    /// Header names are returned lowercased.
    pub(crate) fn keys(&self, source: Source) -> Vec<String> {
        let mut keys: Vec<String> = match source {
            Source::Path => self.path_params.keys().cloned().collect(),
            Source::Query => self.query_params.iter().map(|(k, _)| k.clone()).collect(),
            Source::Header => self
                .headers
                .iter()
                .map(|(k, _)| k.to_ascii_lowercase())
                .collect(),
            Source::Cookie => self.cookies.keys().cloned().collect(),
            Source::Form => self.form_fields.iter().map(|(k, _)| k.clone()).collect(),
            Source::Body => Vec::new(),
        };
        keys.sort();
        keys.dedup();
        keys
    }
}

fn values_for<'a>(pairs: &'a [(String, String)], matches: impl Fn(&str) -> bool) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| matches(k.as_str()))
        .map(|(_, v)| v.as_str())
        .collect()
}

/// Builds a [`RawRequest`] from a framework-specific request.
///
/// This trait is the boundary between a web framework and the binder.
/// Implementations only copy data into per-source bags; they do not
/// validate or coerce anything.
///
/// # Examples
///
/// ```
/// use request_binder::{ExtractRequest, RawRequest};
/// use std::collections::HashMap;
///
/// struct MyFrameworkRequest {
///     id: String,
///     query: HashMap<String, String>,
/// }
///
/// impl ExtractRequest for MyFrameworkRequest {
///     fn extract_request(&self) -> RawRequest {
///         let mut request = RawRequest::new(self.id.clone());
///         for (k, v) in &self.query {
///             request.add_query_param(k.clone(), v.clone());
///         }
///         request
///     }
/// }
/// ```
pub trait ExtractRequest {
    /// Copies the request's inputs into a [`RawRequest`].
    fn extract_request(&self) -> RawRequest;
}

impl ExtractRequest for RawRequest {
    fn extract_request(&self) -> RawRequest {
        self.clone()
    }
}
