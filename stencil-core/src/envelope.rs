//! The message travelling through a dispatcher.

use std::collections::BTreeMap;

/// A message body plus string headers.
///
/// Parameter expressions read from the envelope to select a destination, and
/// each stage of an endpoint instance receives and returns one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    body: String,
    headers: BTreeMap<String, String>,
}

impl Envelope {
    /// Create an envelope with the given body and no headers.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Adds a header, replacing any previous value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The message body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Consumes the envelope, returning its body.
    pub fn into_body(self) -> String {
        self.body
    }

    /// Returns the header named `name`, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Sets a header, replacing any previous value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Iterates over headers in name order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<&str> for Envelope {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<String> for Envelope {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}
