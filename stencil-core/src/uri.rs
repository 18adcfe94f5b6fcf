//! Endpoint URIs of the form `scheme:path?name=value&...`.

use crate::error::UriError;
use std::{fmt, str::FromStr};

/// A parsed endpoint URI.
///
/// The scheme selects the component that creates the endpoint; the path names
/// the endpoint within that component. The raw text is kept verbatim and is
/// the identity used by catalogs and interception rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointUri {
    raw: String,
    scheme: Option<String>,
    path: String,
    params: Vec<(String, String)>,
}

impl EndpointUri {
    /// Parses `scheme:path?query`. The scheme is optional.
    pub fn parse(raw: &str) -> Result<Self, UriError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(UriError::Empty);
        }

        let (head, query) = match raw.split_once('?') {
            Some((head, query)) => (head, Some(query)),
            None => (raw, None),
        };

        let (scheme, path) = match head.split_once(':') {
            Some((scheme, path)) => {
                let valid = !scheme.is_empty()
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'));
                if !valid {
                    return Err(UriError::InvalidScheme(raw.to_string()));
                }
                (Some(scheme.to_string()), path)
            }
            None => (None, head),
        };

        let path = path.trim_start_matches("//");
        if path.is_empty() {
            return Err(UriError::EmptyPath(raw.to_string()));
        }

        let params = query
            .into_iter()
            .flat_map(|q| q.split('&'))
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((name, value)) => (name.to_string(), value.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();

        Ok(Self {
            raw: raw.to_string(),
            scheme,
            path: path.to_string(),
            params,
        })
    }

    /// The URI as written, trimmed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The scheme before the first `:`, if any.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// The part between the scheme and the query.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the first query parameter with the given name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Query parameters in the order they appear.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl fmt::Display for EndpointUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for EndpointUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheme_path_and_query() {
        let uri = EndpointUri::parse("kamelet:template?dynamicParameter=${body}&x").unwrap();
        assert_eq!(uri.scheme(), Some("kamelet"));
        assert_eq!(uri.path(), "template");
        assert_eq!(uri.param("dynamicParameter"), Some("${body}"));
        assert_eq!(uri.param("x"), Some(""));
        assert_eq!(uri.to_string(), "kamelet:template?dynamicParameter=${body}&x");
    }

    #[test]
    fn scheme_is_optional_and_slashes_are_stripped() {
        let bare = EndpointUri::parse("template").unwrap();
        assert_eq!(bare.scheme(), None);
        assert_eq!(bare.path(), "template");

        let slashed = EndpointUri::parse("kamelet://template").unwrap();
        assert_eq!(slashed.path(), "template");
    }

    #[test]
    fn rejects_malformed_uris() {
        assert_eq!(EndpointUri::parse("  "), Err(UriError::Empty));
        assert!(matches!(
            EndpointUri::parse("mock:"),
            Err(UriError::EmptyPath(_))
        ));
        assert!(matches!(
            EndpointUri::parse("mo ck:some"),
            Err(UriError::InvalidScheme(_))
        ));
    }
}
