//! The dynamic-destination directive `scheme:template?dynamicParameter=<expr>`.

use crate::{
    error::{Result, StencilError},
    expression::ParameterExpression,
    uri::EndpointUri,
};
use std::{fmt, str::FromStr};

/// Name of the query parameter carrying the per-message expression.
pub const DYNAMIC_PARAMETER: &str = "dynamicParameter";

/// A parsed dynamic-destination directive.
///
/// The path of the URI names the template; the `dynamicParameter` query value
/// is evaluated against each message to produce the parameter half of the
/// endpoint key. Any scheme is accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicDirective {
    uri: EndpointUri,
    expression: ParameterExpression,
}

impl DynamicDirective {
    /// Parses a directive such as `template:name?dynamicParameter=${body}`.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: String| StencilError::InvalidDirective {
            directive: raw.to_string(),
            reason,
        };

        let uri = EndpointUri::parse(raw).map_err(|e| invalid(e.to_string()))?;

        let mut expression = None;
        for (name, value) in uri.params() {
            if name != DYNAMIC_PARAMETER {
                return Err(invalid(format!("unknown parameter `{name}`")));
            }
            if expression.is_some() {
                return Err(invalid(format!("`{DYNAMIC_PARAMETER}` given twice")));
            }
            expression = Some(ParameterExpression::parse(value)?);
        }
        let expression =
            expression.ok_or_else(|| invalid(format!("missing `{DYNAMIC_PARAMETER}`")))?;

        Ok(Self { uri, expression })
    }

    /// Name of the template this directive instantiates.
    pub fn template(&self) -> &str {
        self.uri.path()
    }

    /// The expression evaluated per message.
    pub fn expression(&self) -> &ParameterExpression {
        &self.expression
    }

    /// The directive as written.
    pub fn as_str(&self) -> &str {
        self.uri.as_str()
    }
}

impl fmt::Display for DynamicDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DynamicDirective {
    type Err = StencilError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
