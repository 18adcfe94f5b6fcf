//! Per-message parameter expressions.
//!
//! An expression is literal text with `${...}` interpolations:
//!
//! - `${body}` - the envelope body
//! - `${header.NAME}` (or `${headers.NAME}`) - a header value
//!
//! Parsing happens once, when a directive is defined; evaluation is a pure
//! function of the parsed expression and the envelope and may run on any
//! number of threads at once.

use crate::{
    envelope::Envelope,
    error::{Result, StencilError},
};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Body,
    Header(String),
}

/// A parsed parameter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterExpression {
    source: String,
    segments: Vec<Segment>,
}

impl ParameterExpression {
    /// Parses an expression. Fails with [`StencilError::ParameterEvaluation`]
    /// on an empty expression, an unterminated `${` or an unknown function.
    pub fn parse(source: &str) -> Result<Self> {
        let fail = |reason: &str| StencilError::ParameterEvaluation {
            expression: source.to_string(),
            reason: reason.to_string(),
        };

        if source.is_empty() {
            return Err(fail("expression is empty"));
        }

        let mut segments = Vec::new();
        let mut rest = source;
        while let Some(start) = rest.find("${") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                return Err(fail("unterminated `${`"));
            };
            let function = after[..end].trim();
            let segment = if function == "body" {
                Segment::Body
            } else if let Some(name) = function
                .strip_prefix("header.")
                .or_else(|| function.strip_prefix("headers."))
                .filter(|name| !name.is_empty())
            {
                Segment::Header(name.to_string())
            } else {
                return Err(fail(&format!("unknown function `{function}`")));
            };
            segments.push(segment);
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Evaluates the expression against an envelope.
    pub fn evaluate(&self, envelope: &Envelope) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Body => out.push_str(envelope.body()),
                Segment::Header(name) => {
                    let value =
                        envelope
                            .header(name)
                            .ok_or_else(|| StencilError::ParameterEvaluation {
                                expression: self.source.clone(),
                                reason: format!("header `{name}` is not set"),
                            })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    /// True if the expression never reads the envelope.
    pub fn is_constant(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// The expression source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for ParameterExpression {
    type Err = StencilError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_body_headers_and_literals() {
        let expr = ParameterExpression::parse("tenant-${header.tenant}/${ body }").unwrap();
        let envelope = Envelope::new("order-7").with_header("tenant", "acme");
        assert_eq!(expr.evaluate(&envelope).unwrap(), "tenant-acme/order-7");
        assert!(!expr.is_constant());
    }

    #[test]
    fn headers_alias_is_accepted() {
        let expr: ParameterExpression = "${headers.region}".parse().unwrap();
        let envelope = Envelope::new("").with_header("region", "eu");
        assert_eq!(expr.evaluate(&envelope).unwrap(), "eu");
    }

    #[test]
    fn constant_expression_ignores_message() {
        let expr = ParameterExpression::parse("fixed").unwrap();
        assert!(expr.is_constant());
        assert_eq!(expr.evaluate(&Envelope::new("x")).unwrap(), "fixed");
    }

    #[test]
    fn missing_header_fails_evaluation() {
        let expr = ParameterExpression::parse("${header.tenant}").unwrap();
        let err = expr.evaluate(&Envelope::new("body")).unwrap_err();
        assert!(matches!(err, StencilError::ParameterEvaluation { reason, .. } if reason.contains("tenant")));
    }

    #[test]
    fn malformed_expressions_fail_parsing() {
        for bad in ["", "${body", "${now}", "${header.}"] {
            assert!(
                matches!(
                    ParameterExpression::parse(bad),
                    Err(StencilError::ParameterEvaluation { .. })
                ),
                "expected failure for {bad:?}"
            );
        }
    }
}
