//! Endpoint key resolution.

use stencil_core::{DynamicDirective, EndpointKey, Envelope, ParameterExpression, Result};

/// Computes the [`EndpointKey`] a message resolves to.
///
/// Stateless: safe to call from any number of threads at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointKeyResolver;

impl EndpointKeyResolver {
    /// Parses `raw_expression`, evaluates it against `envelope` and pairs the
    /// result with `template`.
    pub fn resolve(
        &self,
        template: &str,
        raw_expression: &str,
        envelope: &Envelope,
    ) -> Result<EndpointKey> {
        let expression = ParameterExpression::parse(raw_expression)?;
        self.resolve_expression(template, &expression, envelope)
    }

    /// Like [`resolve`](Self::resolve) with an already parsed expression.
    pub fn resolve_expression(
        &self,
        template: &str,
        expression: &ParameterExpression,
        envelope: &Envelope,
    ) -> Result<EndpointKey> {
        let parameter = expression.evaluate(envelope)?;
        Ok(EndpointKey::new(template, parameter))
    }

    /// Resolves the key a directive selects for `envelope`.
    pub fn resolve_directive(
        &self,
        directive: &DynamicDirective,
        envelope: &Envelope,
    ) -> Result<EndpointKey> {
        self.resolve_expression(directive.template(), directive.expression(), envelope)
    }
}
