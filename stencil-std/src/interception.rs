//! Send interception rules.
//!
//! A rule watches sends to one endpoint URI (or every URI sharing a prefix,
//! written with a trailing `*`) and routes the message to another endpoint
//! first. With `skip_original` the watched endpoint is not called at all.
//! Rules are applied by the instantiator when it lays out an instance's
//! stages, so they cost nothing per message.

use stencil_core::{EndpointUri, Result};

/// A single interception rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptRule {
    pattern: String,
    target: EndpointUri,
    skip_original: bool,
}

impl InterceptRule {
    /// Starts a rule matching sends to `pattern`.
    pub fn send_to(pattern: impl Into<String>) -> InterceptRuleBuilder {
        InterceptRuleBuilder {
            pattern: pattern.into(),
            skip_original: false,
        }
    }

    /// The URI or `prefix*` pattern this rule watches.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Where matching sends are diverted.
    pub fn target(&self) -> &EndpointUri {
        &self.target
    }

    /// Returns `true` if the watched endpoint is not called.
    pub fn skips_original(&self) -> bool {
        self.skip_original
    }

    /// Returns `true` if sends to `uri` are intercepted.
    pub fn matches(&self, uri: &EndpointUri) -> bool {
        match self.pattern.strip_suffix('*') {
            Some(prefix) => uri.as_str().starts_with(prefix),
            None => uri.as_str() == self.pattern,
        }
    }
}

/// Builder returned by [`InterceptRule::send_to`].
pub struct InterceptRuleBuilder {
    pattern: String,
    skip_original: bool,
}

impl InterceptRuleBuilder {
    /// Do not deliver to the intercepted endpoint.
    pub fn skip_original(mut self) -> Self {
        self.skip_original = true;
        self
    }

    /// Completes the rule with its target endpoint.
    pub fn to(self, target: &str) -> Result<InterceptRule> {
        Ok(InterceptRule {
            pattern: self.pattern,
            target: EndpointUri::parse(target)?,
            skip_original: self.skip_original,
        })
    }
}

/// Expands `uri` into the URIs actually called, in order, under `rules`.
pub(crate) fn apply<'a>(rules: &'a [InterceptRule], uri: &'a EndpointUri) -> Vec<&'a EndpointUri> {
    let mut out = Vec::new();
    let mut skip = false;
    for rule in rules.iter().filter(|rule| rule.matches(uri)) {
        out.push(&rule.target);
        skip |= rule.skip_original;
    }
    if !skip {
        out.push(uri);
    }
    out
}
