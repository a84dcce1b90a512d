// ABOUTME: Ordered keyword rules plus a fallback pool that map free text to a canned answer.
// ABOUTME: First matching rule wins; unmatched input draws a fallback from an injected RNG.

use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

/// Problems with a rule table, reported before any engine is built.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuleError {
    #[error("fallback pool is empty")]
    EmptyFallbackPool,

    #[error("fallback response {0} is empty")]
    EmptyFallback(usize),

    #[error("rule '{0}' has an empty response")]
    EmptyResponse(String),

    #[error("rule '{0}' has no keyword groups")]
    NoKeywordGroups(String),

    #[error("rule '{0}' has an empty keyword group")]
    EmptyKeywordGroup(String),

    #[error("rule '{0}' has a blank keyword")]
    BlankKeyword(String),

    #[error("rule id '{0}' is declared twice")]
    DuplicateRule(String),
}

/// One predicate/response pair.
///
/// The predicate is a conjunction of keyword groups. A group is satisfied when
/// the normalized input contains any one of its keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub id: String,
    groups: Vec<Vec<String>>,
    pub response: String,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        groups: Vec<Vec<String>>,
        response: impl Into<String>,
    ) -> Self {
        let groups = groups
            .into_iter()
            .map(|group| group.into_iter().map(|k| k.to_lowercase()).collect())
            .collect();
        Self {
            id: id.into(),
            groups,
            response: response.into(),
        }
    }

    /// Keyword groups, lowercased
    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    /// `normalized` must already be lowercased
    pub fn matches(&self, normalized: &str) -> bool {
        self.groups
            .iter()
            .all(|group| group.iter().any(|k| normalized.contains(k.as_str())))
    }

    fn validate(&self) -> Result<(), RuleError> {
        if self.response.trim().is_empty() {
            return Err(RuleError::EmptyResponse(self.id.clone()));
        }
        if self.groups.is_empty() {
            return Err(RuleError::NoKeywordGroups(self.id.clone()));
        }
        for group in &self.groups {
            if group.is_empty() {
                return Err(RuleError::EmptyKeywordGroup(self.id.clone()));
            }
            if group.iter().any(|k| k.trim().is_empty()) {
                return Err(RuleError::BlankKeyword(self.id.clone()));
            }
        }
        Ok(())
    }
}

/// The ordered rule list and fallback pool for one domain.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
    fallbacks: Vec<String>,
}

impl RuleEngine {
    pub fn new(rules: Vec<Rule>, fallbacks: Vec<String>) -> Result<Self, RuleError> {
        if fallbacks.is_empty() {
            return Err(RuleError::EmptyFallbackPool);
        }
        if let Some(index) = fallbacks.iter().position(|f| f.trim().is_empty()) {
            return Err(RuleError::EmptyFallback(index));
        }

        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleError::DuplicateRule(rule.id.clone()));
            }
        }

        Ok(Self { rules, fallbacks })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn fallbacks(&self) -> &[String] {
        &self.fallbacks
    }

    /// The first rule in declaration order whose predicate holds for `text`
    pub fn matching_rule(&self, text: &str) -> Option<&Rule> {
        let normalized = text.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&normalized))
    }

    /// Resolve `text` to a response. Never fails and never returns an empty string.
    pub fn resolve<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> &str {
        if let Some(rule) = self.matching_rule(text) {
            tracing::debug!(rule = %rule.id, "Rule matched");
            return &rule.response;
        }

        let index = rng.gen_range(0..self.fallbacks.len());
        tracing::debug!(fallback = index, "No rule matched, using fallback");
        &self.fallbacks[index]
    }
}
