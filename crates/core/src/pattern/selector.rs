//! Fault-tolerant evaluation of CSS selector patterns.
//!
//! Every place precis evaluates a user-supplied selector goes through
//! [`CompiledSelector`], which reports a tri-state [`MatchOutcome`]. An invalid
//! selector never fails the surrounding operation; it only ever produces
//! [`MatchOutcome::Invalid`], which callers treat as "no match".

use scraper::Selector;
use tracing::debug;

use crate::parse::{Document, Element, compile_selector};

/// Result of evaluating one selector pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    NotMatched,
    /// The pattern could not be compiled.
    Invalid,
}

impl MatchOutcome {
    /// `true` only for [`MatchOutcome::Matched`].
    pub fn is_match(self) -> bool {
        self == MatchOutcome::Matched
    }

    fn from_bool(matched: bool) -> Self {
        if matched { MatchOutcome::Matched } else { MatchOutcome::NotMatched }
    }
}

/// A selector pattern compiled once, keeping its source text.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    pattern: String,
    selector: Option<Selector>,
}

impl CompiledSelector {
    /// Compiles `pattern`. Invalid patterns are kept so they can be reported.
    pub fn compile(pattern: &str) -> Self {
        let selector = match compile_selector(pattern) {
            Ok(selector) => Some(selector),
            Err(e) => {
                debug!(pattern, error = %e, "skipping invalid selector");
                None
            }
        };
        Self { pattern: pattern.to_string(), selector }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_valid(&self) -> bool {
        self.selector.is_some()
    }

    /// Runs `probe` with the compiled selector.
    ///
    /// This is the single point where selector faults are absorbed.
    pub fn evaluate<F>(&self, probe: F) -> MatchOutcome
    where
        F: FnOnce(&Selector) -> bool,
    {
        match &self.selector {
            Some(selector) => MatchOutcome::from_bool(probe(selector)),
            None => MatchOutcome::Invalid,
        }
    }

    /// Tests the element itself.
    pub fn test_self(&self, element: &Element<'_>) -> MatchOutcome {
        self.evaluate(|selector| element.matches(selector))
    }

    /// Tests the element's strict ancestors.
    pub fn test_ancestors(&self, element: &Element<'_>) -> MatchOutcome {
        self.evaluate(|selector| element.ancestors().any(|ancestor| ancestor.matches(selector)))
    }

    /// First element in document order matching this selector.
    ///
    /// Returns `None` both when nothing matches and when the pattern is invalid.
    pub fn query_first<'a>(&self, doc: &'a Document) -> Option<Element<'a>> {
        self.selector.as_ref().and_then(|selector| doc.query_first_compiled(selector))
    }
}

/// An ordered list of compiled selectors.
#[derive(Debug, Clone, Default)]
pub struct SelectorSet {
    entries: Vec<CompiledSelector>,
}

impl SelectorSet {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self { entries: patterns.iter().map(|p| CompiledSelector::compile(p.as_ref())).collect() }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledSelector> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the element itself matches any selector.
    pub fn any_self(&self, element: &Element<'_>) -> bool {
        self.entries.iter().any(|entry| entry.test_self(element).is_match())
    }

    /// Whether any strict ancestor of the element matches any selector.
    pub fn any_ancestor(&self, element: &Element<'_>) -> bool {
        self.entries.iter().any(|entry| entry.test_ancestors(element).is_match())
    }

    /// Patterns the element itself matches, in list order.
    pub fn matching_self(&self, element: &Element<'_>) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.test_self(element).is_match())
            .map(|entry| entry.pattern.clone())
            .collect()
    }

    /// Patterns matched by a strict ancestor of the element, in list order.
    pub fn matching_ancestors(&self, element: &Element<'_>) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.test_ancestors(element).is_match())
            .map(|entry| entry.pattern.clone())
            .collect()
    }

    /// Source text of every pattern that failed to compile.
    pub fn invalid_patterns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter(|entry| !entry.is_valid()).map(|entry| entry.pattern())
    }
}
