//! Pattern compilation for the two small pattern languages precis accepts:
//! domain patterns matched against hostnames, and CSS selectors evaluated
//! against document elements.

pub mod domain;
pub mod selector;

pub use domain::{DomainMatcher, DomainPatternKind, compile_domain_pattern, list_matches_host};
pub use selector::{CompiledSelector, MatchOutcome, SelectorSet};
