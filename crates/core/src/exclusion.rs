//! Self/ancestor exclusion rules.
//!
//! An [`ExclusionRules`] value removes boilerplate either by direct match
//! (`self` patterns) or by ancestry (`ancestors` patterns). Rules are
//! serialized as `{"self": [...], "ancestors": [...]}`; a missing or `null`
//! list is read as an empty one.
//!
//! # Example
//!
//! ```rust
//! use precis_core::exclusion::{ExclusionRules, is_excluded};
//! use precis_core::parse::Document;
//!
//! let doc = Document::parse("<nav><a id='x'>Home</a></nav><p id='y'>Body</p>").unwrap();
//! let rules = ExclusionRules::new(vec!["p.ad".into()], vec!["nav".into()]);
//!
//! let link = doc.query_first("#x").unwrap();
//! let para = doc.query_first("#y").unwrap();
//! assert!(is_excluded(link.as_ref(), &rules));
//! assert!(!is_excluded(para.as_ref(), &rules));
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::parse::Element;
use crate::pattern::SelectorSet;

/// Self and ancestor exclusion patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRules {
    /// Elements matching any of these are excluded.
    #[serde(rename = "self", default, deserialize_with = "null_as_empty")]
    pub self_patterns: Vec<String>,
    /// Elements with an ancestor matching any of these are excluded.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ancestors: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExclusionRules {
    pub fn new(self_patterns: Vec<String>, ancestors: Vec<String>) -> Self {
        Self { self_patterns, ancestors }
    }

    pub fn is_empty(&self) -> bool {
        self.self_patterns.is_empty() && self.ancestors.is_empty()
    }

    /// Appends the other rule set's patterns, skipping duplicates.
    pub fn merge(&mut self, other: &ExclusionRules) {
        for pattern in &other.self_patterns {
            if !self.self_patterns.contains(pattern) {
                self.self_patterns.push(pattern.clone());
            }
        }
        for pattern in &other.ancestors {
            if !self.ancestors.contains(pattern) {
                self.ancestors.push(pattern.clone());
            }
        }
    }

    /// Compiles both lists once for repeated evaluation.
    pub fn compile(&self) -> CompiledExclusions {
        CompiledExclusions {
            self_set: SelectorSet::compile(&self.self_patterns),
            ancestor_set: SelectorSet::compile(&self.ancestors),
        }
    }
}

/// Patterns from an [`ExclusionRules`] that matched a particular element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionMatches {
    #[serde(rename = "self")]
    pub self_patterns: Vec<String>,
    pub ancestors: Vec<String>,
}

impl ExclusionMatches {
    pub fn is_empty(&self) -> bool {
        self.self_patterns.is_empty() && self.ancestors.is_empty()
    }
}

/// [`ExclusionRules`] with every pattern compiled.
#[derive(Debug, Clone, Default)]
pub struct CompiledExclusions {
    self_set: SelectorSet,
    ancestor_set: SelectorSet,
}

impl CompiledExclusions {
    /// Whether `node` is excluded. A missing node is always excluded.
    ///
    /// `self` patterns are checked first; both passes stop at the first match.
    pub fn is_excluded(&self, node: Option<&Element<'_>>) -> bool {
        let Some(node) = node else {
            return true;
        };
        self.self_set.any_self(node) || self.ancestor_set.any_ancestor(node)
    }

    /// Whether `node` itself matches any pattern from either list.
    ///
    /// Used when stripping a container: removing a node that matches an
    /// `ancestors` pattern removes everything that pattern would exclude.
    pub fn strips(&self, node: &Element<'_>) -> bool {
        self.self_set.any_self(node) || self.ancestor_set.any_self(node)
    }

    pub fn matching(&self, node: &Element<'_>) -> ExclusionMatches {
        ExclusionMatches {
            self_patterns: self.self_set.matching_self(node),
            ancestors: self.ancestor_set.matching_ancestors(node),
        }
    }

    /// Every pattern in either list that failed to compile.
    pub fn invalid_patterns(&self) -> Vec<String> {
        self.self_set
            .invalid_patterns()
            .chain(self.ancestor_set.invalid_patterns())
            .map(str::to_string)
            .collect()
    }
}

/// Whether `node` is excluded by `rules`. A missing node is always excluded.
pub fn is_excluded(node: Option<&Element<'_>>, rules: &ExclusionRules) -> bool {
    rules.compile().is_excluded(node)
}

/// Patterns from `patterns` that `node` itself matches.
pub fn find_matching_selectors<S: AsRef<str>>(node: &Element<'_>, patterns: &[S]) -> Vec<String> {
    SelectorSet::compile(patterns).matching_self(node)
}

/// Which self and ancestor patterns of `rules` apply to `node`.
pub fn find_matching_exclusions(node: &Element<'_>, rules: &ExclusionRules) -> ExclusionMatches {
    rules.compile().matching(node)
}
