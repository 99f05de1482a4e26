//! Domain patterns.
//!
//! A domain pattern takes one of three forms:
//!
//! - `/…/`: the interior is a regular expression searched in the hostname
//! - a glob containing `*` or `?`: anchored to the whole hostname
//! - a bare hostname: matches itself and any subdomain
//!
//! All forms match case-insensitively. Patterns that cannot be compiled never
//! match; they are not errors.
//!
//! # Example
//!
//! ```rust
//! use precis_core::pattern::compile_domain_pattern;
//!
//! let matcher = compile_domain_pattern("example.com").unwrap();
//! assert!(matcher.is_match("www.example.com"));
//! assert!(!matcher.is_match("notexample.com"));
//! ```

use regex::{Regex, RegexBuilder};

/// Which form a domain pattern was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainPatternKind {
    /// `/…/` literal regular expression.
    Regex,
    /// Glob with `*` and `?` wildcards.
    Glob,
    /// Bare hostname, also matching subdomains.
    Host,
}

/// A compiled, case-insensitive hostname matcher.
#[derive(Debug, Clone)]
pub struct DomainMatcher {
    pattern: String,
    kind: DomainPatternKind,
    regex: Regex,
}

impl DomainMatcher {
    /// Whether `host` matches this pattern.
    pub fn is_match(&self, host: &str) -> bool {
        self.regex.is_match(host)
    }

    /// The trimmed source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn kind(&self) -> DomainPatternKind {
        self.kind
    }
}

/// Compiles a domain pattern.
///
/// Returns `None` for empty input, for a `/…/` literal with an empty or
/// invalid body, and never panics.
pub fn compile_domain_pattern(pattern: &str) -> Option<DomainMatcher> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return None;
    }

    let (kind, source) = if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        let body = &pattern[1..pattern.len() - 1];
        if body.is_empty() {
            return None;
        }
        (DomainPatternKind::Regex, body.to_string())
    } else if pattern.contains(['*', '?']) {
        (DomainPatternKind::Glob, glob_to_regex(pattern))
    } else {
        (DomainPatternKind::Host, format!(r"(?:^|\.){}$", regex::escape(pattern)))
    };

    let regex = RegexBuilder::new(&source).case_insensitive(true).build().ok()?;
    Some(DomainMatcher { pattern: pattern.to_string(), kind, regex })
}

fn glob_to_regex(glob: &str) -> String {
    let mut source = String::with_capacity(glob.len() + 8);
    source.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    source
}

/// Whether any pattern in `patterns` matches `host`.
///
/// Empty and invalid patterns are skipped.
pub fn list_matches_host<S: AsRef<str>>(patterns: &[S], host: &str) -> bool {
    patterns
        .iter()
        .filter_map(|pattern| compile_domain_pattern(pattern.as_ref()))
        .any(|matcher| matcher.is_match(host))
}
