//! Persisted extraction settings.
//!
//! Settings live in a [`KeyValueStore`], one JSON value per key:
//!
//! | key                | value                                              |
//! |--------------------|----------------------------------------------------|
//! | `content_queries`  | array of CSS selectors, most specific first        |
//! | `exclusions`       | `{"self": [...], "ancestors": [...]}`              |
//! | `site_rules`       | array of `{domains, queries, exclusions, min_length}` |
//! | `disabled_domains` | array of domain patterns                           |
//! | `min_length`       | number                                             |
//!
//! A missing key falls back to its default. A malformed value also falls back
//! to its default, with a warning, so a single bad key never blocks
//! extraction.
//!
//! # Example
//!
//! ```rust
//! use precis_core::exclusion::ExclusionRules;
//! use precis_core::settings::{Settings, SiteRule};
//!
//! let mut settings = Settings::default();
//! settings.disabled_domains.push("*.internal.example".into());
//! settings.site_rules.push(SiteRule {
//!     domains: vec!["blog.example.com".into()],
//!     queries: vec![".post-body".into()],
//!     exclusions: ExclusionRules::default(),
//!     min_length: Some(100),
//! });
//!
//! assert!(settings.is_disabled("wiki.internal.example"));
//!
//! let config = settings.extract_config_for(Some("blog.example.com"));
//! assert_eq!(config.queries[0], ".post-body");
//! assert_eq!(config.min_length, 100);
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::exclusion::ExclusionRules;
use crate::extract::{DEFAULT_MIN_LENGTH, ExtractConfig};
use crate::pattern::list_matches_host;
use crate::store::KeyValueStore;
use crate::{PrecisError, Result};

pub const CONTENT_QUERIES_KEY: &str = "content_queries";
pub const EXCLUSIONS_KEY: &str = "exclusions";
pub const SITE_RULES_KEY: &str = "site_rules";
pub const DISABLED_DOMAINS_KEY: &str = "disabled_domains";
pub const MIN_LENGTH_KEY: &str = "min_length";

/// Content queries used when none are configured, most specific first.
pub fn default_content_queries() -> Vec<String> {
    [
        r#"[itemprop="articleBody"]"#,
        ".entry-content",
        ".post-content",
        ".article-body",
        ".article-content",
        "article",
        r#"[role="main"]"#,
        "main",
        "#content",
        ".content",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Exclusions used when none are configured.
pub fn default_exclusions() -> ExclusionRules {
    let self_patterns = [
        "script",
        "style",
        "noscript",
        "template",
        "nav",
        "aside",
        "form",
        "button",
        "iframe",
        r#"[aria-hidden="true"]"#,
        ".advertisement",
        ".ad",
        ".ads",
        ".social-share",
        ".share-buttons",
        ".newsletter",
        ".related-posts",
    ];
    let ancestors = ["nav", "footer", ".comments", "#comments", ".sidebar"];

    ExclusionRules::new(
        self_patterns.into_iter().map(String::from).collect(),
        ancestors.into_iter().map(String::from).collect(),
    )
}

/// Extra queries and exclusions for a group of sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRule {
    /// Domain patterns this rule applies to.
    pub domains: Vec<String>,
    /// Queries tried before the global ones.
    #[serde(default)]
    pub queries: Vec<String>,
    /// Exclusions added to the global ones.
    #[serde(default)]
    pub exclusions: ExclusionRules,
    /// Overrides the global minimum length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
}

impl SiteRule {
    pub fn applies_to(&self, host: &str) -> bool {
        list_matches_host(&self.domains, host)
    }
}

/// User-editable extraction settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub content_queries: Vec<String>,
    pub exclusions: ExclusionRules,
    pub site_rules: Vec<SiteRule>,
    pub disabled_domains: Vec<String>,
    pub min_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            content_queries: default_content_queries(),
            exclusions: default_exclusions(),
            site_rules: Vec::new(),
            disabled_domains: Vec::new(),
            min_length: DEFAULT_MIN_LENGTH,
        }
    }
}

impl Settings {
    /// Reads every settings key from `store`.
    ///
    /// # Errors
    ///
    /// Only storage read failures are returned; bad values fall back to
    /// their defaults.
    pub async fn load<S: KeyValueStore>(store: &S) -> Result<Self> {
        let defaults = Settings::default();
        Ok(Self {
            content_queries: load_key(store, CONTENT_QUERIES_KEY, defaults.content_queries).await?,
            exclusions: load_key(store, EXCLUSIONS_KEY, defaults.exclusions).await?,
            site_rules: load_key(store, SITE_RULES_KEY, defaults.site_rules).await?,
            disabled_domains: load_key(store, DISABLED_DOMAINS_KEY, defaults.disabled_domains).await?,
            min_length: load_key(store, MIN_LENGTH_KEY, defaults.min_length).await?,
        })
    }

    /// Writes every settings key to `store`.
    ///
    /// # Errors
    ///
    /// Storage write failures.
    pub async fn save<S: KeyValueStore>(&self, store: &S) -> Result<()> {
        save_key(store, CONTENT_QUERIES_KEY, &self.content_queries).await?;
        save_key(store, EXCLUSIONS_KEY, &self.exclusions).await?;
        save_key(store, SITE_RULES_KEY, &self.site_rules).await?;
        save_key(store, DISABLED_DOMAINS_KEY, &self.disabled_domains).await?;
        save_key(store, MIN_LENGTH_KEY, &self.min_length).await
    }

    /// Whether extraction is turned off for `host`.
    pub fn is_disabled(&self, host: &str) -> bool {
        list_matches_host(&self.disabled_domains, host)
    }

    /// Site rules that apply to `host`, in configuration order.
    pub fn rules_for<'a>(&'a self, host: &'a str) -> impl Iterator<Item = &'a SiteRule> + 'a {
        self.site_rules.iter().filter(move |rule| rule.applies_to(host))
    }

    /// Resolves the extraction config for a page on `host`.
    ///
    /// Queries of matching site rules come first, in rule order, followed by
    /// the global queries. Exclusions are the global ones plus those of every
    /// matching rule. The last matching rule with a `min_length` overrides the
    /// global minimum. Without a host only the global settings apply.
    pub fn extract_config_for(&self, host: Option<&str>) -> ExtractConfig {
        let mut queries: Vec<String> = Vec::new();
        let mut exclusions = self.exclusions.clone();
        let mut min_length = self.min_length;

        if let Some(host) = host {
            for rule in self.rules_for(host) {
                debug!(host, domains = ?rule.domains, "applying site rule");
                push_unique(&mut queries, &rule.queries);
                exclusions.merge(&rule.exclusions);
                if let Some(value) = rule.min_length {
                    min_length = value;
                }
            }
        }
        push_unique(&mut queries, &self.content_queries);

        ExtractConfig::builder().queries(queries).exclusions(exclusions).min_length(min_length).build()
    }
}

fn push_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

async fn load_key<S, T>(store: &S, key: &str, default: T) -> Result<T>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(default);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed setting");
            Ok(default)
        }
    }
}

async fn save_key<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)
        .map_err(|e| PrecisError::Storage(format!("Failed to encode setting {}: {}", key, e)))?;
    store.set(key, &json).await
}

/// Hostname of `url`, lowercased, if it has one.
///
/// # Example
///
/// ```rust
/// use precis_core::settings::host_from_url;
///
/// assert_eq!(host_from_url("https://News.Example.com/a?b=c"), Some("news.example.com".to_string()));
/// assert_eq!(host_from_url("not a url"), None);
/// ```
pub fn host_from_url(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_lowercase)
}
