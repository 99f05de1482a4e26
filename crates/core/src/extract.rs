//! Content container scoring and selection.
//!
//! Given an ordered list of content queries (most specific first), every
//! query's first match becomes a [`ContainerCandidate`] scored by the share of
//! the document's text it holds. A candidate that clearly dominates is used
//! alone; otherwise all significant, mutually non-nested candidates are
//! combined. The selected containers are then stripped of excluded elements
//! and rendered to text.
//!
//! # Example
//!
//! ```rust
//! use precis_core::extract::{ExtractConfig, extract_body};
//! use precis_core::parse::Document;
//!
//! let html = format!(
//!     "<html><body><nav>Home | About</nav><article><h1>A headline for the story</h1><p>{}</p></article></body></html>",
//!     "Readable text. ".repeat(20),
//! );
//! let doc = Document::parse(&html).unwrap();
//! let config = ExtractConfig::builder().queries(vec!["article".into()]).min_length(50).build();
//!
//! let body = extract_body(&doc, &config).unwrap();
//! assert_eq!(body.title.as_deref(), Some("A headline for the story"));
//! assert!(body.text.contains("Readable text."));
//! ```

use serde::Serialize;
use tracing::debug;

use crate::exclusion::{CompiledExclusions, ExclusionMatches, ExclusionRules};
use crate::parse::{Document, Element};
use crate::pattern::{CompiledSelector, SelectorSet};
use crate::{PrecisError, Result};

/// A candidate holding more than this percentage of the document may be
/// selected alone.
pub const DOMINANT_PERCENT: u32 = 70;

/// The runner-up must hold less than this fraction of the best candidate's
/// percentage for the best candidate to be dominant.
pub const RUNNER_UP_RATIO: f64 = 0.5;

/// Minimum percentage for a candidate to take part in a combination.
pub const SIGNIFICANT_PERCENT: u32 = 15;

/// Default minimum length of extracted text, in characters.
pub const DEFAULT_MIN_LENGTH: usize = 200;

/// Elements injected by precis front ends; never part of the article.
pub const UI_MARKER_SELECTOR: &str = "[data-precis-ui]";

/// Queries probed, in order, for the article title.
pub const TITLE_QUERIES: &[&str] = &[
    r#"[itemprop="headline"]"#,
    "h1",
    "h2",
    r#"[class*="headline"]"#,
    r#"[class*="title"]"#,
];

/// Accepted title lengths are strictly between these bounds.
const TITLE_MIN_CHARS: usize = 10;
const TITLE_MAX_CHARS: usize = 300;

/// Separator placed between the texts of combined containers.
pub const CONTAINER_SEPARATOR: &str = "\n\n";

/// Tunable constants of the container selection heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionThresholds {
    /// See [`DOMINANT_PERCENT`].
    pub dominant_percent: u32,
    /// See [`RUNNER_UP_RATIO`].
    pub runner_up_ratio: f64,
    /// See [`SIGNIFICANT_PERCENT`].
    pub significant_percent: u32,
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        Self {
            dominant_percent: DOMINANT_PERCENT,
            runner_up_ratio: RUNNER_UP_RATIO,
            significant_percent: SIGNIFICANT_PERCENT,
        }
    }
}

/// Configuration for body extraction.
///
/// # Example
///
/// ```rust
/// use precis_core::extract::ExtractConfig;
///
/// let config = ExtractConfig::builder()
///     .queries(vec!["article".into(), "main".into()])
///     .min_length(300)
///     .build();
/// assert_eq!(config.min_length, 300);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Content queries in priority order, most specific first.
    pub queries: Vec<String>,
    /// Elements stripped from the selected containers.
    pub exclusions: ExclusionRules,
    /// Minimum number of characters for an acceptable result.
    pub min_length: usize,
    /// Selection heuristic constants.
    pub thresholds: SelectionThresholds,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            queries: crate::settings::default_content_queries(),
            exclusions: crate::settings::default_exclusions(),
            min_length: DEFAULT_MIN_LENGTH,
            thresholds: SelectionThresholds::default(),
        }
    }
}

impl ExtractConfig {
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::new()
    }
}

/// Builder for [`ExtractConfig`].
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ExtractConfig::default() }
    }

    /// Replaces the content queries.
    pub fn queries(mut self, queries: Vec<String>) -> Self {
        self.config.queries = queries;
        self
    }

    /// Replaces the exclusion rules.
    pub fn exclusions(mut self, exclusions: ExclusionRules) -> Self {
        self.config.exclusions = exclusions;
        self
    }

    /// Sets the minimum text length.
    pub fn min_length(mut self, value: usize) -> Self {
        self.config.min_length = value;
        self
    }

    /// Sets the selection thresholds.
    pub fn thresholds(mut self, thresholds: SelectionThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn build(self) -> ExtractConfig {
        self.config
    }
}

impl Default for ExtractConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A document region found by one content query.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerCandidate<N> {
    /// The query that found this node.
    pub query: String,
    pub node: N,
    /// Rendered text length before cleaning, in characters.
    pub raw_length: usize,
    /// `raw_length` as a rounded percentage of the document's text length.
    pub percent: u32,
}

/// Which containers the selection heuristic settled on.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerChoice<N> {
    /// The largest candidate dominates every other one.
    Dominant(ContainerCandidate<N>),
    /// Several significant, mutually non-nested candidates, largest first.
    Combined(Vec<ContainerCandidate<N>>),
    /// No dominant candidate and nothing to combine; the largest one is used.
    Largest(ContainerCandidate<N>),
}

impl<N> ContainerChoice<N> {
    /// The selected candidates, largest first.
    pub fn candidates(&self) -> &[ContainerCandidate<N>] {
        match self {
            ContainerChoice::Dominant(candidate) | ContainerChoice::Largest(candidate) => {
                std::slice::from_ref(candidate)
            }
            ContainerChoice::Combined(candidates) => candidates,
        }
    }
}

/// Rounded percentage of `raw_length` in a document of `document_length`
/// characters. A zero document length counts as one.
pub fn percent_of(raw_length: usize, document_length: usize) -> u32 {
    let document_length = document_length.max(1);
    (100.0 * raw_length as f64 / document_length as f64).round() as u32
}

/// Applies the dominance and combination rules to a set of candidates.
///
/// `is_ancestor(a, b)` must return whether `a` strictly contains `b`.
/// Returns `None` when there are no candidates.
pub fn select_containers<N, F>(
    mut candidates: Vec<ContainerCandidate<N>>, min_length: usize, thresholds: &SelectionThresholds, is_ancestor: F,
) -> Option<ContainerChoice<N>>
where
    F: Fn(&N, &N) -> bool,
{
    if candidates.is_empty() {
        return None;
    }

    // Stable: equal lengths keep query priority.
    candidates.sort_by(|a, b| b.raw_length.cmp(&a.raw_length));

    let best_percent = candidates[0].percent;
    let dominant = best_percent > thresholds.dominant_percent
        && candidates
            .get(1)
            .is_none_or(|second| (second.percent as f64) < best_percent as f64 * thresholds.runner_up_ratio);

    if dominant {
        debug!(query = %candidates[0].query, percent = best_percent, "dominant container");
        return candidates.into_iter().next().map(ContainerChoice::Dominant);
    }

    let significant: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.percent >= thresholds.significant_percent && c.raw_length > min_length)
        .map(|(index, _)| index)
        .collect();

    let non_nested: Vec<usize> = significant
        .iter()
        .copied()
        .filter(|&i| {
            significant.iter().all(|&j| {
                i == j
                    || !(is_ancestor(&candidates[i].node, &candidates[j].node)
                        || is_ancestor(&candidates[j].node, &candidates[i].node))
            })
        })
        .collect();

    if non_nested.len() > 1 {
        debug!(count = non_nested.len(), "combining non-nested containers");
        let mut slots: Vec<Option<ContainerCandidate<N>>> = candidates.into_iter().map(Some).collect();
        let combined = non_nested.iter().filter_map(|&i| slots[i].take()).collect();
        return Some(ContainerChoice::Combined(combined));
    }

    debug!(query = %candidates[0].query, percent = best_percent, "falling back to largest container");
    candidates.into_iter().next().map(ContainerChoice::Largest)
}

/// Finds the first match of every query, skipping invalid queries, queries
/// with no match, and nodes already found by a higher-priority query.
pub fn find_candidates<'a>(doc: &'a Document, queries: &[String]) -> Vec<ContainerCandidate<Element<'a>>> {
    let document_length = doc.text_content().chars().count().max(1);
    let mut candidates: Vec<ContainerCandidate<Element<'a>>> = Vec::new();

    for query in queries {
        let Some(node) = CompiledSelector::compile(query).query_first(doc) else {
            continue;
        };
        if candidates.iter().any(|existing| existing.node == node) {
            continue;
        }

        let raw_length = node.rendered_text().chars().count();
        let percent = percent_of(raw_length, document_length);
        debug!(query = %query, raw_length, percent, "container candidate");
        candidates.push(ContainerCandidate { query: query.clone(), node, raw_length, percent });
    }

    candidates
}

/// Renders a container's text without UI-injected and excluded elements.
pub fn clean_text(container: &Element<'_>, exclusions: &CompiledExclusions) -> String {
    let ui = CompiledSelector::compile(UI_MARKER_SELECTOR);
    container.rendered_text_without(|el| ui.test_self(el).is_match() || exclusions.strips(el))
}

/// Probes [`TITLE_QUERIES`] in order for a plausible article title.
pub fn find_title(doc: &Document) -> Option<String> {
    TITLE_QUERIES.iter().find_map(|query| {
        let node = CompiledSelector::compile(query).query_first(doc)?;
        let title = node.rendered_text().split_whitespace().collect::<Vec<_>>().join(" ");
        let length = title.chars().count();
        (length > TITLE_MIN_CHARS && length < TITLE_MAX_CHARS).then_some(title)
    })
}

/// The article body extracted from a document.
#[derive(Debug, Clone)]
pub struct ExtractedBody<'a> {
    /// Cleaned text of the selected container(s).
    pub text: String,
    /// The container, when a single one was selected.
    pub container: Option<Element<'a>>,
    /// Title found next to a single container.
    pub title: Option<String>,
    /// Queries whose containers make up `text`, in output order.
    pub queries: Vec<String>,
}

/// Extracts the article body from `doc`.
///
/// # Errors
///
/// - [`PrecisError::NoContainer`] if no query matched anything
/// - [`PrecisError::NoText`] if a single selected container is empty after cleaning
/// - [`PrecisError::ArticleTooShort`] if the text is shorter than `config.min_length`,
///   including combined containers that all clean to nothing
pub fn extract_body<'a>(doc: &'a Document, config: &ExtractConfig) -> Result<ExtractedBody<'a>> {
    let candidates = find_candidates(doc, &config.queries);
    let choice = select_containers(candidates, config.min_length, &config.thresholds, |a, b| a.is_ancestor_of(b))
        .ok_or(PrecisError::NoContainer)?;
    let exclusions = config.exclusions.compile();

    match choice {
        ContainerChoice::Combined(containers) => {
            let parts: Vec<String> = containers
                .iter()
                .map(|c| clean_text(&c.node, &exclusions))
                .filter(|text| !text.is_empty())
                .collect();

            let text = parts.join(CONTAINER_SEPARATOR);
            check_length(&text, config.min_length)?;
            Ok(ExtractedBody {
                text,
                container: None,
                title: None,
                queries: containers.into_iter().map(|c| c.query).collect(),
            })
        }
        ContainerChoice::Dominant(best) | ContainerChoice::Largest(best) => {
            let title = find_title(doc);
            let text = clean_text(&best.node, &exclusions);
            if text.is_empty() {
                return Err(PrecisError::NoText);
            }
            check_length(&text, config.min_length)?;
            Ok(ExtractedBody { text, container: Some(best.node), title, queries: vec![best.query] })
        }
    }
}

fn check_length(text: &str, min_length: usize) -> Result<()> {
    let actual_length = text.chars().count();
    if actual_length < min_length {
        return Err(PrecisError::ArticleTooShort { actual_length, min_length });
    }
    Ok(())
}

/// Where the text handed to the summarizer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestSource {
    /// A user-made selection, used verbatim.
    Selection,
    /// The extracted article body.
    Article,
}

/// Text ready to be digested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextToDigest {
    pub text: String,
    pub source: DigestSource,
    pub title: Option<String>,
}

/// Picks the text to digest: the user's selection when there is one,
/// otherwise the extracted article body.
///
/// A selection consisting only of whitespace counts as no selection.
///
/// # Errors
///
/// [`PrecisError::SelectionTooShort`] when the selection is shorter than
/// `config.min_length`, otherwise the errors of [`extract_body`].
pub fn get_text_to_digest(doc: &Document, selection: Option<&str>, config: &ExtractConfig) -> Result<TextToDigest> {
    if let Some(selection) = selection.filter(|s| !s.trim().is_empty()) {
        let actual_length = selection.trim().chars().count();
        if actual_length < config.min_length {
            return Err(PrecisError::SelectionTooShort { actual_length, min_length: config.min_length });
        }
        return Ok(TextToDigest { text: selection.to_string(), source: DigestSource::Selection, title: None });
    }

    let body = extract_body(doc, config)?;
    Ok(TextToDigest { text: body.text, source: DigestSource::Article, title: body.title })
}

/// What one content query found, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryReport {
    Found {
        query: String,
        tag: String,
        raw_length: usize,
        percent: u32,
        /// Exclusion patterns that apply to the container itself.
        exclusions: ExclusionMatches,
        selected: bool,
    },
    NotFound { query: String },
    Invalid { query: String },
}

/// Reports, for every configured query, whether it matched, how its
/// container scored and whether the heuristic selected it.
pub fn explain_candidates(doc: &Document, config: &ExtractConfig) -> Vec<QueryReport> {
    let queries = SelectorSet::compile(&config.queries);
    let candidates = find_candidates(doc, &config.queries);
    let exclusions = config.exclusions.compile();
    let selected: Vec<String> = select_containers(
        candidates.clone(),
        config.min_length,
        &config.thresholds,
        |a: &Element<'_>, b: &Element<'_>| a.is_ancestor_of(b),
    )
    .map(|choice| choice.candidates().iter().map(|c| c.query.clone()).collect())
    .unwrap_or_default();

    queries
        .iter()
        .map(|compiled| {
            let query = compiled.pattern().to_string();
            if !compiled.is_valid() {
                return QueryReport::Invalid { query };
            }
            match compiled.query_first(doc) {
                None => QueryReport::NotFound { query },
                Some(node) => {
                    let (raw_length, percent) = candidates
                        .iter()
                        .find(|c| c.node == node)
                        .map(|c| (c.raw_length, c.percent))
                        .unwrap_or_default();
                    let is_selected = selected.contains(&query);
                    QueryReport::Found {
                        query,
                        tag: node.tag_name(),
                        raw_length,
                        percent,
                        exclusions: exclusions.matching(&node),
                        selected: is_selected,
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn candidate(id: u32, percent: u32, raw_length: usize) -> ContainerCandidate<u32> {
        ContainerCandidate { query: format!("q{}", id), node: id, raw_length, percent }
    }

    fn never_nested(_: &u32, _: &u32) -> bool {
        false
    }

    #[test]
    fn test_no_candidates() {
        let choice = select_containers(Vec::<ContainerCandidate<u32>>::new(), 0, &Default::default(), never_nested);
        assert!(choice.is_none());
    }

    #[test]
    fn test_dominant_candidate_selected_alone() {
        let candidates = vec![candidate(2, 30, 300), candidate(1, 80, 800)];
        let choice = select_containers(candidates, 100, &Default::default(), never_nested).unwrap();

        assert_eq!(choice, ContainerChoice::Dominant(candidate(1, 80, 800)));
    }

    #[test]
    fn test_single_large_candidate_is_dominant() {
        let choice = select_containers(vec![candidate(1, 71, 710)], 100, &Default::default(), never_nested).unwrap();
        assert!(matches!(choice, ContainerChoice::Dominant(_)));
    }

    #[rstest]
    #[case(70, 10)]
    #[case(80, 40)]
    #[case(90, 50)]
    fn test_not_dominant_at_boundaries(#[case] best: u32, #[case] second: u32) {
        let candidates = vec![candidate(1, best, best as usize * 10), candidate(2, second, second as usize * 10)];
        let choice = select_containers(candidates, 1000, &Default::default(), never_nested).unwrap();
        assert!(matches!(choice, ContainerChoice::Largest(_)));
    }

    #[test]
    fn test_non_dominant_candidates_combined() {
        let candidates = vec![candidate(1, 40, 400), candidate(2, 35, 350)];
        let choice = select_containers(candidates, 100, &Default::default(), never_nested).unwrap();

        assert_eq!(choice, ContainerChoice::Combined(vec![candidate(1, 40, 400), candidate(2, 35, 350)]));
    }

    #[test]
    fn test_insignificant_candidates_not_combined() {
        let candidates = vec![candidate(1, 40, 400), candidate(2, 14, 140), candidate(3, 20, 90)];
        let choice = select_containers(candidates, 100, &Default::default(), never_nested).unwrap();

        assert_eq!(choice, ContainerChoice::Largest(candidate(1, 40, 400)));
    }

    #[test]
    fn test_significance_boundaries() {
        let candidates = vec![candidate(1, 40, 400), candidate(2, 15, 150)];
        let choice = select_containers(candidates, 100, &Default::default(), never_nested).unwrap();
        assert_eq!(choice, ContainerChoice::Combined(vec![candidate(1, 40, 400), candidate(2, 15, 150)]));

        let candidates = vec![candidate(1, 40, 400), candidate(2, 35, 100)];
        let choice = select_containers(candidates, 100, &Default::default(), never_nested).unwrap();
        assert_eq!(choice, ContainerChoice::Largest(candidate(1, 40, 400)));
    }

    #[test]
    fn test_nested_candidates_never_combined() {
        // 1 contains 2; 3 stands alone.
        let nested = |a: &u32, b: &u32| *a == 1 && *b == 2;
        let candidates = vec![candidate(1, 60, 600), candidate(2, 40, 400), candidate(3, 30, 300)];
        let choice = select_containers(candidates, 100, &Default::default(), nested).unwrap();

        assert_eq!(choice, ContainerChoice::Largest(candidate(1, 60, 600)));
    }

    #[test]
    fn test_nested_pair_dropped_from_combination() {
        let nested = |a: &u32, b: &u32| *a == 1 && *b == 2;
        let candidates = vec![
            candidate(1, 50, 500),
            candidate(2, 30, 300),
            candidate(3, 25, 250),
            candidate(4, 20, 200),
        ];
        let choice = select_containers(candidates, 100, &Default::default(), nested).unwrap();

        let ids: Vec<u32> = choice.candidates().iter().map(|c| c.node).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = SelectionThresholds { dominant_percent: 30, runner_up_ratio: 0.9, significant_percent: 15 };
        let candidates = vec![candidate(1, 40, 400), candidate(2, 35, 350)];
        let choice = select_containers(candidates, 100, &thresholds, never_nested).unwrap();

        assert!(matches!(choice, ContainerChoice::Dominant(_)));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(2, 3), 67);
        assert_eq!(percent_of(5, 0), 500);
        assert_eq!(percent_of(0, 0), 0);
    }

    fn paragraph(word: &str, repeat: usize) -> String {
        format!("<p>{}</p>", format!("{} ", word).repeat(repeat))
    }

    fn config(queries: &[&str], min_length: usize) -> ExtractConfig {
        ExtractConfig::builder()
            .queries(queries.iter().map(|q| q.to_string()).collect())
            .exclusions(ExclusionRules::new(
                vec![".share".into(), "script".into()],
                vec![".comments".into()],
            ))
            .min_length(min_length)
            .build()
    }

    #[test]
    fn test_extract_dominant_container() {
        let html = format!(
            r#"<html><body>
                <nav>Home About Contact</nav>
                <article>
                    <h1>The headline of this article</h1>
                    {}
                    <div class="share">Share this on social media</div>
                    <section class="comments"><p>Great post!</p></section>
                    <div data-precis-ui="overlay">Summarize</div>
                </article>
            </body></html>"#,
            paragraph("lorem", 60)
        );
        let doc = Document::parse(&html).unwrap();
        let body = extract_body(&doc, &config(&["[[invalid", ".missing", "article"], 100)).unwrap();

        assert_eq!(body.title.as_deref(), Some("The headline of this article"));
        assert_eq!(body.queries, vec!["article".to_string()]);
        assert_eq!(body.container.unwrap().tag_name(), "article");
        assert!(body.text.contains("lorem lorem"));
        assert!(!body.text.contains("Share this"));
        assert!(!body.text.contains("Great post"));
        assert!(!body.text.contains("Summarize"));
        assert!(!body.text.contains("Home About"));
    }

    #[test]
    fn test_extract_combines_sibling_containers() {
        let html = format!(
            r#"<html><body>
                <div class="part-one">{}</div>
                <div class="part-two">{}</div>
                <footer>{}</footer>
            </body></html>"#,
            paragraph("alpha", 40),
            paragraph("beta", 40),
            paragraph("gamma", 30)
        );
        let doc = Document::parse(&html).unwrap();
        let body = extract_body(&doc, &config(&[".part-one", ".part-two"], 50)).unwrap();

        assert!(body.container.is_none());
        assert!(body.title.is_none());
        assert_eq!(body.queries.len(), 2);
        let (first, second) = body.text.split_once(CONTAINER_SEPARATOR).unwrap();
        assert!(first.starts_with("alpha") || first.starts_with("beta"));
        assert!(second.starts_with("alpha") || second.starts_with("beta"));
        assert!(!body.text.contains("gamma"));
    }

    #[test]
    fn test_extract_combined_too_short_after_cleaning() {
        let html = format!(
            r#"<html><body>
                <div class="part-one"><p>First short part.</p><div class="share">{}</div></div>
                <div class="part-two"><p>Second short part.</p><div class="share">{}</div></div>
            </body></html>"#,
            paragraph("share", 30),
            paragraph("share", 30)
        );
        let doc = Document::parse(&html).unwrap();
        let err = extract_body(&doc, &config(&[".part-one", ".part-two"], 100)).unwrap_err();

        match err {
            PrecisError::ArticleTooShort { actual_length, min_length } => {
                assert!(actual_length > 0 && actual_length < 100);
                assert_eq!(min_length, 100);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_extract_combined_all_excluded() {
        let html = format!(
            r#"<html><body>
                <div class="part-one"><div class="share">{}</div></div>
                <div class="part-two"><div class="share">{}</div></div>
            </body></html>"#,
            paragraph("share", 30),
            paragraph("share", 30)
        );
        let doc = Document::parse(&html).unwrap();
        let err = extract_body(&doc, &config(&[".part-one", ".part-two"], 100)).unwrap_err();

        assert!(matches!(err, PrecisError::ArticleTooShort { actual_length: 0, min_length: 100 }));
    }

    #[test]
    fn test_extract_nested_containers_not_combined() {
        let html = format!(
            r#"<html><body>
                <main><div class="inner">{}</div>{}</main>
                <aside>{}</aside>
            </body></html>"#,
            paragraph("inner", 40),
            paragraph("outer", 10),
            paragraph("side", 40)
        );
        let doc = Document::parse(&html).unwrap();
        let body = extract_body(&doc, &config(&[".inner", "main"], 50)).unwrap();

        assert!(body.container.is_some());
        assert_eq!(body.queries, vec!["main".to_string()]);
        assert!(!body.text.contains("side"));
    }

    #[test]
    fn test_extract_no_container() {
        let doc = Document::parse("<html><body><p>Nothing to see</p></body></html>").unwrap();
        let err = extract_body(&doc, &config(&["article", "[[bad"], 10)).unwrap_err();
        assert!(matches!(err, PrecisError::NoContainer));
    }

    #[test]
    fn test_extract_no_text() {
        let doc = Document::parse(r#"<html><body><article><div class="share">Share</div></article></body></html>"#)
            .unwrap();
        let err = extract_body(&doc, &config(&["article"], 10)).unwrap_err();
        assert!(matches!(err, PrecisError::NoText));
    }

    #[test]
    fn test_extract_too_short() {
        let doc = Document::parse("<html><body><article><p>Short text</p></article></body></html>").unwrap();
        let err = extract_body(&doc, &config(&["article"], 100)).unwrap_err();
        assert!(matches!(err, PrecisError::ArticleTooShort { actual_length: 10, min_length: 100 }));
    }

    #[test]
    fn test_title_length_bounds() {
        let doc = Document::parse(
            r#"<html><body><h1>Too short</h1><h2>A sufficiently long subtitle</h2><article>x</article></body></html>"#,
        )
        .unwrap();
        assert_eq!(find_title(&doc).as_deref(), Some("A sufficiently long subtitle"));

        let doc = Document::parse("<html><body><h1>Tiny</h1></body></html>").unwrap();
        assert!(find_title(&doc).is_none());
    }

    #[test]
    fn test_selection_bypasses_extraction() {
        let doc = Document::parse("<html><body></body></html>").unwrap();
        let selection = "  A selection that is long enough.  ";
        let result = get_text_to_digest(&doc, Some(selection), &config(&["article"], 20)).unwrap();

        assert_eq!(result.source, DigestSource::Selection);
        assert_eq!(result.text, selection);
    }

    #[test]
    fn test_selection_too_short() {
        let doc = Document::parse("<html><body></body></html>").unwrap();
        let err = get_text_to_digest(&doc, Some("tiny"), &config(&["article"], 20)).unwrap_err();
        assert!(matches!(err, PrecisError::SelectionTooShort { actual_length: 4, min_length: 20 }));
    }

    #[test]
    fn test_blank_selection_falls_through_to_article() {
        let html = format!("<html><body><article>{}</article></body></html>", paragraph("word", 30));
        let doc = Document::parse(&html).unwrap();
        let result = get_text_to_digest(&doc, Some("   "), &config(&["article"], 20)).unwrap();

        assert_eq!(result.source, DigestSource::Article);
        assert!(result.text.starts_with("word"));
    }

    #[test]
    fn test_explain_candidates() {
        let html = format!(
            r#"<html><body><article class="share">{}</article></body></html>"#,
            paragraph("word", 30)
        );
        let doc = Document::parse(&html).unwrap();
        let reports = explain_candidates(&doc, &config(&["article", "main", "[[x"], 20));

        assert_eq!(reports.len(), 3);
        match &reports[0] {
            QueryReport::Found { tag, percent, selected, exclusions, .. } => {
                assert_eq!(tag, "article");
                assert_eq!(*percent, 100);
                assert!(*selected);
                assert_eq!(exclusions.self_patterns, vec![".share".to_string()]);
            }
            other => panic!("unexpected report {:?}", other),
        }
        assert_eq!(reports[1], QueryReport::NotFound { query: "main".to_string() });
        assert_eq!(reports[2], QueryReport::Invalid { query: "[[x".to_string() });
    }
}
