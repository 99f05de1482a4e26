//! Library API integration tests
use precis_core::*;
use tempfile::TempDir;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn load_fixture(name: &str) -> Document {
    let html = std::fs::read_to_string(get_fixture_path(name)).unwrap();
    Document::parse(&html).unwrap()
}

struct Echo;

impl Transform for Echo {
    async fn transform(&self, text: &str, mode: &str) -> std::result::Result<String, TransformError> {
        Ok(format!("```json\n[\"{} words\", \"mode {}\"]\n```", text.split_whitespace().count(), mode))
    }
}

#[test]
fn test_extract_single_article() {
    let doc = load_fixture("article.html");
    let body = extract_body(&doc, &ExtractConfig::default()).expect("should extract");

    assert_eq!(body.queries, vec!["article".to_string()]);
    assert_eq!(body.title.as_deref(), Some("Understanding Ownership in Rust"));
    assert!(body.container.is_some());
    assert!(body.text.starts_with("Understanding Ownership in Rust"));
    assert!(body.text.contains("Ownership is the set of rules"));
    assert!(body.text.contains("Lifetimes describe how long references stay valid."));
}

#[test]
fn test_extract_strips_boilerplate() {
    let doc = load_fixture("article.html");
    let text = extract_body(&doc, &ExtractConfig::default()).unwrap().text;

    for boilerplate in ["Summarize this page", "Share on social", "Sponsored", "Posted in Programming", "Popular posts"] {
        assert!(!text.contains(boilerplate), "{} should be stripped", boilerplate);
    }
    assert!(!text.contains("analytics"));
    assert!(!text.contains("interior mutability"));
}

#[test]
fn test_extract_combines_sibling_containers() {
    let doc = load_fixture("multi_column.html");
    let body = extract_body(&doc, &ExtractConfig::default()).expect("should extract");

    assert_eq!(body.queries, vec![".entry-content".to_string(), ".post-content".to_string()]);
    assert!(body.container.is_none());
    assert!(body.title.is_none());

    let (first, second) = body.text.split_once("\n\nAt the farmers market").unwrap();
    assert!(first.starts_with("The river trail reopened"));
    assert!(second.contains("open an hour later"));
    assert!(!body.text.contains("Subscribe"));
}

#[test]
fn test_extraction_outcomes() {
    let config = ExtractConfig::default();

    let err = extract_body(&load_fixture("no_container.html"), &config).unwrap_err();
    assert_eq!(err.code(), "no_container");

    let err = extract_body(&load_fixture("empty_article.html"), &config).unwrap_err();
    assert_eq!(err.code(), "no_text");

    match extract_body(&load_fixture("short.html"), &config).unwrap_err() {
        PrecisError::ArticleTooShort { actual_length, min_length } => {
            assert_eq!(actual_length, "Back in five minutes.".len());
            assert_eq!(min_length, 200);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_invalid_query_does_not_blank_result() {
    let doc = load_fixture("article.html");
    let config = ExtractConfig::builder().queries(vec!["[[nope".into(), "article".into()]).build();

    let body = extract_body(&doc, &config).unwrap();
    assert_eq!(body.queries, vec!["article".to_string()]);
}

#[test]
fn test_selection_takes_precedence() {
    let doc = load_fixture("no_container.html");
    let config = ExtractConfig::builder().min_length(10).build();

    let text = get_text_to_digest(&doc, Some("  A user selection long enough.  "), &config).unwrap();
    assert_eq!(text.source, DigestSource::Selection);
    assert_eq!(text.text, "  A user selection long enough.  ");

    let err = get_text_to_digest(&doc, Some("short"), &config).unwrap_err();
    assert!(matches!(err, PrecisError::SelectionTooShort { actual_length: 5, min_length: 10 }));

    let err = get_text_to_digest(&doc, Some("   "), &config).unwrap_err();
    assert_eq!(err.code(), "no_container");
}

#[test]
fn test_site_rules_pick_the_story() {
    let doc = load_fixture("site_specific.html");
    let mut settings = Settings::default();
    settings.site_rules.push(SiteRule {
        domains: vec!["*.example.com".into()],
        queries: vec![".story-body".into()],
        exclusions: ExclusionRules::default(),
        min_length: None,
    });

    let err = get_text_to_digest(&doc, None, &settings.extract_config_for(Some("example.org"))).unwrap_err();
    assert_eq!(err.code(), "article_too_short");

    let text = get_text_to_digest(&doc, None, &settings.extract_config_for(Some("news.example.com"))).unwrap();
    assert_eq!(text.source, DigestSource::Article);
    assert_eq!(text.title.as_deref(), Some("City council approves new library budget"));
    assert!(text.text.contains("seven to two"));
    assert!(!text.text.contains("Download our app"));
}

#[test]
fn test_explain_candidates() {
    let doc = load_fixture("multi_column.html");
    let config = ExtractConfig::builder()
        .queries(vec![".entry-content".into(), "article".into(), "p[".into(), ".post-content".into()])
        .build();
    let reports = explain_candidates(&doc, &config);

    assert_eq!(reports.len(), 4);
    assert!(matches!(&reports[0], QueryReport::Found { selected: true, tag, .. } if tag == "div"));
    assert!(matches!(&reports[1], QueryReport::NotFound { query } if query == "article"));
    assert!(matches!(&reports[2], QueryReport::Invalid { query } if query == "p["));
    assert!(matches!(&reports[3], QueryReport::Found { selected: true, .. }));

    let json = serde_json::to_value(&reports).unwrap();
    assert_eq!(json[1]["status"], "not_found");
}

#[test]
fn test_domain_patterns() {
    let patterns = ["example.com", "*.news.test", "/^intranet\\d+$/"];

    assert!(list_matches_host(&patterns, "www.example.com"));
    assert!(list_matches_host(&patterns, "local.news.test"));
    assert!(list_matches_host(&patterns, "intranet42"));
    assert!(!list_matches_host(&patterns, "example.com.evil.test"));
    assert!(!list_matches_host(&patterns, "news.test"));
}

#[tokio::test]
async fn test_digest_document_with_file_cache() {
    let temp_dir = TempDir::new().unwrap();
    let doc = load_fixture("article.html");
    let text = get_text_to_digest(&doc, None, &ExtractConfig::default()).unwrap();

    {
        let (shared, autosave) = cache::init(FileStore::new(temp_dir.path()), CacheConfig::default()).await.unwrap();
        let digester = Digester::new(shared.clone(), Echo);

        let digest = digester.digest(&text.text, "summary").await.unwrap();
        assert!(digest.ends_with("words\n\nmode summary"));
        assert!(shared.lock().await.save().await.unwrap());
        autosave.abort();
    }

    assert!(temp_dir.path().join("digest_cache.json").exists());

    let (shared, autosave) = cache::init(FileStore::new(temp_dir.path()), CacheConfig::default()).await.unwrap();
    let digester = Digester::new(shared, Echo);
    assert!(digester.is_cached(&text.text, "summary").await);
    digester.digest(&text.text, "summary").await.unwrap();
    assert_eq!(digester.stats().transform_calls, 0);
    assert_eq!(digester.stats().cache_hits, 1);
    autosave.abort();
}

#[tokio::test]
async fn test_settings_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path());

    let mut settings = Settings::default();
    settings.disabled_domains.push("mail.example.com".into());
    settings.min_length = 150;
    settings.save(&store).await.unwrap();

    let loaded = Settings::load(&store).await.unwrap();
    assert_eq!(loaded, settings);
    assert!(loaded.is_disabled("mail.example.com"));
    assert!(temp_dir.path().join("disabled_domains.json").exists());
}
