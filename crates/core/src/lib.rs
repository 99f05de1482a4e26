pub mod cache;
pub mod digest;
pub mod error;
pub mod exclusion;
pub mod extract;
pub mod fetch;
pub mod parse;
pub mod pattern;
pub mod settings;
pub mod store;

pub use cache::{CacheConfig, CacheEntry, DigestCache, SharedCache};
pub use digest::{DigestStats, Digester, Transform, TransformError, normalize_response};
pub use error::{PrecisError, Result};
pub use exclusion::{ExclusionMatches, ExclusionRules, find_matching_exclusions, find_matching_selectors, is_excluded};
pub use extract::{
    ContainerCandidate, ContainerChoice, DigestSource, ExtractConfig, ExtractConfigBuilder, ExtractedBody, QueryReport,
    SelectionThresholds, TextToDigest, explain_candidates, extract_body, get_text_to_digest, select_containers,
};
pub use fetch::{FetchConfig, InputSource, LoadedInput, fetch_file, fetch_stdin, load_input};
#[cfg(feature = "fetch")]
pub use fetch::fetch_url;
pub use parse::{Document, Element};
pub use pattern::{DomainMatcher, compile_domain_pattern, list_matches_host};
pub use settings::{Settings, SiteRule, host_from_url};
pub use store::{FileStore, KeyValueStore, MemoryStore};
