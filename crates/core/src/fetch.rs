//! Document loading from URLs, files and stdin.
//!
//! [`load_input`] accepts whatever the user typed: an `http(s)://` URL, `-`
//! for standard input, or a file path. URL fetching needs the `fetch` feature.

use std::fs;
use std::path::PathBuf;
#[cfg(feature = "fetch")]
use std::time::Duration;

#[cfg(feature = "fetch")]
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{PrecisError, Result};

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: "Mozilla/5.0 (compatible; precis/0.1)".to_string() }
    }
}

/// Where a document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Url(Url),
    File(PathBuf),
    Stdin,
}

impl InputSource {
    /// Classifies a user-supplied input string.
    ///
    /// `-` is stdin; anything with an `http` or `https` scheme is a URL;
    /// everything else is a path.
    pub fn parse(input: &str) -> Self {
        if input == "-" {
            return InputSource::Stdin;
        }
        match Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => InputSource::Url(url),
            _ => InputSource::File(PathBuf::from(input)),
        }
    }

    /// The source URL's host, lowercased.
    pub fn host(&self) -> Option<String> {
        match self {
            InputSource::Url(url) => url.host_str().map(str::to_lowercase),
            _ => None,
        }
    }
}

/// A loaded document with its origin.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub source: InputSource,
    pub html: String,
}

/// Loads the document named by `input`.
///
/// # Errors
///
/// [`PrecisError::FileNotFound`] for missing files, I/O errors for stdin,
/// and HTTP errors (or [`PrecisError::InvalidUrl`] without the `fetch`
/// feature) for URLs.
pub async fn load_input(input: &str, config: &FetchConfig) -> Result<LoadedInput> {
    let source = InputSource::parse(input);
    debug!(?source, "loading input");

    let html = match &source {
        InputSource::Stdin => fetch_stdin()?,
        InputSource::File(path) => fetch_file(path)?,
        InputSource::Url(url) => fetch_parsed_url(url, config).await?,
    };
    Ok(LoadedInput { source, html })
}

/// Fetches HTML content from a URL.
///
/// Performs an HTTP GET with the configured timeout and User-Agent and
/// returns the response body as text. Redirects are followed.
#[cfg(feature = "fetch")]
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| PrecisError::InvalidUrl(e.to_string()))?;
    fetch_parsed_url(&parsed_url, config).await
}

#[cfg(feature = "fetch")]
async fn fetch_parsed_url(url: &Url, config: &FetchConfig) -> Result<String> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PrecisError::InvalidUrl("URL must use http:// or https://".to_string()));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(PrecisError::HttpError)?;

    let response = client
        .get(url.clone())
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| if e.is_timeout() { PrecisError::Timeout { timeout: config.timeout } } else { PrecisError::HttpError(e) })?
        .error_for_status()?;

    debug!(url = %url, status = %response.status(), "fetched");
    Ok(response.text().await?)
}

#[cfg(not(feature = "fetch"))]
async fn fetch_parsed_url(url: &Url, _config: &FetchConfig) -> Result<String> {
    Err(PrecisError::InvalidUrl(format!("{} (built without URL fetching)", url)))
}

/// Reads HTML content from a local file.
pub fn fetch_file<P: Into<PathBuf>>(path: P) -> Result<String> {
    let path_buf = path.into();

    if !path_buf.exists() {
        Err(PrecisError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(PrecisError::from)
    }
}

/// Reads all of standard input.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
