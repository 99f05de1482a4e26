use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use precis_core::{
    CacheConfig, DigestCache, DigestStats, Digester, Document, ExtractConfig, FetchConfig, FileStore, KeyValueStore,
    MemoryStore, PrecisError, Settings, TextToDigest, cache, explain_candidates, fetch_stdin, get_text_to_digest,
    load_input,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

mod echo;
mod transform;

use echo::{
    format_size, print_banner, print_candidates, print_error, print_extraction_details, print_info, print_stats,
    print_step, print_success, print_timing, print_warning,
};
use transform::CommandTransform;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit status for extraction outcomes (no container, text too short, ...).
const EXIT_EXTRACTION: u8 = 2;

/// Extract the readable text of a page and digest it through an external summarizer,
/// caching every digest so identical input is never summarized twice
#[derive(Parser, Debug)]
#[command(name = "precis")]
#[command(author = "precis contributors")]
#[command(version)]
#[command(about = "Extract article text and cache its digests", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT", required_unless_present_any = ["completions", "clear_cache"])]
    input: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Digest mode passed to the transform command
    #[arg(short, long, default_value = "summary", value_name = "MODE")]
    mode: String,

    /// Minimum number of characters for the text to digest
    #[arg(long, value_name = "NUM")]
    min_length: Option<usize>,

    /// Content query to try, most specific first (repeatable; replaces configured queries)
    #[arg(short, long = "query", value_name = "SELECTOR")]
    queries: Vec<String>,

    /// Digest this selection instead of the article ("-" for stdin)
    #[arg(short, long, value_name = "FILE")]
    selection: Option<String>,

    /// Page URL used to pick site rules when INPUT is a file or stdin
    #[arg(long, value_name = "URL", value_parser = Url::parse)]
    url: Option<Url>,

    /// Print the extracted text and stop
    #[arg(long, conflicts_with = "explain")]
    extract_only: bool,

    /// Show what every content query matched and stop
    #[arg(long)]
    explain: bool,

    /// Print structured JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Summarizer command, run through `sh -c` with the text on stdin and the mode as $1
    #[arg(short = 't', long, value_name = "CMD")]
    transform_cmd: Option<String>,

    /// Seconds to wait for the transform command
    #[arg(long, default_value = "120", value_name = "SECS")]
    transform_timeout: u64,

    /// Directory holding the digest cache
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Directory holding extraction settings
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Empty the digest cache before doing anything else
    #[arg(long)]
    clear_cache: bool,

    /// Do not read or write the digest cache
    #[arg(long)]
    no_cache: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "precis=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn resolve_dir(explicit: Option<PathBuf>, base: Option<PathBuf>, what: &str) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => base
            .map(|dir| dir.join("precis"))
            .with_context(|| format!("Could not determine the {} directory; pass it explicitly", what)),
    }
}

fn read_selection(selection: &str, input: Option<&str>) -> anyhow::Result<String> {
    if selection == "-" {
        if input == Some("-") {
            bail!("INPUT and --selection cannot both read from stdin");
        }
        return fetch_stdin().context("Failed to read selection from stdin");
    }
    fs::read_to_string(selection).with_context(|| format!("Failed to read selection: {}", selection))
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", content),
    }
    Ok(())
}

async fn clear_cache(dir: &Path) -> anyhow::Result<()> {
    let mut cache = DigestCache::new(FileStore::new(dir), CacheConfig::default())?;
    cache.clear().await.context("Failed to clear the digest cache")?;
    print_success("Digest cache cleared");
    Ok(())
}

/// Digests `text` through a cache persisted in `store`.
///
/// The cache is flushed explicitly before returning so nothing waits on the
/// autosave interval.
async fn digest_with<S>(
    store: S, text: &str, mode: &str, transform: CommandTransform,
) -> anyhow::Result<(String, bool, DigestStats)>
where
    S: KeyValueStore + 'static,
{
    let (shared, autosave) = cache::init(store, CacheConfig::default()).await.context("Failed to load the digest cache")?;
    let digester = Digester::new(shared.clone(), transform);

    let cached = digester.is_cached(text, mode).await;
    let result = digester.digest(text, mode).await;

    shared.lock().await.save().await.context("Failed to save the digest cache")?;
    autosave.abort();

    Ok((result?, cached, digester.stats()))
}

async fn run(args: Args) -> anyhow::Result<()> {
    if let Some(shell) = args.completions {
        let mut command = Args::command();
        clap_complete::generate(shell, &mut command, "precis", &mut io::stdout());
        return Ok(());
    }

    let start = Instant::now();
    let mut timings = Vec::new();

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let cache_dir = resolve_dir(args.cache_dir.clone(), dirs::cache_dir(), "cache")?;
    if args.clear_cache {
        clear_cache(&cache_dir).await?;
    }
    let Some(input) = args.input.as_deref() else {
        return Ok(());
    };

    let config_dir = resolve_dir(args.config_dir.clone(), dirs::config_dir(), "config")?;
    let settings = Settings::load(&FileStore::new(&config_dir))
        .await
        .with_context(|| format!("Failed to load settings from {}", config_dir.display()))?;
    debug!(config_dir = %config_dir.display(), "settings loaded");

    if args.verbose {
        print_step(1, 4, &format!("Loading {}", input.bright_white()));
    }
    let fetch_config = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
    };
    let step = Instant::now();
    let loaded = load_input(input, &fetch_config).await.context("Failed to load input")?;
    timings.push(("Load", step.elapsed()));
    if args.verbose {
        eprintln!("  {} {}\n", "Size:".dimmed(), format_size(loaded.html.len()).bright_white());
    }

    let host = match &args.url {
        Some(url) => Some(
            url.host_str()
                .map(str::to_lowercase)
                .with_context(|| format!("Not a URL with a host: {}", url))?,
        ),
        None => loaded.source.host(),
    };
    if let Some(host) = &host
        && settings.is_disabled(host)
    {
        bail!("precis is disabled for {} (see disabled_domains in {})", host, config_dir.display());
    }

    let mut extract_config: ExtractConfig = settings.extract_config_for(host.as_deref());
    if !args.queries.is_empty() {
        extract_config.queries = args.queries.clone();
    }
    if let Some(min_length) = args.min_length {
        extract_config.min_length = min_length;
    }

    if args.verbose {
        print_step(2, 4, "Parsing HTML document");
    }
    let step = Instant::now();
    let doc = Document::parse(&loaded.html).context("Failed to parse HTML")?;
    timings.push(("Parse", step.elapsed()));

    if args.explain {
        let reports = explain_candidates(&doc, &extract_config);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            print_candidates(&reports);
        }
        return Ok(());
    }

    if args.verbose {
        print_step(3, 4, "Extracting text");
    }
    let selection = args.selection.as_deref().map(|s| read_selection(s, Some(input))).transpose()?;
    let step = Instant::now();
    let text: TextToDigest = get_text_to_digest(&doc, selection.as_deref(), &extract_config)?;
    timings.push(("Extract", step.elapsed()));
    drop(doc);

    if args.verbose {
        print_extraction_details(&text);
    }

    if args.extract_only {
        let output = if args.json { serde_json::to_string_pretty(&text)? } else { text.text.clone() };
        return write_output(args.output.as_deref(), &output);
    }

    let Some(command) = args.transform_cmd.clone() else {
        bail!("No summarizer configured; pass --transform-cmd, or --extract-only to print the text");
    };
    let transform = CommandTransform::new(command, Duration::from_secs(args.transform_timeout));

    if args.verbose {
        print_step(4, 4, &format!("Digesting ({})", args.mode.bright_white()));
    }
    let step = Instant::now();
    let (digest, cached, stats) = if args.no_cache {
        digest_with(MemoryStore::new(), &text.text, &args.mode, transform).await?
    } else {
        digest_with(FileStore::new(&cache_dir), &text.text, &args.mode, transform).await?
    };
    timings.push(("Digest", step.elapsed()));

    if args.verbose {
        if cached {
            print_info("Served from cache");
        }
        print_stats(&stats);
        for (label, duration) in &timings {
            print_timing(label, *duration);
        }
        print_timing("Total", start.elapsed());
        eprintln!();
    }

    let output = if args.json {
        serde_json::to_string_pretty(&serde_json::json!({
            "digest": digest,
            "mode": args.mode,
            "source": text.source,
            "title": text.title,
            "cached": cached,
        }))?
    } else {
        digest
    };
    write_output(args.output.as_deref(), &output)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<PrecisError>() {
            Some(precis_err) if precis_err.is_extraction_outcome() => {
                print_warning(&format!("{}: {}", precis_err.code(), precis_err));
                ExitCode::from(EXIT_EXTRACTION)
            }
            Some(precis_err) => {
                print_error(&format!("{}: {:#}", precis_err.code(), err));
                ExitCode::FAILURE
            }
            None => {
                print_error(&format!("{:#}", err));
                ExitCode::FAILURE
            }
        },
    }
}
