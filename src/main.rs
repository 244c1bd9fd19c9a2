//! Command-line interface for direct Chrome control.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use chrome_cdp::transport::{DEFAULT_DEBUG_HOST, DEFAULT_DEBUG_PORT};
use chrome_cdp::{
    discover_target, launch, ImageFormat, LaunchOptions, Page, Result, SearchCache,
};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "chrome-cdp", version, about = "Direct Chrome control via the DevTools Protocol")]
struct Cli {
    /// Debug endpoint host.
    #[arg(long, global = true, default_value = DEFAULT_DEBUG_HOST)]
    host: String,

    /// Remote debugging port.
    #[arg(long, global = true, default_value_t = DEFAULT_DEBUG_PORT)]
    port: u16,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start Chrome with remote debugging enabled.
    Start {
        /// Chrome binary path (platform default when omitted).
        #[arg(long)]
        binary: Option<PathBuf>,

        /// Run without a visible window.
        #[arg(long)]
        headless: bool,
    },

    /// Connect to the DevTools WebSocket and enable capability domains.
    Connect,

    /// Navigate to a URL and extract page content.
    Navigate {
        /// The URL to navigate to.
        url: String,
    },

    /// Get current page content as JSON.
    Content,

    /// Capture a screenshot.
    Screenshot,

    /// Check whether the debug endpoint is reachable.
    Status,

    /// Inspect or clean the search cache.
    Cache {
        /// Cache file location.
        #[arg(long, default_value = ".search-cache.json")]
        file: PathBuf,

        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache statistics.
    Stats,
    /// Remove expired entries.
    Clean,
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("[chrome-cdp] Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes tracing to stderr; `RUST_LOG` overrides the flag level.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ============================================================================
// Command Dispatch
// ============================================================================

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Start { binary, headless } => {
            let mut options = LaunchOptions::new().with_port(cli.port);
            if let Some(binary) = binary {
                options = options.with_binary(binary);
            }
            if headless {
                options = options.with_headless();
            }

            let browser = launch(&options).await?;
            println!(
                "[chrome-cdp] Chrome started (pid {}, port {})",
                browser.pid().map_or_else(|| "?".to_string(), |p| p.to_string()),
                browser.port
            );
            Ok(())
        }

        Command::Connect => {
            let page = Page::attach(&cli.host, cli.port).await?;
            println!("[chrome-cdp] Connected to Chrome DevTools Protocol");
            page.close();
            Ok(())
        }

        Command::Navigate { url } => {
            let page = Page::attach(&cli.host, cli.port).await?;
            println!("[chrome-cdp] Navigating to: {url}");

            let snapshot = page.navigate(&url).await?;
            println!("[chrome-cdp] Navigation complete (title: \"{}\")", snapshot.title);

            let preview: String = snapshot.text.chars().take(200).collect();
            println!("[chrome-cdp] Preview: {preview}...");
            Ok(())
        }

        Command::Content => {
            let page = Page::attach(&cli.host, cli.port).await?;
            let snapshot = page.content().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }

        Command::Screenshot => {
            let page = Page::attach(&cli.host, cli.port).await?;
            let handle = page.screenshot(ImageFormat::Png).await?;

            if handle.is_null() {
                println!("[chrome-cdp] Screenshot captured (no client-side data available)");
            } else {
                println!("{handle}");
            }
            Ok(())
        }

        Command::Status => match discover_target(&cli.host, cli.port).await {
            Ok(target) => {
                println!("[chrome-cdp] Chrome CDP is available");
                println!("[chrome-cdp] URL: {}", target.url);
                println!("[chrome-cdp] Title: {}", target.title);
                Ok(())
            }
            Err(err) => {
                println!("[chrome-cdp] Chrome not running: {err}");
                Err(err)
            }
        },

        Command::Cache { file, action } => {
            let cache = SearchCache::new(file);
            match action {
                CacheAction::Stats => {
                    let stats = cache.stats();
                    println!(
                        "[chrome-cdp] Cache: {} fresh, {} expired (TTL: {}h)",
                        stats.fresh, stats.expired, stats.ttl_hours
                    );
                }
                CacheAction::Clean => {
                    let cleaned = cache.clean()?;
                    println!("[chrome-cdp] Cleaned {cleaned} expired entries");
                }
            }
            Ok(())
        }
    }
}
