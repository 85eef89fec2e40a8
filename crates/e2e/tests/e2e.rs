//! E2E test harness entry point
//!
//! Runs navigation specs against a pagegen site. Without `--base-url` or
//! `--spawn-server` it serves a rule-based site in-process on an ephemeral
//! port, so a bare `cargo test` is self-contained.
//!
//! Run with: cargo test --package pagegen-e2e --test e2e -- [ARGS]
//!
//! Exit codes: 0 all passed, 1 a test failed, 2 harness error.

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pagegen_common::ContentCache;
use pagegen_e2e::playwright::{Browser, PlaywrightConfig};
use pagegen_e2e::runner::{BackendKind, RunnerConfig, TestSuiteResult};
use pagegen_e2e::server::ServerConfig;
use pagegen_e2e::{E2eError, E2eResult, TestRunner, TestSpec};
use pagegen_web::{RuleBasedGenerator, WebServer};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// Fetch server-rendered pages over HTTP
    Http,
    /// Drive a real browser through Playwright
    Playwright,
}

#[derive(Parser, Debug)]
#[command(name = "pagegen-e2e")]
#[command(about = "Navigation smoke tests for pagegen sites")]
struct Args {
    /// Path to test specs directory (built-in check when missing)
    #[arg(short, long, default_value = "specs")]
    specs: PathBuf,

    /// Run only tests matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific test by name
    #[arg(short, long)]
    name: Option<String>,

    /// Test an already running server
    #[arg(long, env = "PAGEGEN_E2E_BASE_URL", conflicts_with = "spawn_server")]
    base_url: Option<String>,

    /// Spawn the pagegen-web binary instead of serving in-process
    #[arg(long)]
    spawn_server: bool,

    /// Path to web server binary
    #[arg(long, default_value = "../../target/debug/pagegen-web")]
    server_binary: PathBuf,

    #[arg(long, value_enum, default_value = "http")]
    backend: Backend,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Run in headless mode
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    headless: bool,

    /// Override every spec's navigation timeout
    #[arg(long)]
    navigation_timeout_ms: Option<u64>,

    /// Override every spec's assertion timeout
    #[arg(long)]
    assertion_timeout_ms: Option<u64>,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Run async main
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

/// Site served from this process for the duration of the run
struct InProcessSite {
    base_url: String,
    _cache_dir: TempDir,
}

async fn serve_in_process() -> E2eResult<InProcessSite> {
    let cache_dir = tempfile::Builder::new().prefix("pagegen-e2e-").tempdir()?;
    let cache = ContentCache::open(cache_dir.path())
        .await
        .map_err(|e| E2eError::ServerStartup(e.to_string()))?;
    let server = WebServer::new(cache, Arc::new(RuleBasedGenerator));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, server.router()).await {
            eprintln!("in-process server stopped: {}", e);
        }
    });

    info!("Serving rule-based site in-process at http://{}", addr);
    Ok(InProcessSite {
        base_url: format!("http://{}", addr),
        _cache_dir: cache_dir,
    })
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let browser: Browser = args.browser.parse().map_err(E2eError::Playwright)?;

    let mut site = None;
    let (base_url, server) = match (&args.base_url, args.spawn_server) {
        (Some(url), _) => (url.clone(), None),
        (None, true) => {
            let server = ServerConfig {
                binary_path: args.server_binary.clone(),
                ..Default::default()
            };
            (String::new(), Some(server))
        }
        (None, false) => {
            let local = serve_in_process().await?;
            let url = local.base_url.clone();
            site = Some(local);
            (url, None)
        }
    };

    let config = RunnerConfig {
        base_url,
        server,
        backend: match args.backend {
            Backend::Http => BackendKind::Http,
            Backend::Playwright => BackendKind::Playwright,
        },
        playwright: PlaywrightConfig {
            browser,
            headless: args.headless,
            ..Default::default()
        },
        navigation_timeout: args.navigation_timeout_ms.map(Duration::from_millis),
        assertion_timeout: args.assertion_timeout_ms.map(Duration::from_millis),
        specs_dir: args.specs.clone(),
        output_dir: args.output,
        ..Default::default()
    };

    let mut runner = TestRunner::with_config(config);

    let results: TestSuiteResult = if !args.specs.is_dir() {
        info!("No specs at {}, running the built-in check", args.specs.display());
        runner.run_specs(&[TestSpec::dynamic_path_navigation()]).await?
    } else if let Some(name) = args.name {
        runner.run_test(&name).await?
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;
    runner.stop_server()?;
    drop(site);

    Ok(results.failed == 0)
}
