//! Pulseboard - Market indicators and quotes in your terminal
//!
//! A terminal UI application that shows a financial indicator bundle and a
//! quote feed, each kept fresh by its own sync engine.

mod app;
mod ui;

use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use app::App;
use pulseboard::cache::{CacheStore, FileStore};
use pulseboard::cli::{Cli, StartupConfig};
use pulseboard::clock::{Clock, SystemClock};
use pulseboard::config::{self, Config, ResourceConfig};
use pulseboard::data::{market, quotes, MarketSnapshot, QuoteFeed};
use pulseboard::fetch::{Fetcher, HttpFetcher, Payload};
use pulseboard::logging;
use pulseboard::sync::SyncEngine;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Picks the persistent store, falling back to memory when no cache dir exists
fn build_cache(config: &Config, startup: &StartupConfig) -> CacheStore {
    if startup.offline {
        info!("Offline mode, cache kept in memory");
        return CacheStore::in_memory();
    }

    let store = match &config.cache_dir {
        Some(dir) => Some(FileStore::with_dir(dir.clone())),
        None => FileStore::new(),
    };
    match store {
        Some(store) => {
            info!(cache_dir = %store.dir().display(), "Using file cache");
            CacheStore::new(Arc::new(store))
        }
        None => {
            warn!("No cache directory available, cache kept in memory");
            CacheStore::in_memory()
        }
    }
}

/// Removes both cached resources; failures are logged and startup continues
async fn clear_cached_resources(cache: &CacheStore) {
    for key in [market::RESOURCE_KEY, quotes::RESOURCE_KEY] {
        match cache.clear(key).await {
            Ok(()) => info!(resource = key, "Cleared cached resource"),
            Err(error) => warn!(resource = key, %error, "Failed to clear cached resource"),
        }
    }
}

fn build_engine<T: Payload>(
    key: &str,
    resource: &ResourceConfig,
    config: &Config,
    cache: &CacheStore,
    clock: &Arc<dyn Clock>,
) -> Result<SyncEngine<T>, Box<dyn std::error::Error>> {
    let fetcher = HttpFetcher::<T>::new(resource.url.clone(), config.http_timeout())?;
    info!(
        resource = key,
        url = fetcher.url(),
        ttl_seconds = resource.policy.ttl_seconds,
        "Resource configured"
    );
    let fetcher: Arc<dyn Fetcher<T>> = Arc::new(fetcher);
    Ok(SyncEngine::new(
        key,
        resource.policy,
        cache.clone(),
        fetcher,
        Arc::clone(clock),
    ))
}

async fn run(startup: StartupConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(startup.config_path.as_deref())?;

    let log_dir = config
        .cache_dir
        .as_ref()
        .map(|dir| dir.join("logs"))
        .or_else(config::default_log_dir);
    let _log_guard = log_dir.and_then(|dir| match logging::init(&dir, &config.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled, cannot write to {}: {}", dir.display(), e);
            None
        }
    });

    let cache = build_cache(&config, &startup);
    if startup.clear_cache {
        clear_cached_resources(&cache).await;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let market_engine: SyncEngine<MarketSnapshot> =
        build_engine(market::RESOURCE_KEY, &config.market, &config, &cache, &clock)?;
    let quotes_engine: SyncEngine<QuoteFeed> =
        build_engine(quotes::RESOURCE_KEY, &config.quotes, &config, &cache, &clock)?;

    let mut app = App::new(market_engine, quotes_engine, &startup);

    if !io::stdout().is_tty() {
        return Err("pulseboard must run in an interactive terminal".into());
    }

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.mount_all();
    let result = event_loop(&mut terminal, &mut app);

    app.dispose();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    info!(manual_refreshes = app.stats.manual_refreshes, "Session ended");
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.drain_refresh_outcomes();
        terminal.draw(|f| ui::render(f, app, Utc::now()))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    match run(startup).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
