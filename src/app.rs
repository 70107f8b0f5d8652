//! Application state management for Pulseboard
//!
//! This module owns the two sync engines behind the dashboard screens and
//! translates keyboard input into screen switches and engine commands.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::debug;

use pulseboard::cli::{Screen, StartupConfig};
use pulseboard::data::{MarketSnapshot, QuoteFeed};
use pulseboard::sync::{RefreshOutcome, SyncEngine};

/// Counters for the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Manual refreshes that brought in new data
    pub manual_refreshes: u32,
    /// Manual refreshes that failed
    pub failed_refreshes: u32,
}

impl SessionStats {
    /// Counts the outcome of a manual refresh
    pub fn record(&mut self, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Updated => self.manual_refreshes += 1,
            RefreshOutcome::Failed => self.failed_refreshes += 1,
            RefreshOutcome::CacheHit | RefreshOutcome::Coalesced | RefreshOutcome::Discarded => {}
        }
    }
}

/// Main application struct
pub struct App {
    /// Screen currently shown
    pub screen: Screen,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Session counters
    pub stats: SessionStats,
    /// Engine behind the market screen
    pub market: SyncEngine<MarketSnapshot>,
    /// Engine behind the quotes screen
    pub quotes: SyncEngine<QuoteFeed>,
    /// Outcomes of manual refreshes, reported by background tasks
    outcome_tx: mpsc::UnboundedSender<RefreshOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<RefreshOutcome>,
}

impl App {
    /// Creates the app around already constructed engines
    ///
    /// # Arguments
    /// * `market` - Engine for the market screen
    /// * `quotes` - Engine for the quotes screen
    /// * `startup` - Settings derived from CLI arguments
    pub fn new(
        market: SyncEngine<MarketSnapshot>,
        quotes: SyncEngine<QuoteFeed>,
        startup: &StartupConfig,
    ) -> Self {
        if !startup.auto_refresh {
            market.set_auto_refresh(false);
            quotes.set_auto_refresh(false);
        }

        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            screen: startup.initial_screen,
            show_help: false,
            should_quit: false,
            stats: SessionStats::default(),
            market,
            quotes,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Mounts both engines in the background
    ///
    /// Screens show their loading state until the engines publish data.
    pub fn mount_all(&self) {
        let market = self.market.clone();
        tokio::spawn(async move {
            market.mount().await;
        });
        let quotes = self.quotes.clone();
        tokio::spawn(async move {
            quotes.mount().await;
        });
    }

    /// Handles a keyboard event
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.screen = self.screen.next();
            }
            KeyCode::Char('1') => {
                self.screen = Screen::Market;
            }
            KeyCode::Char('2') => {
                self.screen = Screen::Quotes;
            }
            KeyCode::Char('r') => {
                self.refresh_current();
            }
            KeyCode::Char('a') => {
                self.toggle_auto_refresh();
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    /// True if the current screen's engine will refresh by itself
    pub fn auto_refresh_enabled(&self) -> bool {
        match self.screen {
            Screen::Market => self.market.is_auto_refresh_enabled(),
            Screen::Quotes => self.quotes.is_auto_refresh_enabled(),
        }
    }

    fn refresh_current(&self) {
        let (resource, handle) = match self.screen {
            Screen::Market => (self.market.key(), self.market.request_refresh()),
            Screen::Quotes => (self.quotes.key(), self.quotes.request_refresh()),
        };
        debug!(resource, "Manual refresh requested");

        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            if let Ok(outcome) = handle.await {
                let _ = tx.send(outcome);
            }
        });
    }

    fn toggle_auto_refresh(&self) {
        let enabled = !self.auto_refresh_enabled();
        match self.screen {
            Screen::Market => self.market.set_auto_refresh(enabled),
            Screen::Quotes => self.quotes.set_auto_refresh(enabled),
        }
    }

    /// Folds finished manual refreshes into the session stats
    ///
    /// # Returns
    /// The number of outcomes processed
    pub fn drain_refresh_outcomes(&mut self) -> usize {
        let mut count = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.stats.record(outcome);
            count += 1;
        }
        count
    }

    /// Tears down both engines
    pub fn dispose(&self) {
        self.market.dispose();
        self.quotes.dispose();
    }
}
