//! Command-line interface parsing for Pulseboard
//!
//! This module handles parsing of CLI arguments using clap, including the
//! --screen flag for choosing which screen opens first.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified screen name is not recognized
    #[error("Invalid screen: '{0}'. Valid screens: market, quotes")]
    InvalidScreen(String),
}

/// The dashboard screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Financial indicators
    #[default]
    Market,
    /// Quote feed
    Quotes,
}

impl Screen {
    /// Parses a screen name, accepting a few aliases
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" | "markets" | "indicators" | "m" => Some(Screen::Market),
            "quotes" | "quote" | "q" => Some(Screen::Quotes),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Market => "Market",
            Screen::Quotes => "Quotes",
        }
    }

    /// The screen Tab switches to
    pub fn next(&self) -> Self {
        match self {
            Screen::Market => Screen::Quotes,
            Screen::Quotes => Screen::Market,
        }
    }
}

/// Pulseboard - Market indicators and quotes in your terminal
#[derive(Parser, Debug)]
#[command(name = "pulseboard")]
#[command(about = "Market indicators and quotes in your terminal")]
#[command(version)]
pub struct Cli {
    /// Path to a YAML config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Screen to open first
    ///
    /// Valid screens: market, quotes
    #[arg(long, value_name = "SCREEN")]
    pub screen: Option<String>,

    /// Start with automatic refreshes switched off
    #[arg(long)]
    pub no_auto_refresh: bool,

    /// Delete cached data before starting
    #[arg(long)]
    pub clear_cache: bool,

    /// Keep cached data in memory only, nothing is written to disk
    #[arg(long)]
    pub offline: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Screen shown first
    pub initial_screen: Screen,
    /// Whether auto-refresh starts enabled
    pub auto_refresh: bool,
    /// Whether cached entries are removed before mounting
    pub clear_cache: bool,
    /// Whether to use the in-memory store
    pub offline: bool,
    /// Explicit config file path
    pub config_path: Option<PathBuf>,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            initial_screen: Screen::Market,
            auto_refresh: true,
            clear_cache: false,
            offline: false,
            config_path: None,
        }
    }
}

/// Parses a screen string argument into a Screen enum.
///
/// # Arguments
/// * `s` - The screen string from CLI
///
/// # Returns
/// * `Ok(Screen)` if the string matches a valid screen
/// * `Err(CliError::InvalidScreen)` if the string doesn't match
pub fn parse_screen_arg(s: &str) -> Result<Screen, CliError> {
    Screen::from_str(s).ok_or_else(|| CliError::InvalidScreen(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if an invalid screen was specified
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let initial_screen = match &cli.screen {
            Some(screen) => parse_screen_arg(screen)?,
            None => Screen::default(),
        };

        Ok(StartupConfig {
            initial_screen,
            auto_refresh: !cli.no_auto_refresh,
            clear_cache: cli.clear_cache,
            offline: cli.offline,
            config_path: cli.config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_screen_arg_market_aliases() {
        assert_eq!(parse_screen_arg("market").unwrap(), Screen::Market);
        assert_eq!(parse_screen_arg("Markets").unwrap(), Screen::Market);
        assert_eq!(parse_screen_arg("m").unwrap(), Screen::Market);
    }

    #[test]
    fn test_parse_screen_arg_quotes_aliases() {
        assert_eq!(parse_screen_arg("quotes").unwrap(), Screen::Quotes);
        assert_eq!(parse_screen_arg("quote").unwrap(), Screen::Quotes);
        assert_eq!(parse_screen_arg("q").unwrap(), Screen::Quotes);
    }

    #[test]
    fn test_parse_screen_arg_invalid() {
        let err = parse_screen_arg("weather").unwrap_err();
        assert!(err.to_string().contains("Invalid screen"));
        assert!(err.to_string().contains("weather"));
    }

    #[test]
    fn test_screen_next_cycles() {
        assert_eq!(Screen::Market.next(), Screen::Quotes);
        assert_eq!(Screen::Quotes.next(), Screen::Market);
    }

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["pulseboard"]);
        assert!(cli.screen.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.no_auto_refresh);
        assert!(!cli.clear_cache);
        assert!(!cli.offline);
    }

    #[test]
    fn test_startup_config_from_cli_defaults() {
        let cli = Cli::parse_from(["pulseboard"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.initial_screen, Screen::Market);
        assert!(config.auto_refresh);
        assert!(!config.offline);
    }

    #[test]
    fn test_startup_config_from_cli_all_flags() {
        let cli = Cli::parse_from([
            "pulseboard",
            "--screen",
            "quotes",
            "--no-auto-refresh",
            "--clear-cache",
            "--offline",
            "--config",
            "custom.yaml",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.initial_screen, Screen::Quotes);
        assert!(!config.auto_refresh);
        assert!(config.clear_cache);
        assert!(config.offline);
        assert_eq!(config.config_path, Some(PathBuf::from("custom.yaml")));
    }

    #[test]
    fn test_startup_config_from_cli_invalid_screen() {
        let cli = Cli::parse_from(["pulseboard", "--screen", "invalid"]);
        assert!(StartupConfig::from_cli(&cli).is_err());
    }
}
