//! Financial indicator bundle for the market screen
//!
//! The endpoint returns a JSON object with a list of indicators:
//!
//! ```json
//! {
//!   "indicators": [
//!     { "code": "usd", "name": "US Dollar", "unit": "CLP", "value": 945.3, "change_percent": 0.42 }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::fetch::Payload;
use crate::indicator::{classify, DerivedIndicator};

/// Cache key for the market resource
pub const RESOURCE_KEY: &str = "market";

/// A single financial indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    /// Short unique code (e.g., "usd")
    pub code: String,
    /// Human-readable name
    pub name: String,
    /// Unit the value is expressed in
    pub unit: String,
    /// Latest value
    pub value: f64,
    /// Change since the previous reading, in percent
    pub change_percent: f64,
}

impl Indicator {
    /// Display facts for this indicator's change
    pub fn derived(&self) -> DerivedIndicator {
        classify(self.change_percent)
    }
}

/// The full set of indicators returned by one fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub indicators: Vec<Indicator>,
}

impl Payload for MarketSnapshot {
    fn validate(&self) -> Result<(), String> {
        if self.indicators.is_empty() {
            return Err("market snapshot contains no indicators".to_string());
        }

        let mut seen = HashSet::new();
        for indicator in &self.indicators {
            if indicator.code.trim().is_empty() {
                return Err("indicator with an empty code".to_string());
            }
            if !seen.insert(indicator.code.to_ascii_lowercase()) {
                return Err(format!("duplicate indicator code {:?}", indicator.code));
            }
            if !indicator.value.is_finite() || !indicator.change_percent.is_finite() {
                return Err(format!("indicator {:?} has a non-finite value", indicator.code));
            }
        }

        Ok(())
    }
}
