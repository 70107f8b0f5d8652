//! Resource payloads shown by the dashboard
//!
//! Each submodule defines the decoded shape of one remote resource, the key it
//! is cached under, and the checks a freshly fetched value must pass before it
//! replaces what is on screen.

pub mod market;
pub mod quotes;

pub use market::{Indicator, MarketSnapshot};
pub use quotes::{Quote, QuoteFeed};
