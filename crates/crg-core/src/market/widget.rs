//! State machine behind the live market popup.
//!
//! `Closed -> Loading -> {Ready | Failed}`; `Ready` and `Failed` re-enter
//! `Loading` on every timed or manual refresh, and any phase collapses to
//! `Closed` when the popup is dismissed. The coin list is replaced wholesale on
//! success and left untouched on failure. The filtered view is recomputed from
//! (coins, search) whenever either changes.

use chrono::{DateTime, Local};

use crate::error::GatewayError;
use super::coin::{filter_coins, CoinRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketPhase {
    Closed,
    Loading,
    Ready,
    /// Holds the user-facing error text.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct MarketWidget {
    phase: MarketPhase,
    coins: Vec<CoinRecord>,
    filtered: Vec<CoinRecord>,
    search: String,
    last_updated: Option<DateTime<Local>>,
}

impl Default for MarketWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketWidget {
    pub fn new() -> Self {
        Self {
            phase: MarketPhase::Closed,
            coins: Vec::new(),
            filtered: Vec::new(),
            search: String::new(),
            last_updated: None,
        }
    }

    pub fn phase(&self) -> &MarketPhase {
        &self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != MarketPhase::Closed
    }

    pub fn is_loading(&self) -> bool {
        self.phase == MarketPhase::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            MarketPhase::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Returns true when the popup was closed and a first fetch should start.
    pub fn open(&mut self) -> bool {
        if self.is_open() {
            return false;
        }
        self.phase = MarketPhase::Loading;
        true
    }

    pub fn close(&mut self) {
        self.phase = MarketPhase::Closed;
    }

    /// Manual refresh is only offered while no fetch is running.
    pub fn can_refresh(&self) -> bool {
        self.is_open() && !self.is_loading()
    }

    pub fn fetch_started(&mut self) {
        if self.is_open() {
            self.phase = MarketPhase::Loading;
        }
    }

    /// Apply a fetch result. Results that arrive after the popup closed are dropped.
    pub fn fetch_finished(&mut self, result: Result<Vec<CoinRecord>, GatewayError>) -> bool {
        if !self.is_open() {
            return false;
        }
        match result {
            Ok(coins) => {
                self.coins = coins;
                self.last_updated = Some(Local::now());
                self.refilter();
                self.phase = MarketPhase::Ready;
            }
            Err(e) => {
                self.phase = MarketPhase::Failed(e.market_message().to_string());
            }
        }
        true
    }

    pub fn coins(&self) -> &[CoinRecord] {
        &self.coins
    }

    /// Rows to display for the current search term.
    pub fn visible_coins(&self) -> &[CoinRecord] {
        &self.filtered
    }

    /// Placeholder rows are shown only while the very first load runs.
    pub fn show_skeleton(&self) -> bool {
        self.is_loading() && self.coins.is_empty()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.refilter();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search.push(c);
        self.refilter();
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = filter_coins(&self.coins, &self.search);
    }
}
