//! Collaborator traits through which external data reaches the engines
//!
//! Market data, events, profiles, and positions are all out of scope for
//! the core; these traits are the interfaces those collaborators present.
//! Implementations are injected into the adapters by the composition root,
//! never reached through globals.

use async_trait::async_trait;

use a2a_core::payload::{PositionData, UserProfile};

use crate::error::Result;
use crate::market::{Bar, MarketEvent, Quote};

/// Source of quotes and OHLCV history
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Current quote for a ticker
    async fn get_quote(&self, ticker: &str) -> Result<Quote>;

    /// Chronological OHLCV history for a ticker
    ///
    /// `period` is a range label such as "1mo", "3mo", "1y"; `interval` is
    /// the bar spacing such as "1d".
    async fn get_history(&self, ticker: &str, period: &str, interval: &str) -> Result<Vec<Bar>>;
}

/// Source of market/news events for risk analysis
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Events for a ticker from the named sources within the horizon
    async fn get_events(
        &self,
        ticker: &str,
        sources: &[String],
        horizon: &str,
    ) -> Result<Vec<MarketEvent>>;
}

/// Source of user investment profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Profile for a user, if one is stored
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;
}

/// Source of persisted user positions
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Stored positions for a user
    async fn get_positions(&self, user_id: &str) -> Result<Vec<PositionData>>;
}
