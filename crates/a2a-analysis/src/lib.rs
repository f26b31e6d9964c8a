//! Analysis engines for the A2A financial analysis backend
//!
//! Three pure engines — technical indicator scoring, event risk scoring, and
//! portfolio metrics — plus the collaborator traits through which market
//! data, events, and user state reach them. The engines are functions of
//! their inputs: no protocol types, no I/O, no shared state, which is what
//! lets the runtime schedule them freely across worker tasks.

pub mod config;
pub mod error;
pub mod indicators;
pub mod market;
pub mod portfolio;
pub mod providers;
pub mod recommend;
pub mod risk;
pub mod scoring;

pub use config::{PortfolioConfig, RiskConfig, ScoringConfig};
pub use error::{AnalysisError, Result};
pub use market::{Bar, MarketEvent, Quote};
pub use providers::{EventFeed, MarketDataProvider, PositionStore, ProfileStore};
