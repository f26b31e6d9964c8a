//! The closed set of analysis capabilities served over the protocol

use serde::{Deserialize, Serialize};

/// A named analysis function exposed by exactly one adapter
///
/// Routing is keyed by this enum rather than by raw receiver-id strings so
/// that dispatch stays a closed, compile-checked set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Stock/investment analysis from price history
    Investment,
    /// Event-driven risk analysis
    Risk,
    /// Portfolio risk/performance analysis
    Portfolio,
}

impl Capability {
    /// All capabilities, in registration order
    pub fn all() -> [Capability; 3] {
        [Self::Investment, Self::Risk, Self::Portfolio]
    }

    /// The capability prefix used in receiver ids
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Investment => "investment",
            Self::Risk => "risk",
            Self::Portfolio => "portfolio",
        }
    }

    /// Conventional agent id for the adapter serving this capability
    pub fn default_agent_id(&self) -> &'static str {
        match self {
            Self::Investment => "investment_agent_001",
            Self::Risk => "risk_agent_001",
            Self::Portfolio => "portfolio_agent_001",
        }
    }

    /// Resolve a capability from a receiver id's prefix
    ///
    /// Returns `None` when the receiver id does not start with a known
    /// capability prefix; the router converts that into `AGENT_NOT_FOUND`.
    pub fn from_receiver_id(receiver_id: &str) -> Option<Capability> {
        Capability::all()
            .into_iter()
            .find(|cap| receiver_id.starts_with(cap.prefix()))
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_receiver_id() {
        assert_eq!(
            Capability::from_receiver_id("investment_agent_001"),
            Some(Capability::Investment)
        );
        assert_eq!(
            Capability::from_receiver_id("risk_agent_007"),
            Some(Capability::Risk)
        );
        assert_eq!(
            Capability::from_receiver_id("portfolio_agent_001"),
            Some(Capability::Portfolio)
        );
        assert_eq!(Capability::from_receiver_id("unknown_agent_999"), None);
    }

    #[test]
    fn test_default_agent_ids_round_trip() {
        for cap in Capability::all() {
            assert_eq!(Capability::from_receiver_id(cap.default_agent_id()), Some(cap));
        }
    }
}
