//! The time-driven auction lifecycle.
//!
//! The phase is recomputed from the wall clock on every operation and is
//! never stored, so a stale persisted status can never gate a bid.

use jiff::Timestamp;
use serde::{
    Deserialize,
    Serialize,
};

use crate::auction::AuctionConfig;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Active,
    Ended,
}

impl AuctionConfig {
    /// Classifies `now` against the auction's configured window.
    ///
    /// Both window edges are inclusive: a bid arriving exactly at
    /// `start_time` or `end_time` is accepted.
    #[must_use]
    pub fn phase_at(&self, now: Timestamp) -> Phase {
        if now < self.start_time {
            Phase::NotStarted
        } else if now > self.end_time {
            Phase::Ended
        } else {
            Phase::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::tests::test_config;

    #[test]
    fn phase_follows_the_configured_window() {
        let config = test_config(1000, 100);
        assert_eq!(
            config.phase_at("2023-12-31T23:59:59Z".parse().unwrap()),
            Phase::NotStarted,
        );
        assert_eq!(config.phase_at(config.start_time), Phase::Active);
        assert_eq!(
            config.phase_at("2024-01-15T12:00:00Z".parse().unwrap()),
            Phase::Active,
        );
        assert_eq!(config.phase_at(config.end_time), Phase::Active);
        assert_eq!(
            config.phase_at("2024-02-01T00:00:01Z".parse().unwrap()),
            Phase::Ended,
        );
    }
}
