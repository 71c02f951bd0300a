//! The auction record and its append-only bid ledger.

use indexmap::IndexMap;
use jiff::Timestamp;
use serde::{
    Deserialize,
    Serialize,
};
use uuid::Uuid;

/// The immutable configuration an auction is created with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Opaque token identifying the seller.
    pub seller_id: String,
    /// Where the auctioned item is located.
    pub location: String,
    /// Free-form description of the auctioned item.
    pub description: String,
    /// The appraised value of the item, if one was provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appraised_value: Option<u64>,
    /// The minimum acceptable final price; also the starting price.
    pub reserve_price: u64,
    /// The smallest amount by which a new bid must exceed the current
    /// price. Strictly positive.
    pub min_increment: u64,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

/// Whether a ledger entry was submitted by a bidder or committed by the
/// proxy resolver on a bidder's behalf.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidOrigin {
    Manual,
    Automatic,
}

/// A single entry of the bid ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub bidder_id: String,
    pub amount: u64,
    pub timestamp: Timestamp,
    pub origin: BidOrigin,
}

/// The persisted auction entity.
///
/// `bid_history` is append-only and its insertion order is chronological.
/// `proxy_limits` keeps one entry per bidder; iteration order is first
/// insertion order, which is the documented tie-break for the resolver.
/// Updating an existing limit keeps the bidder's original position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: Uuid,
    #[serde(flatten)]
    pub config: AuctionConfig,
    pub current_price: u64,
    pub highest_bidder: Option<String>,
    pub bid_history: Vec<Bid>,
    pub proxy_limits: IndexMap<String, u64>,
}

impl Auction {
    #[must_use]
    pub fn new(id: Uuid, config: AuctionConfig) -> Self {
        Self {
            id,
            current_price: config.reserve_price,
            config,
            highest_bidder: None,
            bid_history: Vec::new(),
            proxy_limits: IndexMap::new(),
        }
    }

    /// The smallest amount a non-leading bidder must offer.
    #[must_use]
    pub fn next_required(&self) -> u64 {
        self.current_price.saturating_add(self.config.min_increment)
    }

    /// The price the current leader is known to be willing to pay: their
    /// declared proxy limit if they have one, otherwise their standing bid.
    #[must_use]
    pub fn leader_ceiling(&self) -> u64 {
        self.highest_bidder
            .as_deref()
            .and_then(|leader| self.proxy_limits.get(leader).copied())
            .unwrap_or(self.current_price)
    }

    /// Applies a validated manual bid.
    ///
    /// Returns `true` if the bid took the lead and was appended to the
    /// ledger. A leader re-confirming their position below the required
    /// minimum changes nothing and leaves the ledger untouched.
    pub fn record_manual_bid(&mut self, bidder_id: &str, amount: u64, now: Timestamp) -> bool {
        if amount < self.next_required() {
            return false;
        }
        self.bid_history.push(Bid {
            bidder_id: bidder_id.to_string(),
            amount,
            timestamp: now,
            origin: BidOrigin::Manual,
        });
        self.current_price = amount;
        self.highest_bidder = Some(bidder_id.to_string());
        true
    }

    /// Sets or overwrites a bidder's validated proxy limit.
    ///
    /// Returns the previously declared limit, if any.
    pub fn upsert_proxy_limit(&mut self, bidder_id: String, limit: u64) -> Option<u64> {
        self.proxy_limits.insert(bidder_id, limit)
    }

    pub(crate) fn record_automatic_bid(&mut self, bidder_id: &str, amount: u64, now: Timestamp) {
        self.bid_history.push(Bid {
            bidder_id: bidder_id.to_string(),
            amount,
            timestamp: now,
            origin: BidOrigin::Automatic,
        });
        self.current_price = amount;
        self.highest_bidder = Some(bidder_id.to_string());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config(reserve_price: u64, min_increment: u64) -> AuctionConfig {
        AuctionConfig {
            seller_id: "seller-1".to_string(),
            location: "Bratislava".to_string(),
            description: "three room apartment".to_string(),
            appraised_value: Some(90_000),
            reserve_price,
            min_increment,
            start_time: "2024-01-01T00:00:00Z".parse().unwrap(),
            end_time: "2024-02-01T00:00:00Z".parse().unwrap(),
        }
    }

    pub(crate) fn active_now() -> Timestamp {
        "2024-01-15T12:00:00Z".parse().unwrap()
    }

    pub(crate) fn test_auction(reserve_price: u64, min_increment: u64) -> Auction {
        Auction::new(Uuid::new_v4(), test_config(reserve_price, min_increment))
    }

    #[test]
    fn fresh_auction_starts_at_reserve_with_no_leader() {
        let auction = test_auction(1000, 100);
        assert_eq!(auction.current_price, 1000);
        assert_eq!(auction.highest_bidder, None);
        assert!(auction.bid_history.is_empty());
        assert!(auction.proxy_limits.is_empty());
    }

    #[test]
    fn manual_bid_below_required_minimum_changes_nothing() {
        let mut auction = test_auction(1000, 100);
        auction.record_manual_bid("alice", 1100, active_now());
        assert!(!auction.record_manual_bid("alice", 1100, active_now()));
        assert_eq!(auction.current_price, 1100);
        assert_eq!(auction.bid_history.len(), 1);
    }

    #[test]
    fn updating_a_proxy_limit_keeps_the_original_insertion_position() {
        let mut auction = test_auction(1000, 100);
        auction.upsert_proxy_limit("alice".to_string(), 1500);
        auction.upsert_proxy_limit("bob".to_string(), 2000);
        assert_eq!(auction.upsert_proxy_limit("alice".to_string(), 2500), Some(1500));
        let order: Vec<_> = auction.proxy_limits.keys().cloned().collect();
        assert_eq!(order, ["alice", "bob"]);
    }

    #[test]
    fn leader_ceiling_falls_back_to_the_standing_bid() {
        let mut auction = test_auction(1000, 100);
        auction.record_manual_bid("alice", 1100, active_now());
        assert_eq!(auction.leader_ceiling(), 1100);
        auction.upsert_proxy_limit("alice".to_string(), 1500);
        assert_eq!(auction.leader_ceiling(), 1500);
    }
}
