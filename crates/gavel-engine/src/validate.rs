//! Pure validation of proposed bids and proxy-limit changes.
//!
//! Validation inspects a snapshot and returns either the accepted amount
//! or a typed rejection. It never mutates the auction; the operations
//! facade applies state changes only after a successful validation.

use jiff::Timestamp;

use crate::{
    auction::Auction,
    phase::Phase,
};

/// A client-caused rejection. No state was mutated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BidError {
    #[error("amount must be a positive number")]
    InvalidAmount,
    #[error("bidder id must not be empty")]
    InvalidBidder,
    #[error("the auction has not started yet")]
    AuctionNotStarted,
    #[error("the auction has already ended")]
    AuctionEnded,
    #[error("bid of {amount} is below the required minimum of {required}")]
    BidTooLow { amount: u64, required: u64 },
    #[error("bid of {amount} exceeds the bidder's own proxy limit of {limit}")]
    ExceedsOwnProxyLimit { amount: u64, limit: u64 },
    #[error("proxy limit of {limit} is below the reserve price of {reserve}")]
    LimitBelowReserve { limit: u64, reserve: u64 },
}

fn ensure_active(auction: &Auction, now: Timestamp) -> Result<(), BidError> {
    match auction.config.phase_at(now) {
        Phase::NotStarted => Err(BidError::AuctionNotStarted),
        Phase::Ended => Err(BidError::AuctionEnded),
        Phase::Active => Ok(()),
    }
}

/// Decides whether a proposed manual bid is legal, returning the amount
/// to apply.
///
/// A bidder already holding the lead may re-submit below the required
/// minimum to confirm their position; the facade treats that as a
/// successful no-op rather than an error. Nobody may manually exceed a
/// ceiling they themselves declared; raising the ceiling requires an
/// explicit proxy-limit update.
pub fn validate_manual_bid(
    auction: &Auction,
    now: Timestamp,
    bidder_id: &str,
    amount: u64,
) -> Result<u64, BidError> {
    if bidder_id.is_empty() {
        return Err(BidError::InvalidBidder);
    }
    if amount == 0 {
        return Err(BidError::InvalidAmount);
    }
    ensure_active(auction, now)?;

    let required = auction.next_required();
    let is_leader = auction.highest_bidder.as_deref() == Some(bidder_id);
    if amount < required && !is_leader {
        return Err(BidError::BidTooLow {
            amount,
            required,
        });
    }
    if let Some(&limit) = auction.proxy_limits.get(bidder_id) {
        if amount > limit {
            return Err(BidError::ExceedsOwnProxyLimit {
                amount,
                limit,
            });
        }
    }
    Ok(amount)
}

/// Decides whether a proposed proxy-limit change is legal, returning the
/// limit to apply.
///
/// Overwriting an existing limit is permitted unconditionally, including
/// lowering it below a value the resolver already acted on.
pub fn validate_proxy_limit(
    auction: &Auction,
    now: Timestamp,
    bidder_id: &str,
    max_bid: u64,
) -> Result<u64, BidError> {
    if bidder_id.is_empty() {
        return Err(BidError::InvalidBidder);
    }
    if max_bid == 0 {
        return Err(BidError::InvalidAmount);
    }
    ensure_active(auction, now)?;

    if max_bid < auction.config.reserve_price {
        return Err(BidError::LimitBelowReserve {
            limit: max_bid,
            reserve: auction.config.reserve_price,
        });
    }
    Ok(max_bid)
}
