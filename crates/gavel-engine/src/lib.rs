//! The settlement engine for time-boxed English auctions.
//!
//! An auction accepts manual bids and proxy limits (a bidder's privately
//! declared maximum, bid on their behalf in increments). After every
//! accepted mutation the [`resolve`] loop runs automatic counter-bids
//! until no eligible competitor could still legally outbid the current
//! leader.
//!
//! # Settled-state invariants
//!
//! After [`resolve`] returns, the following always hold:
//!
//! 1. `current_price >= reserve_price`.
//! 2. `current_price` never decreased.
//! 3. `highest_bidder` matches the most recent price-setting ledger entry.
//! 4. No bidder other than the leader holds a proxy limit that could
//!    still fund a raise of one full increment.
//! 5. The leader's own proxy limit (if declared) is never exceeded.
//!
//! This crate is pure: no clocks, no I/O, no async. Callers pass `now`
//! explicitly and own persistence and mutual exclusion.

pub mod auction;
pub mod phase;
pub mod resolve;
pub mod validate;

pub use auction::{
    Auction,
    AuctionConfig,
    Bid,
    BidOrigin,
};
pub use phase::Phase;
pub use resolve::resolve;
pub use validate::{
    validate_manual_bid,
    validate_proxy_limit,
    BidError,
};
