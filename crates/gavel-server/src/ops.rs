//! The operations facade.
//!
//! The facade is the only component that commits new auction state. Both
//! mutating operations run the full load-validate-mutate-resolve-save
//! sequence as one atomic unit: a validation failure aborts before any
//! mutation, and a failed save persists nothing. Concurrent writers to
//! the same auction are serialized by the store's version check; on a
//! conflict the whole sequence is retried a bounded number of times
//! before surfacing [`OpError::Conflict`].

use gavel_engine::{
    resolve,
    validate_manual_bid,
    validate_proxy_limit,
    Auction,
    AuctionConfig,
    BidError,
};
use jiff::Timestamp;
use tracing::{
    debug,
    info,
    instrument,
};
use uuid::Uuid;

use crate::store::{
    AuctionStore,
    ListFilter,
    LoadError,
    SaveError,
    SortKey,
};

/// How often a conflicted load-validate-resolve-save sequence is retried
/// before the caller is told to try again.
const MAX_SAVE_ATTEMPTS: u32 = 3;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum OpError {
    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),
    #[error("minimum increment must be greater than zero")]
    ZeroIncrement,
    #[error("end time must be after start time")]
    InvalidWindow,
    #[error("no auction with id {id}")]
    NotFound { id: Uuid },
    #[error(transparent)]
    Rejected(#[from] BidError),
    #[error("auction {id} is being modified concurrently, try again")]
    Conflict { id: Uuid },
}

impl From<LoadError> for OpError {
    fn from(value: LoadError) -> Self {
        match value {
            LoadError::NotFound {
                id,
            } => Self::NotFound {
                id,
            },
        }
    }
}

/// Confirmation returned alongside the settled auction after a
/// proxy-limit change.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub(crate) struct ProxyLimitConfirmation {
    pub(crate) bidder_id: String,
    pub(crate) max_bid: u64,
    /// The limit this change overwrote, if the bidder had one.
    pub(crate) previous_max_bid: Option<u64>,
}

#[derive(Clone)]
pub(crate) struct AuctionService<S> {
    store: S,
}

impl<S: AuctionStore> AuctionService<S> {
    pub(crate) fn new(store: S) -> Self {
        Self {
            store,
        }
    }

    /// Creates and persists a new auction at its reserve price.
    #[instrument(skip_all, fields(seller_id = %config.seller_id), err)]
    pub(crate) async fn create_auction(&self, config: AuctionConfig) -> Result<Auction, OpError> {
        if config.seller_id.is_empty() {
            return Err(OpError::MissingField("seller_id"));
        }
        if config.description.is_empty() {
            return Err(OpError::MissingField("description"));
        }
        if config.min_increment == 0 {
            return Err(OpError::ZeroIncrement);
        }
        if config.end_time <= config.start_time {
            return Err(OpError::InvalidWindow);
        }
        let auction = Auction::new(Uuid::new_v4(), config);
        let created = self.store.create(auction).await;
        info!(auction_id = %created.auction.id, "created auction");
        Ok(created.auction)
    }

    /// Places a manual bid and settles the auction.
    #[instrument(skip(self), fields(%auction_id, bidder_id, amount), err)]
    pub(crate) async fn place_bid(
        &self,
        auction_id: Uuid,
        bidder_id: &str,
        amount: u64,
    ) -> Result<Auction, OpError> {
        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let mut versioned = self.store.load(auction_id).await?;
            let now = Timestamp::now();
            let accepted = validate_manual_bid(&versioned.auction, now, bidder_id, amount)?;

            let price_changed = versioned.auction.record_manual_bid(bidder_id, accepted, now);
            let auto_bids = resolve(&mut versioned.auction, now);
            if !price_changed && !auto_bids {
                // Leader re-confirmation. Nothing changed, nothing to save.
                debug!("leader re-confirmed their position without a price change");
                return Ok(versioned.auction);
            }

            match self.store.save(versioned).await {
                Ok(saved) => {
                    info!(
                        current_price = saved.auction.current_price,
                        leader = saved.auction.highest_bidder.as_deref().unwrap_or(""),
                        "bid settled"
                    );
                    return Ok(saved.auction);
                }
                Err(SaveError::VersionConflict {
                    ..
                }) => {
                    debug!(attempt, "concurrent modification detected, retrying");
                }
                Err(SaveError::NotFound {
                    id,
                }) => {
                    return Err(OpError::NotFound {
                        id,
                    })
                }
            }
        }
        Err(OpError::Conflict {
            id: auction_id,
        })
    }

    /// Sets or overwrites a bidder's proxy limit and settles the auction.
    #[instrument(skip(self), fields(%auction_id, bidder_id, max_bid), err)]
    pub(crate) async fn set_proxy_limit(
        &self,
        auction_id: Uuid,
        bidder_id: &str,
        max_bid: u64,
    ) -> Result<(Auction, ProxyLimitConfirmation), OpError> {
        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let mut versioned = self.store.load(auction_id).await?;
            let now = Timestamp::now();
            let accepted = validate_proxy_limit(&versioned.auction, now, bidder_id, max_bid)?;

            let previous_max_bid = versioned
                .auction
                .upsert_proxy_limit(bidder_id.to_string(), accepted);
            resolve(&mut versioned.auction, now);

            match self.store.save(versioned).await {
                Ok(saved) => {
                    info!(
                        current_price = saved.auction.current_price,
                        leader = saved.auction.highest_bidder.as_deref().unwrap_or(""),
                        "proxy limit set and auction settled"
                    );
                    let confirmation = ProxyLimitConfirmation {
                        bidder_id: bidder_id.to_string(),
                        max_bid: accepted,
                        previous_max_bid,
                    };
                    return Ok((saved.auction, confirmation));
                }
                Err(SaveError::VersionConflict {
                    ..
                }) => {
                    debug!(attempt, "concurrent modification detected, retrying");
                }
                Err(SaveError::NotFound {
                    id,
                }) => {
                    return Err(OpError::NotFound {
                        id,
                    })
                }
            }
        }
        Err(OpError::Conflict {
            id: auction_id,
        })
    }

    #[instrument(skip(self), fields(%auction_id), err)]
    pub(crate) async fn get_auction(&self, auction_id: Uuid) -> Result<Auction, OpError> {
        Ok(self.store.load(auction_id).await?.auction)
    }

    #[instrument(skip(self))]
    pub(crate) async fn list_auctions(&self, filter: ListFilter, sort: SortKey) -> Vec<Auction> {
        self.store.list(&filter, sort).await
    }

    #[instrument(skip(self), fields(%auction_id), err)]
    pub(crate) async fn delete_auction(&self, auction_id: Uuid) -> Result<(), OpError> {
        self.store.delete(auction_id).await?;
        info!("deleted auction");
        Ok(())
    }
}
