//! The persistence collaborator consumed by the operations facade.
//!
//! Every stored auction carries a monotonically increasing version.
//! [`AuctionStore::save`] commits only if the caller's version still
//! matches the stored one, which is what lets the facade run its
//! load-validate-resolve-save sequence without a per-auction lock: a
//! concurrent writer surfaces as [`SaveError::VersionConflict`] and the
//! whole sequence is retried.

mod in_memory;

use async_trait::async_trait;
use gavel_engine::Auction;
pub(crate) use in_memory::InMemoryStore;
use uuid::Uuid;

/// An auction together with its optimistic-concurrency token.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VersionedAuction {
    pub(crate) auction: Auction,
    pub(crate) version: u64,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum LoadError {
    #[error("no auction with id {id}")]
    NotFound { id: Uuid },
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum SaveError {
    #[error("no auction with id {id}")]
    NotFound { id: Uuid },
    #[error(
        "auction {id} was modified concurrently: save expected version {expected}, found \
         {stored}"
    )]
    VersionConflict {
        id: Uuid,
        expected: u64,
        stored: u64,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ListFilter {
    pub(crate) seller_id: Option<String>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SortKey {
    #[default]
    StartTime,
    EndTime,
    CurrentPrice,
}

#[async_trait]
pub(crate) trait AuctionStore: Clone + Send + Sync + 'static {
    /// Stores a freshly created auction at version 1.
    async fn create(&self, auction: Auction) -> VersionedAuction;

    async fn load(&self, id: Uuid) -> Result<VersionedAuction, LoadError>;

    /// Persists `versioned.auction` if and only if `versioned.version`
    /// matches the stored version, bumping it by one. All-or-nothing: on
    /// failure the stored record is untouched.
    async fn save(&self, versioned: VersionedAuction) -> Result<VersionedAuction, SaveError>;

    async fn list(&self, filter: &ListFilter, sort: SortKey) -> Vec<Auction>;

    async fn delete(&self, id: Uuid) -> Result<(), LoadError>;
}
