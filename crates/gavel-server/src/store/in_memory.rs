//! The in-memory storage of auctions.

use std::{
    collections::HashMap,
    sync::Arc,
};

use async_trait::async_trait;
use gavel_engine::Auction;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AuctionStore,
    ListFilter,
    LoadError,
    SaveError,
    SortKey,
    VersionedAuction,
};

#[derive(Clone)]
pub(crate) struct InMemoryStore {
    auctions: Arc<RwLock<HashMap<Uuid, VersionedAuction>>>,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            auctions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl AuctionStore for InMemoryStore {
    async fn create(&self, auction: Auction) -> VersionedAuction {
        let versioned = VersionedAuction {
            auction,
            version: 1,
        };
        self.auctions
            .write()
            .await
            .insert(versioned.auction.id, versioned.clone());
        versioned
    }

    async fn load(&self, id: Uuid) -> Result<VersionedAuction, LoadError> {
        self.auctions.read().await.get(&id).cloned().ok_or(LoadError::NotFound {
            id,
        })
    }

    async fn save(&self, versioned: VersionedAuction) -> Result<VersionedAuction, SaveError> {
        let mut auctions = self.auctions.write().await;
        let id = versioned.auction.id;
        let Some(stored) = auctions.get_mut(&id) else {
            return Err(SaveError::NotFound {
                id,
            });
        };
        if stored.version != versioned.version {
            return Err(SaveError::VersionConflict {
                id,
                expected: versioned.version,
                stored: stored.version,
            });
        }
        stored.auction = versioned.auction;
        stored.version = stored.version.saturating_add(1);
        Ok(stored.clone())
    }

    async fn list(&self, filter: &ListFilter, sort: SortKey) -> Vec<Auction> {
        let auctions = self.auctions.read().await;
        let mut listed: Vec<Auction> = auctions
            .values()
            .filter(|versioned| {
                filter
                    .seller_id
                    .as_deref()
                    .map_or(true, |seller| versioned.auction.config.seller_id == seller)
            })
            .map(|versioned| versioned.auction.clone())
            .collect();
        match sort {
            SortKey::StartTime => listed.sort_by_key(|auction| auction.config.start_time),
            SortKey::EndTime => listed.sort_by_key(|auction| auction.config.end_time),
            SortKey::CurrentPrice => listed.sort_by_key(|auction| auction.current_price),
        }
        listed
    }

    async fn delete(&self, id: Uuid) -> Result<(), LoadError> {
        self.auctions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(LoadError::NotFound {
                id,
            })
    }
}
