//! Gavel serves competitive bidding on time-boxed auctions.
//!
//! The service wraps the [`gavel_engine`] settlement engine with a
//! versioned auction store, an operations facade, and a JSON-RPC
//! server. Every mutating request runs load → lifecycle check →
//! validation → mutation → proxy resolution → save as one atomic unit;
//! concurrent writers to the same auction are serialized by optimistic
//! concurrency on the stored version and retried a bounded number of
//! times.

use std::{
    future::Future,
    task::Poll,
};

pub mod config;
mod jsonrpc_server;
mod ops;
mod store;

pub use config::Config;
use eyre::WrapErr as _;
use tokio::task::{
    JoinError,
    JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// The running service returned by [`Service::spawn`].
pub struct Service {
    shutdown_token: CancellationToken,
    task: Option<JoinHandle<eyre::Result<()>>>,
}

impl Service {
    /// Spawns the auction service with a fresh in-memory store.
    #[must_use]
    pub fn spawn(cfg: Config) -> Self {
        let shutdown_token = CancellationToken::new();
        let service = ops::AuctionService::new(store::InMemoryStore::new());
        let task = jsonrpc_server::Builder {
            cancellation_token: shutdown_token.child_token(),
            endpoint: cfg.listen_addr,
            service,
        }
        .start();

        Self {
            shutdown_token,
            task: Some(task),
        }
    }

    /// Shuts down the service, waiting for in-flight requests to settle.
    ///
    /// # Errors
    /// Returns an error if the server task ended with an error.
    ///
    /// # Panics
    /// Panics if called twice.
    #[instrument(skip_all, err)]
    pub async fn shutdown(&mut self) -> eyre::Result<()> {
        self.shutdown_token.cancel();
        flatten_join_result(
            self.task
                .take()
                .expect("shutdown must not be called twice")
                .await,
        )
    }
}

impl Future for Service {
    type Output = eyre::Result<()>;

    fn poll(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Self::Output> {
        use futures::future::FutureExt as _;

        let task = self
            .task
            .as_mut()
            .expect("service must not be polled after shutdown");
        task.poll_unpin(cx).map(flatten_join_result)
    }
}

fn flatten_join_result<T>(res: Result<eyre::Result<T>, JoinError>) -> eyre::Result<T> {
    match res {
        Ok(Ok(val)) => Ok(val),
        Ok(Err(err)) => Err(err).wrap_err("task returned with error"),
        Err(err) => Err(err).wrap_err("task panicked"),
    }
}
