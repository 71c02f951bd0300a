//! The JSON-RPC intake for auction operations.
//!
//! Transport framing lives entirely here: requests arrive as typed raw
//! parameter structs, every required field is checked before anything is
//! handed to the facade, and facade rejections map onto JSON-RPC error
//! codes. The facade and engine never see transport concerns.

use eyre::WrapErr as _;
use gavel_engine::{
    Auction,
    AuctionConfig,
};
use jiff::Timestamp;
use jsonrpsee::{
    server::Server,
    types::{
        ErrorCode,
        ErrorObject,
        ErrorObjectOwned,
    },
    RpcModule,
};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::{
    ops::{
        AuctionService,
        OpError,
        ProxyLimitConfirmation,
    },
    store::{
        AuctionStore,
        ListFilter,
        SortKey,
    },
};

const AUCTION_CREATE: &str = "auction_create";
const AUCTION_LIST: &str = "auction_list";
const AUCTION_GET: &str = "auction_get";
const AUCTION_PLACE_BID: &str = "auction_placeBid";
const AUCTION_SET_PROXY_LIMIT: &str = "auction_setProxyLimit";
const AUCTION_DELETE: &str = "auction_delete";

/// JSON-RPC application error code for a missing auction.
const NOT_FOUND_CODE: i32 = -32001;
/// JSON-RPC application error code for a retryable write conflict.
const CONFLICT_CODE: i32 = -32002;

pub(crate) struct Builder<S> {
    pub(crate) cancellation_token: CancellationToken,
    pub(crate) endpoint: String,
    pub(crate) service: AuctionService<S>,
}

impl<S: AuctionStore> Builder<S> {
    /// Spawns the JSON-RPC server on the tokio runtime.
    pub(crate) fn start(self) -> JoinHandle<eyre::Result<()>> {
        let Self {
            cancellation_token,
            endpoint,
            service,
        } = self;

        tokio::spawn(async move {
            let server = Server::builder()
                .build(&endpoint)
                .await
                .wrap_err_with(|| format!("failed instantiating jsonrpc server `{endpoint}`"))?;
            info!(%endpoint, "listening for auction requests");

            let mut module = RpcModule::new(service);
            module
                .register_async_method(AUCTION_CREATE, |params, service, _| async move {
                    let raw: RawAuctionConfig = params.one().map_err(RpcError::ParseParams)?;
                    let config = raw.interpret()?;
                    Ok::<_, RpcError>(service.create_auction(config).await?)
                })
                .wrap_err_with(|| format!("failed registering `{AUCTION_CREATE}`"))?;
            module
                .register_async_method(AUCTION_LIST, |params, service, _| async move {
                    // Filters are optional; an absent params object means
                    // the default listing.
                    let raw: ListParams = params.one().unwrap_or_default();
                    let filter = ListFilter {
                        seller_id: raw.seller_id,
                    };
                    let sort = raw.sort.unwrap_or_default();
                    Ok::<_, RpcError>(service.list_auctions(filter, sort).await)
                })
                .wrap_err_with(|| format!("failed registering `{AUCTION_LIST}`"))?;
            module
                .register_async_method(AUCTION_GET, |params, service, _| async move {
                    let raw: IdParams = params.one().map_err(RpcError::ParseParams)?;
                    Ok::<_, RpcError>(service.get_auction(raw.parse_id()?).await?)
                })
                .wrap_err_with(|| format!("failed registering `{AUCTION_GET}`"))?;
            module
                .register_async_method(AUCTION_PLACE_BID, |params, service, _| async move {
                    let raw: PlaceBidParams = params.one().map_err(RpcError::ParseParams)?;
                    let id = parse_id(&raw.id)?;
                    Ok::<_, RpcError>(service.place_bid(id, &raw.bidder_id, raw.amount).await?)
                })
                .wrap_err_with(|| format!("failed registering `{AUCTION_PLACE_BID}`"))?;
            module
                .register_async_method(AUCTION_SET_PROXY_LIMIT, |params, service, _| async move {
                    let raw: SetProxyLimitParams = params.one().map_err(RpcError::ParseParams)?;
                    let id = parse_id(&raw.id)?;
                    let (auction, confirmation) = service
                        .set_proxy_limit(id, &raw.bidder_id, raw.max_bid)
                        .await?;
                    Ok::<_, RpcError>(SetProxyLimitResponse {
                        auction,
                        confirmation,
                    })
                })
                .wrap_err_with(|| format!("failed registering `{AUCTION_SET_PROXY_LIMIT}`"))?;
            module
                .register_async_method(AUCTION_DELETE, |params, service, _| async move {
                    let raw: IdParams = params.one().map_err(RpcError::ParseParams)?;
                    let id = raw.parse_id()?;
                    service.delete_auction(id).await?;
                    Ok::<_, RpcError>(DeleteResponse {
                        deleted: id,
                    })
                })
                .wrap_err_with(|| format!("failed registering `{AUCTION_DELETE}`"))?;

            let handle = server.start(module);
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    let _ = handle.stop();
                },
                _ = handle.clone().stopped() => {},
            };
            Ok(())
        })
    }
}

fn parse_id(raw: &str) -> Result<Uuid, RpcError> {
    Uuid::parse_str(raw).map_err(|source| RpcError::InvalidId {
        raw: raw.to_string(),
        source,
    })
}

/// The create-auction payload before any field is trusted.
///
/// All fields are optional at the wire level so that a missing one can be
/// named in the rejection instead of failing opaquely during
/// deserialization.
#[derive(Debug, Deserialize)]
struct RawAuctionConfig {
    seller_id: Option<String>,
    location: Option<String>,
    description: Option<String>,
    appraised_value: Option<u64>,
    reserve_price: Option<u64>,
    min_increment: Option<u64>,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
}

impl RawAuctionConfig {
    fn interpret(self) -> Result<AuctionConfig, RpcError> {
        fn required<T>(field: Option<T>, name: &'static str) -> Result<T, RpcError> {
            field.ok_or(RpcError::Op(OpError::MissingField(name)))
        }

        Ok(AuctionConfig {
            seller_id: required(self.seller_id, "seller_id")?,
            location: required(self.location, "location")?,
            description: required(self.description, "description")?,
            appraised_value: self.appraised_value,
            reserve_price: required(self.reserve_price, "reserve_price")?,
            min_increment: required(self.min_increment, "min_increment")?,
            start_time: required(self.start_time, "start_time")?,
            end_time: required(self.end_time, "end_time")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(default)]
    seller_id: Option<String>,
    #[serde(default)]
    sort: Option<SortKey>,
}

#[derive(Debug, Deserialize)]
struct IdParams {
    id: String,
}

impl IdParams {
    fn parse_id(&self) -> Result<Uuid, RpcError> {
        parse_id(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct PlaceBidParams {
    id: String,
    bidder_id: String,
    amount: u64,
}

#[derive(Debug, Deserialize)]
struct SetProxyLimitParams {
    id: String,
    bidder_id: String,
    max_bid: u64,
}

#[derive(Clone, Debug, serde::Serialize)]
struct SetProxyLimitResponse {
    auction: Auction,
    confirmation: ProxyLimitConfirmation,
}

#[derive(Clone, Debug, serde::Serialize)]
struct DeleteResponse {
    deleted: Uuid,
}

#[derive(Debug, thiserror::Error)]
enum RpcError {
    #[error("failed parsing request parameters")]
    ParseParams(#[source] ErrorObjectOwned),
    #[error("`{raw}` is not a valid auction id")]
    InvalidId {
        raw: String,
        source: uuid::Error,
    },
    #[error(transparent)]
    Op(#[from] OpError),
}

impl From<RpcError> for ErrorObject<'static> {
    fn from(value: RpcError) -> Self {
        let invalid_params =
            |message: String| ErrorObject::owned::<()>(ErrorCode::InvalidParams.code(), message, None);
        match value {
            RpcError::ParseParams(source) => {
                invalid_params(format!("failed parsing request parameters: {source}"))
            }
            RpcError::InvalidId {
                ..
            } => invalid_params(value.to_string()),
            RpcError::Op(op) => match &op {
                OpError::NotFound {
                    ..
                } => ErrorObject::owned::<()>(NOT_FOUND_CODE, op.to_string(), None),
                OpError::Conflict {
                    ..
                } => ErrorObject::owned::<()>(CONFLICT_CODE, op.to_string(), None),
                OpError::MissingField(_)
                | OpError::ZeroIncrement
                | OpError::InvalidWindow
                | OpError::Rejected(_) => invalid_params(op.to_string()),
            },
        }
    }
}
