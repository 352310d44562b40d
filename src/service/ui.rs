//! HTTP front-end to the ledger
//!
//! Supplies the wall-clock time and the caller's identity to the ledger;
//! nothing below this layer reads either on its own.
use crate::{
    auction::{Amount, BidError, Identity, Item, ItemId, ItemStatus, Timestamp},
    catalog::CatalogFilter,
    ledger::SharedBidLedger,
    service::LoopService,
    session::{SessionError, SessionId, SharedSession, SharedSessionRegistry},
};
use anyhow::{format_err, Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::{runtime::Runtime, sync::oneshot};
use tracing::info;

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone)]
struct AppState {
    ledger: SharedBidLedger,
    sessions: SharedSessionRegistry,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Bid(#[from] BidError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("missing x-session-id header")]
    MissingSession,
    #[error("malformed session id")]
    MalformedSession,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Bid(BidError::ItemNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Bid(BidError::AuctionClosed) => StatusCode::CONFLICT,
            ApiError::Bid(BidError::BidTooLow { .. } | BidError::BidTooHigh { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Session(SessionError::EmptyName) | ApiError::MalformedSession => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Session(SessionError::UnknownSession(_)) | ApiError::MissingSession => {
                StatusCode::UNAUTHORIZED
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// An item as shown to callers, with its live status
#[derive(Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    item: Item,
    status: ItemStatus,
}

impl ItemView {
    fn new(item: Item, now: Timestamp) -> Self {
        let status = item.status(now);
        Self { item, status }
    }
}

#[derive(Serialize)]
struct WinnerResponse {
    item_id: ItemId,
    status: ItemStatus,
    winner: Option<Identity>,
}

#[derive(Deserialize)]
struct BidRequest {
    amount: Amount,
}

#[derive(Serialize)]
struct BidResponse {
    item_id: ItemId,
    current_bid: Amount,
    highest_bidder: Identity,
}

#[derive(Deserialize)]
struct OpenSessionRequest {
    name: String,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: SessionId,
    identity: Option<Identity>,
}

fn session_from(state: &AppState, headers: &HeaderMap) -> Result<(SessionId, SharedSession), ApiError> {
    let raw = headers
        .get(SESSION_HEADER)
        .ok_or(ApiError::MissingSession)?;
    let id: SessionId = raw
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or(ApiError::MalformedSession)?;
    Ok((id, state.sessions.get(id)?))
}

fn identity_from(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let (_, session) = session_from(state, headers)?;
    session.current_identity().ok_or(ApiError::MissingSession)
}

async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> Json<Vec<ItemView>> {
    let now = Utc::now();
    let items = filter.apply(state.ledger.list(), now);
    Json(items.into_iter().map(|item| ItemView::new(item, now)).collect())
}

async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> Result<Json<ItemView>, ApiError> {
    Ok(Json(ItemView::new(state.ledger.get(item_id)?, Utc::now())))
}

async fn get_winner(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> Result<Json<WinnerResponse>, ApiError> {
    let now = Utc::now();
    Ok(Json(WinnerResponse {
        item_id,
        status: state.ledger.status(item_id, now)?,
        winner: state.ledger.winner(item_id, now)?,
    }))
}

async fn place_bid(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
    headers: HeaderMap,
    Json(request): Json<BidRequest>,
) -> Result<Json<BidResponse>, ApiError> {
    let bidder = identity_from(&state, &headers)?;
    let current_bid = state
        .ledger
        .place_bid(item_id, &bidder, request.amount, Utc::now())?;
    Ok(Json(BidResponse {
        item_id,
        current_bid,
        highest_bidder: bidder,
    }))
}

async fn my_bids(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ItemView>>, ApiError> {
    let identity = identity_from(&state, &headers)?;
    let now = Utc::now();
    Ok(Json(
        state
            .ledger
            .bids_by(&identity)
            .into_iter()
            .map(|item| ItemView::new(item, now))
            .collect(),
    ))
}

async fn open_session(
    State(state): State<AppState>,
    Json(request): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let (session_id, session) = state.sessions.open(&request.name)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            identity: session.current_identity(),
        }),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let (session_id, session) = session_from(&state, &headers)?;
    Ok(Json(SessionResponse {
        session_id,
        identity: session.current_identity(),
    }))
}

async fn close_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let (session_id, _) = session_from(&state, &headers)?;
    state.sessions.close(session_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn router(ledger: SharedBidLedger, sessions: SharedSessionRegistry) -> Router {
    Router::new()
        .route("/items", get(list_items))
        .route("/items/:id", get(get_item))
        .route("/items/:id/bids", post(place_bid))
        .route("/items/:id/winner", get(get_winner))
        .route("/my-bids", get(my_bids))
        .route(
            "/session",
            post(open_session).get(get_session).delete(close_session),
        )
        .with_state(AppState { ledger, sessions })
}

async fn run_http_server(
    listen: SocketAddr,
    ledger: SharedBidLedger,
    sessions: SharedSessionRegistry,
) -> Result<()> {
    let app = router(ledger, sessions);

    info!(%listen, "http server listening");
    axum::Server::try_bind(&listen)?
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

pub struct Ui {
    // cancels all tasks on drop
    _runtime: Runtime,
    server_rx: oneshot::Receiver<Result<()>>,
}

impl Ui {
    pub fn new(
        listen: SocketAddr,
        ledger: SharedBidLedger,
        sessions: SharedSessionRegistry,
    ) -> Result<Self> {
        let runtime = Runtime::new()?;

        let (tx, rx) = oneshot::channel();

        runtime.spawn(async move {
            // the receiver only goes away together with the runtime
            let _ = tx.send(
                run_http_server(listen, ledger, sessions)
                    .await
                    .with_context(|| format!("Failed to run http server on {listen}")),
            );
        });

        Ok(Self {
            _runtime: runtime,
            server_rx: rx,
        })
    }
}

impl LoopService for Ui {
    fn name(&self) -> &'static str {
        "ui"
    }

    fn run_iteration(&mut self) -> Result<()> {
        // don't hog the cpu
        std::thread::sleep(std::time::Duration::from_millis(100));

        match self.server_rx.try_recv() {
            Ok(res) => res,
            Err(oneshot::error::TryRecvError::Empty) => Ok(()),
            Err(oneshot::error::TryRecvError::Closed) => {
                Err(format_err!("ui server died without leaving a response?!"))
            }
        }
    }
}
