// src/api.rs
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Deployment;
use crate::dashboard::{AmountInput, Dashboard, DashboardSnapshot, TxAction};
use crate::errors::DashboardError;
use crate::tx::{TxEvent, TxPopupState};
use crate::view;

#[derive(Clone)]
struct AppState {
    dashboard: Arc<Dashboard>,
    deployment: Arc<Deployment>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct AmountRequest {
    amount: String,
}

#[derive(Serialize)]
struct ReconnectResponse {
    status: &'static str,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match self {
            DashboardError::Busy | DashboardError::Rejected(_) => StatusCode::CONFLICT,
            DashboardError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

pub fn router(dashboard: Arc<Dashboard>, deployment: Deployment) -> Router {
    let state = AppState {
        dashboard,
        deployment: Arc::new(deployment),
    };
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(dashboard_state))
        .route("/api/mint/amount", post(mint_amount))
        .route("/api/burn/amount", post(burn_amount))
        .route("/api/mint", post(mint))
        .route("/api/burn", post(burn))
        .route("/api/rebase", post(rebase))
        .route("/api/popup/dismiss", post(dismiss_popup))
        .route("/api/reconnect", post(reconnect))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(view::render_page(&state.dashboard.snapshot(), &state.deployment))
}

async fn dashboard_state(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.snapshot())
}

async fn mint_amount(State(state): State<AppState>, Json(req): Json<AmountRequest>) -> Json<AmountInput> {
    Json(state.dashboard.set_mint_amount(&req.amount).await)
}

async fn burn_amount(State(state): State<AppState>, Json(req): Json<AmountRequest>) -> Json<AmountInput> {
    Json(state.dashboard.set_burn_amount(&req.amount).await)
}

fn start(state: &AppState, action: TxAction) -> Result<(StatusCode, Json<TxPopupState>), DashboardError> {
    let popup = state.dashboard.start_action(action)?;
    Ok((StatusCode::ACCEPTED, Json(popup)))
}

async fn mint(State(state): State<AppState>) -> Result<(StatusCode, Json<TxPopupState>), DashboardError> {
    start(&state, TxAction::Mint)
}

async fn burn(State(state): State<AppState>) -> Result<(StatusCode, Json<TxPopupState>), DashboardError> {
    start(&state, TxAction::Burn)
}

async fn rebase(State(state): State<AppState>) -> Result<(StatusCode, Json<TxPopupState>), DashboardError> {
    start(&state, TxAction::Rebase)
}

async fn dismiss_popup(State(state): State<AppState>) -> Result<Json<TxPopupState>, DashboardError> {
    state.dashboard.popup().dispatch(TxEvent::Dismiss).map(Json)
}

async fn reconnect(State(state): State<AppState>) -> (StatusCode, Json<ReconnectResponse>) {
    info!("reconnect requested");
    let dashboard = state.dashboard.clone();
    tokio::spawn(async move { dashboard.reconnect().await });
    (StatusCode::ACCEPTED, Json(ReconnectResponse { status: "connecting" }))
}
