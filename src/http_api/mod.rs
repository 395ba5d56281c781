use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    MemoryPayoutStore, PayPeriod, PayoutKey, PayoutRequest, PayoutStatus, PayoutStore,
    PayrollCalculator, PayrollError, PersistenceError, ResourcePayout, ResourceProfile, SlabBand,
    export,
};

type SharedStore = Arc<dyn PayoutStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    calculator: Arc<PayrollCalculator>,
    store: SharedStore,
    profiles: Arc<RwLock<HashMap<String, ResourceProfile>>>,
}

impl AppState {
    pub fn new(calculator: PayrollCalculator) -> Self {
        Self::with_store(calculator, Arc::new(MemoryPayoutStore::new()))
    }

    pub fn with_store(calculator: PayrollCalculator, store: SharedStore) -> Self {
        Self {
            calculator: Arc::new(calculator),
            store,
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers resource profiles; computed payouts carry a snapshot of them.
    pub fn with_profiles(self, profiles: Vec<ResourceProfile>) -> Self {
        {
            let mut guard = self.profiles.write();
            for profile in profiles {
                guard.insert(profile.resource_id.clone(), profile);
            }
        }
        self
    }

    fn profile_list(&self) -> Vec<ResourceProfile> {
        self.profiles.read().values().cloned().collect()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict { code: &'static str, message: String },
    Unprocessable { code: &'static str, message: String },
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<PayrollError> for ApiError {
    fn from(value: PayrollError) -> Self {
        ApiError::Unprocessable {
            code: value.code(),
            message: value.to_string(),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::Locked { .. } => ApiError::Conflict {
                code: "locked",
                message: value.to_string(),
            },
            PersistenceError::InvalidTransition { .. } => ApiError::Conflict {
                code: "invalid_transition",
                message: value.to_string(),
            },
            PersistenceError::NotFound(_) => ApiError::NotFound(value.to_string()),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            ApiError::Unprocessable { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, code, message)
            }
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                tracing::error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct PeriodQuery {
    year: i32,
    month: u32,
}

impl PeriodQuery {
    fn period(&self) -> Result<PayPeriod, ApiError> {
        PayPeriod::new(self.year, self.month).map_err(|err| ApiError::invalid(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config/slabs", get(get_slabs))
        .route("/payouts", get(list_payouts))
        .route("/payouts/compute", post(compute_payout))
        .route("/payouts/export", get(export_payouts))
        .route("/payouts/:resource_id/:year/:month", get(get_payout))
        .route("/payouts/:resource_id/:year/:month/status", put(update_status))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "payroll HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_slabs(State(state): State<AppState>) -> Json<Vec<SlabBand>> {
    Json(state.calculator.config().slabs.bands().to_vec())
}

async fn compute_payout(
    State(state): State<AppState>,
    Json(request): Json<PayoutRequest>,
) -> Result<(StatusCode, Json<ResourcePayout>), ApiError> {
    let now = Utc::now();
    let mut payout = state.calculator.compute(&request)?.stamped(now);
    if let Some(profile) = state.profiles.read().get(&payout.resource_id) {
        payout = payout.with_snapshot(profile.snapshot(now.date_naive()));
    }
    state.store.save_payout(&payout)?;
    Ok((StatusCode::CREATED, Json(payout)))
}

async fn list_payouts(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<ResourcePayout>>, ApiError> {
    let period = query.period()?;
    Ok(Json(state.store.list_payouts(period)?))
}

fn payout_key(resource_id: String, year: i32, month: u32) -> Result<PayoutKey, ApiError> {
    let period =
        PayPeriod::new(year, month).map_err(|err| ApiError::invalid(err.to_string()))?;
    Ok(PayoutKey::new(resource_id, period))
}

async fn get_payout(
    State(state): State<AppState>,
    Path((resource_id, year, month)): Path<(String, i32, u32)>,
) -> Result<Json<ResourcePayout>, ApiError> {
    let key = payout_key(resource_id, year, month)?;
    match state.store.load_payout(&key)? {
        Some(payout) => Ok(Json(payout)),
        None => Err(ApiError::NotFound(format!("no payout stored for {key}"))),
    }
}

async fn update_status(
    State(state): State<AppState>,
    Path((resource_id, year, month)): Path<(String, i32, u32)>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<ResourcePayout>, ApiError> {
    let key = payout_key(resource_id, year, month)?;
    let status = PayoutStatus::from_str(&payload.status)
        .ok_or_else(|| ApiError::invalid(format!("unknown payout status '{}'", payload.status)))?;
    let updated = state.store.update_status(&key, status)?;
    tracing::info!(key = %key, status = %status, "payout status changed");
    Ok(Json(updated))
}

async fn export_payouts(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, ApiError> {
    let period = query.period()?;
    let payouts = state.store.list_payouts(period)?;
    let rows = export::summary_rows(&payouts, &state.profile_list());
    let mut body = Vec::new();
    export::write_summary(&rows, &mut body)?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], body).into_response())
}
