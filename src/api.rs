// Axie Ledger - REST API with Axum
//
// POST /api/axie/fetch           ingest one page of marketplace listings
// GET  /api/axie/all             every stored axie, keyed by class
// GET  /api/axie/smart-contract  read-only token contract queries

use crate::aggregator::collect_all;
use crate::contract::{ContractFacade, TokenContract};
use crate::db::Database;
use crate::error::Error;
use crate::ingestion::{IngestionEngine, COMPLETION_MESSAGE};
use crate::marketplace::ListingSource;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;

/// Shared application state
pub struct AppState<S, C> {
    pub db: Database,
    pub ingestion: Arc<IngestionEngine<S>>,
    pub contract: Arc<ContractFacade<C>>,
}

impl<S, C> AppState<S, C> {
    pub fn new(db: Database, ingestion: IngestionEngine<S>, contract: ContractFacade<C>) -> Self {
        Self {
            db,
            ingestion: Arc::new(ingestion),
            contract: Arc::new(contract),
        }
    }
}

impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            ingestion: Arc::clone(&self.ingestion),
            contract: Arc::clone(&self.contract),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContractParams {
    pub action: Option<String>,
    pub address: Option<String>,
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        Error::EmptyResult(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/axie/fetch - Pull one page of listings and upsert it
async fn fetch_axies<S, C>(State(state): State<AppState<S, C>>) -> Response
where
    S: ListingSource + 'static,
    C: TokenContract + 'static,
{
    match state.ingestion.run().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "message": COMPLETION_MESSAGE }))).into_response(),
        Err(e) if e.is_empty_result() => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No Axies found from the API." })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "An error occurred while fetching Axie data.",
                "error": e.message(),
            })),
        )
            .into_response(),
    }
}

/// GET /api/axie/all - Every stored axie grouped by class
async fn get_all_axies<S, C>(State(state): State<AppState<S, C>>) -> Response
where
    S: ListingSource + 'static,
    C: TokenContract + 'static,
{
    let db = state.db.clone();
    let snapshot = tokio::task::spawn_blocking(move || collect_all(&db))
        .await
        .map_err(|e| Error::storage(format!("retrieval task failed: {}", e)))
        .and_then(|result| result);

    match snapshot {
        Ok(Some(snapshot)) => (StatusCode::OK, Json(snapshot)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No Axies found." })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "error fetching axies");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.message() })),
            )
                .into_response()
        }
    }
}

/// GET /api/axie/smart-contract?action=...&address=... - Token contract query
async fn smart_contract<S, C>(
    State(state): State<AppState<S, C>>,
    Query(params): Query<ContractParams>,
) -> Response
where
    S: ListingSource + 'static,
    C: TokenContract + 'static,
{
    match state
        .contract
        .query(params.action.as_deref(), params.address.as_deref())
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => (status_for(&e), Json(json!({ "error": e.message() }))).into_response(),
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router<S, C>(state: AppState<S, C>) -> Router
where
    S: ListingSource + 'static,
    C: TokenContract + 'static,
{
    let axie_routes = Router::new()
        .route("/smart-contract", get(smart_contract::<S, C>))
        .route("/fetch", post(fetch_axies::<S, C>))
        .route("/all", get(get_all_axies::<S, C>))
        .with_state(state);

    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/axie", axie_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&Error::invalid_request("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&Error::empty("x")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&Error::upstream("x")), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(&Error::storage("x")), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
