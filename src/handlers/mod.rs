pub mod contract;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::store::ContractStore;

/// State shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub contracts: Arc<ContractStore>,
}

impl AppState {
    pub fn new(contracts: ContractStore) -> Self {
        Self {
            contracts: Arc::new(contracts),
        }
    }
}

/// Routes for the contracts API
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/contracts",
            get(contract::list_contracts).post(contract::create_contract),
        )
        .route("/api/contracts/check-inn/{inn}", get(contract::check_inn))
        .route(
            "/api/contracts/{id}",
            get(contract::get_contract).put(contract::update_contract),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "Contracts server is running."
}
