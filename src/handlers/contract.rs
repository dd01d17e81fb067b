use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::{AppError, Result},
    handlers::AppState,
    models::contract::{ContractDto, ContractPatch, NewContract},
};

/// Get all contracts handler
pub async fn list_contracts(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let contracts = state.contracts.list_all().await?;
    let dtos: Vec<ContractDto> = contracts.into_iter().map(ContractDto::from).collect();
    Ok((StatusCode::OK, Json(dtos)))
}

/// Get contract by ID handler
pub async fn get_contract(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let contract = state
        .contracts
        .get(id)
        .await?
        .ok_or(AppError::ContractNotFound(id))?;
    Ok((StatusCode::OK, Json(ContractDto::from(contract))))
}

/// Create contract handler
pub async fn create_contract(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewContract>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(input) = payload?;
    let contract = state.contracts.create(input).await?;
    Ok((StatusCode::OK, Json(ContractDto::from(contract))))
}

/// Update contract handler
pub async fn update_contract(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
    payload: std::result::Result<Json<ContractPatch>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    let contract = state
        .contracts
        .update(id, patch)
        .await?
        .ok_or(AppError::ContractNotFound(id))?;
    Ok((StatusCode::OK, Json(ContractDto::from(contract))))
}

/// Whether any contract is registered under the tax ID
pub async fn check_inn(
    State(state): State<AppState>,
    Path(inn): Path<String>,
) -> Result<impl IntoResponse> {
    let exists = state.contracts.find_by_inn(&inn).await?.is_some();
    Ok((StatusCode::OK, Json(exists)))
}
