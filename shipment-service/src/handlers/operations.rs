use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::services::{execute, AuthContext, OperationRequest};
use crate::startup::AppState;

/// `POST /api/operations`
pub async fn resolve_operation(
    State(state): State<AppState>,
    ctx: AuthContext,
    payload: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Malformed operation request");
        AppError::BadRequest(anyhow::anyhow!(rejection.body_text()))
    })?;

    let data = execute(&state.resolver, &ctx, request).await?;
    Ok(Json(json!({ "data": data })))
}

/// `GET /api/operations`
pub async fn operation_status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Shipment operations endpoint. POST {operation, arguments, fields} to resolve."
    }))
}
