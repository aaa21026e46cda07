use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::STORE_UNAVAILABLE_MESSAGE;

use crate::services::get_metrics;
use crate::startup::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.resolver.shipment_store().ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "shipment-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "shipment-service",
                    "error": STORE_UNAVAILABLE_MESSAGE
                })),
            )
        }
    }
}

pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.resolver.shipment_store().ping().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Shipment, ShipmentChanges, User};
    use crate::services::error::ResolveError;
    use crate::services::query::{ShipmentPage, ShipmentQuery};
    use crate::services::{Resolver, ShipmentStore, TokenService, UserStore};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use mongodb::bson::oid::ObjectId;
    use std::sync::Arc;

    struct UnreachableStore;

    fn down<T>() -> Result<T, ResolveError> {
        Err(ResolveError::StoreUnavailable(
            "connection refused at 10.0.0.3:27017".to_string(),
        ))
    }

    #[async_trait]
    impl ShipmentStore for UnreachableStore {
        async fn ping(&self) -> Result<(), ResolveError> {
            down()
        }
        async fn insert_shipment(&self, _: &Shipment) -> Result<(), ResolveError> {
            down()
        }
        async fn insert_shipments(&self, _: &[Shipment]) -> Result<(), ResolveError> {
            down()
        }
        async fn count_shipments(&self) -> Result<u64, ResolveError> {
            down()
        }
        async fn find_shipment(&self, _: &ObjectId) -> Result<Option<Shipment>, ResolveError> {
            down()
        }
        async fn find_shipments(&self, _: &ShipmentQuery) -> Result<ShipmentPage, ResolveError> {
            down()
        }
        async fn find_tracked_shipment(&self, _: &str) -> Result<Option<Shipment>, ResolveError> {
            down()
        }
        async fn update_shipment(
            &self,
            _: &ObjectId,
            _: &ShipmentChanges,
            _: DateTime<Utc>,
        ) -> Result<Option<Shipment>, ResolveError> {
            down()
        }
        async fn delete_shipment(&self, _: &ObjectId) -> Result<bool, ResolveError> {
            down()
        }
    }

    #[async_trait]
    impl UserStore for UnreachableStore {
        async fn find_user(&self, _: &ObjectId) -> Result<Option<User>, ResolveError> {
            down()
        }
        async fn find_user_by_email(&self, _: &str) -> Result<Option<User>, ResolveError> {
            down()
        }
        async fn find_or_create_user(&self, _: User) -> Result<User, ResolveError> {
            down()
        }
    }

    fn unreachable_state() -> AppState {
        let store = Arc::new(UnreachableStore);
        let tokens = TokenService::from_secret("test-secret", 7);
        AppState {
            resolver: Resolver::new(store.clone(), store, tokens.clone(), 100),
            tokens,
        }
    }

    #[tokio::test]
    async fn test_health_hides_store_error_details() {
        let response = health_check(State(unreachable_state())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["error"], STORE_UNAVAILABLE_MESSAGE);
        assert!(!body.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_readiness_reports_unavailable_store() {
        let response = readiness_check(State(unreachable_state()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
