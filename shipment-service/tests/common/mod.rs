#![allow(dead_code)]

use reqwest::StatusCode;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use shipment_service::config::{
    AuthConfig, MongoConfig, QueryConfig, ShipmentConfig, StoreBackend, StoreConfig,
};
use shipment_service::startup::Application;
use std::time::Duration;

pub const TEST_JWT_SECRET: &str = "test-secret";

pub fn test_config() -> ShipmentConfig {
    ShipmentConfig {
        common: CoreConfig {
            port: 0,
            log_level: "warn".to_string(),
            otlp_endpoint: None,
        },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: format!("shipment_test_{}", uuid::Uuid::new_v4().simple()),
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
        },
        auth: AuthConfig {
            jwt_secret: Secret::new(TEST_JWT_SECRET.to_string()),
            token_expiry_days: 7,
            using_fallback_secret: false,
        },
        query: QueryConfig { max_page_size: 100 },
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let app = Application::build(test_config())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Self {
            address,
            port,
            client,
        }
    }

    pub async fn post_raw(&self, body: Value, token: Option<&str>) -> reqwest::Response {
        let mut request = self
            .client
            .post(format!("{}/api/operations", self.address))
            .json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request")
    }

    /// Runs one operation and returns the status with the parsed body.
    pub async fn op(
        &self,
        operation: &str,
        arguments: Value,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self
            .post_raw(json!({ "operation": operation, "arguments": arguments }), token)
            .await;
        let status = response.status();
        let body = response.json().await.expect("Response body is not JSON");
        (status, body)
    }

    pub async fn op_with_fields(
        &self,
        operation: &str,
        arguments: Value,
        fields: &[&str],
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self
            .post_raw(
                json!({ "operation": operation, "arguments": arguments, "fields": fields }),
                token,
            )
            .await;
        let status = response.status();
        let body = response.json().await.expect("Response body is not JSON");
        (status, body)
    }

    pub async fn token_for(&self, role: &str) -> String {
        let (status, body) = self.op("demoLogin", json!({ "role": role }), None).await;
        assert_eq!(status, StatusCode::OK, "demoLogin failed: {}", body);
        body["data"]["token"]
            .as_str()
            .expect("demoLogin returned no token")
            .to_string()
    }

    pub async fn create_shipment(&self, token: &str, input: Value) -> Value {
        let (status, body) = self
            .op("createShipment", json!({ "input": input }), Some(token))
            .await;
        assert_eq!(status, StatusCode::OK, "createShipment failed: {}", body);
        body["data"].clone()
    }
}

pub fn shipment_input(shipper: &str, status: &str) -> Value {
    json!({
        "shipperName": shipper,
        "carrierName": "FedEx",
        "pickupLocation": "New York, NY",
        "deliveryLocation": "Los Angeles, CA",
        "pickupDate": "2024-01-15",
        "deliveryDate": "2024-01-20",
        "status": status,
        "weight": 150.0,
        "rate": 450.0,
        "notes": "Fragile electronics"
    })
}

pub fn error_code(body: &Value) -> &str {
    body["errors"][0]["code"].as_str().unwrap_or("")
}
