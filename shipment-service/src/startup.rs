use crate::config::{ShipmentConfig, StoreBackend};
use crate::handlers;
use crate::services::{MemoryStore, MongoDb, Resolver, ShipmentStore, TokenService, UserStore};
use axum::{middleware::from_fn, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Resolver,
    pub tokens: TokenService,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: Option<MongoDb>,
}

impl Application {
    pub async fn build(config: ShipmentConfig) -> Result<Self, AppError> {
        let (shipments, users, db): (Arc<dyn ShipmentStore>, Arc<dyn UserStore>, Option<MongoDb>) =
            match config.store.backend {
                StoreBackend::Mongo => {
                    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
                        .await
                        .map_err(|e| {
                            tracing::error!("Failed to connect to MongoDB: {}", e);
                            e
                        })?;
                    db.initialize_indexes().await.map_err(|e| {
                        tracing::error!("Failed to initialize database indexes: {}", e);
                        e
                    })?;
                    let shipments: Arc<dyn ShipmentStore> = Arc::new(db.clone());
                    let users: Arc<dyn UserStore> = Arc::new(db.clone());
                    (shipments, users, Some(db))
                }
                StoreBackend::Memory => {
                    tracing::info!("Using in-memory record store");
                    let store = Arc::new(MemoryStore::new());
                    let shipments: Arc<dyn ShipmentStore> = store.clone();
                    let users: Arc<dyn UserStore> = store;
                    (shipments, users, None)
                }
            };

        let tokens = TokenService::new(&config.auth);
        let resolver = Resolver::new(
            shipments,
            users,
            tokens.clone(),
            config.query.max_page_size,
        );

        let state = AppState {
            resolver,
            tokens,
        };

        let router = Router::new()
            .route(
                "/api/operations",
                get(handlers::operation_status).post(handlers::resolve_operation),
            )
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .layer(CorsLayer::permissive())
            .layer(from_fn(metrics_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .layer(from_fn(request_id_middleware))
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router,
            db,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM, drain in-flight requests, then release the
    /// store connection.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(db) = self.db {
            db.shutdown().await;
        }
        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
