//! Standalone random-teleport host.
//!
//! Wires the orchestrator to SQLite-backed players, grants and ledger, a
//! superflat terrain, and a log-only notifier, and exposes the command
//! surface over HTTP.

pub mod api;
pub mod commands;
pub mod config;
pub mod host;

use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use config::Config;
use host::{SqliteGrants, SqliteLedger, SqlitePlayers, SuperflatTerrain, TracingNotifier};
use srtp_core::{
    CommitQueue, EconomyPort, Notifier, PermissionOracle, Ports, RtpOrchestrator,
    SqliteOnceFlagStore,
};
use srtp_db::DbPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    pub orchestrator: Arc<RtpOrchestrator>,
    /// Grant lookup for commands outside the teleport gate chain.
    pub permissions: Arc<dyn PermissionOracle>,
    pub notifier: Arc<dyn Notifier>,
    /// File re-read by `srtp reload`.
    pub config_path: Option<String>,
}

impl AppState {
    /// Builds the host adapters and orchestrator over `pool`.
    ///
    /// Must be called inside a tokio runtime; the commit queue worker is
    /// spawned here.
    pub fn new(pool: DbPool, config: &Config, config_path: Option<String>) -> Self {
        let permissions: Arc<dyn PermissionOracle> = Arc::new(SqliteGrants::new(pool.clone()));
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

        let ports = Ports {
            terrain: Arc::new(SuperflatTerrain::new(&config.worlds)),
            permissions: Arc::clone(&permissions),
            players: Arc::new(SqlitePlayers::new(pool.clone())),
            once_flags: Arc::new(SqliteOnceFlagStore::new(pool.clone())),
            notifier: Arc::clone(&notifier),
        };

        let (commits, _worker) = CommitQueue::start();
        let mut orchestrator = RtpOrchestrator::new(ports, config.rtp.clone(), commits);
        if let Some(economy) = economy_for(config, &pool) {
            orchestrator = orchestrator.with_economy(economy);
        }

        Self {
            pool,
            orchestrator: Arc::new(orchestrator),
            permissions,
            notifier,
            config_path,
        }
    }
}

/// The economy binding selected by `[economy]`.
pub fn economy_for(config: &Config, pool: &DbPool) -> Option<Arc<dyn EconomyPort>> {
    config
        .economy
        .enabled
        .then(|| Arc::new(SqliteLedger::new(pool.clone())) as Arc<dyn EconomyPort>)
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/commands", post(api::command_handler))
        .route(
            "/api/players/{id}",
            put(api::put_player_handler).delete(api::delete_player_handler),
        )
        .route("/api/players/{id}/grants", put(api::put_grants_handler))
        .route("/api/accounts/{id}", put(api::put_account_handler))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
