//! HTTP API for the casino ledger.
//!
//! A thin JSON mapping of the ledger and wager resolver. Identity is resolved
//! upstream; wallet and game routes act for the user named in `x-user-id`.
//!
//! # Modules
//!
//! - [`accounts`]: Balance provisioning for newly registered users
//! - [`wallet`]: Balance, deposit, withdraw and transaction history
//! - [`games`]: Wager placement and game history
//! - [`middleware`]: Resolved-user extraction for protected endpoints
//! - [`request_id`]: Request correlation and request metrics
//! - [`errors`]: Error type and HTTP status mapping
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use casino_ledger::{LedgerConfig, Stores};
//! use casino_ledger::wager::RandomOutcome;
//! use cl_server::api::{AppState, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(
//!     Stores::in_memory(),
//!     LedgerConfig::default(),
//!     Arc::new(RandomOutcome::new()),
//!     None,
//! );
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod accounts;
pub mod errors;
pub mod games;
pub mod middleware;
pub mod request_id;
pub mod wallet;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use casino_ledger::{
    Database, Ledger, LedgerConfig, Stores, WagerResolver, wager::OutcomeSource,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub resolver: Arc<WagerResolver>,
    /// Present when the stores are backed by PostgreSQL
    pub database: Option<Database>,
}

impl AppState {
    /// Wire a ledger and resolver over one set of stores
    pub fn new(
        stores: Stores,
        config: LedgerConfig,
        outcomes: Arc<dyn OutcomeSource>,
        database: Option<Database>,
    ) -> Self {
        let ledger = Arc::new(Ledger::with_config(
            stores.accounts,
            stores.transactions,
            config,
        ));
        let resolver = Arc::new(WagerResolver::with_outcomes(
            ledger.clone(),
            stores.history,
            outcomes,
        ));

        Self {
            ledger,
            resolver,
            database,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health                   - Health check (public)
/// POST /api/v1/accounts          - Provision a wallet (internal)
/// GET  /api/v1/wallet            - Get wallet (x-user-id required)
/// POST /api/v1/wallet/deposit    - Deposit (x-user-id required)
/// POST /api/v1/wallet/withdraw   - Withdraw (x-user-id required)
/// GET  /api/v1/transactions      - Transaction history (x-user-id required)
/// POST /api/v1/games/bet         - Place a wager (x-user-id required)
/// GET  /api/v1/games/history     - Game history (x-user-id required)
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    let provisioning_routes = Router::new().route("/accounts", post(accounts::open_account));

    let user_routes = Router::new()
        .route("/wallet", get(wallet::get_wallet))
        .route("/wallet/deposit", post(wallet::deposit))
        .route("/wallet/withdraw", post(wallet::withdraw))
        .route("/transactions", get(wallet::list_transactions))
        .route("/games/bet", post(games::place_bet))
        .route("/games/history", get(games::game_history))
        .layer(axum::middleware::from_fn(middleware::user_id_middleware));

    Router::new()
        .merge(provisioning_routes)
        .merge(user_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage is reachable, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","storage":"memory","database":true,"timestamp":"2026-01-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, db_healthy) = match &state.database {
        Some(database) => ("postgres", database.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
