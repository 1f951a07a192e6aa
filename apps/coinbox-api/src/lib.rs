//! # Coinbox API
//!
//! HTTP server operators use to record machine collections and review the
//! reconciled cash figures.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Coinbox API Routes                            │
//! │                                                                         │
//! │  Public                          Bearer token required                  │
//! │  ┌────────────────────┐          ┌──────────────────────────────────┐  │
//! │  │ GET  /health       │          │ GET    /api/week/current         │  │
//! │  │ POST /api/auth/    │          │ GET    /api/collections          │  │
//! │  │      login         │          │ POST   /api/collections          │  │
//! │  └────────────────────┘          │ GET    /api/collections/{id}     │  │
//! │                                  │ PUT    /api/collections/{id}     │  │
//! │                                  │ DELETE /api/collections/{id}     │  │
//! │                                  └──────────────────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Per request                                  │  │
//! │  │                                                                   │  │
//! │  │  body ──► coinbox-core validator ──► coinbox-db ──► metrics ──►   │  │
//! │  │           (Clock for "today")        (SQLite)       JSON          │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `COINBOX_BIND_ADDR` - interface to bind (default: 0.0.0.0)
//! - `COINBOX_PORT` - HTTP port (default: 3000)
//! - `COINBOX_DATABASE_PATH` - SQLite file (default: ./data/coinbox.db)
//! - `COINBOX_DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `COINBOX_JWT_SECRET` - secret for JWT signing
//! - `COINBOX_TOKEN_LIFETIME_SECS` - token lifetime (default: 86400)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use coinbox_core::{Clock, SystemClock};
use coinbox_db::Database;

// Re-exports
pub use auth::{AuthUser, JwtManager};
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use routes::router;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// State backed by the system clock.
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        Self::with_clock(db, config, Arc::new(SystemClock))
    }

    /// State with an explicit source of "today".
    pub fn with_clock(db: Database, config: &ApiConfig, clock: Arc<dyn Clock>) -> Self {
        AppState {
            db,
            jwt: JwtManager::new(&config.jwt_secret, config.token_lifetime_secs),
            clock,
        }
    }
}
