//! # coinbox-core: Pure Collection Logic for Coinbox
//!
//! This crate is the **heart** of Coinbox. It decides what a legal cash
//! collection looks like and turns raw coin/note counts into business
//! metrics. Everything here is a pure function with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Coinbox Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 coinbox-api (axum HTTP server)                  │   │
//! │  │   POST /api/collections, PUT /api/collections/{id}, ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ coinbox-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐  ┌────────────┐  ┌────────────┐  ┌─────────┐  │   │
//! │  │   │ validation │  │  metrics   │  │denomination│  │  week   │  │   │
//! │  │   │ Validator  │  │ Calculator │  │ face value │  │ + clock │  │   │
//! │  │   └────────────┘  └────────────┘  └────────────┘  └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  coinbox-db (Database Layer)                    │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Collection records, patches, identity triple, list queries
//! - [`denomination`] - Exchange float denominations and their face values
//! - [`validation`] - The Validator (field rules, duplicate identity check)
//! - [`metrics`] - The Metrics Calculator
//! - [`clock`] / [`week`] - Swappable time source and the current-week helper
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use coinbox_core::metrics::compute_metrics;
//! use coinbox_core::types::CollectionPayload;
//! use coinbox_core::validation::validate_new;
//! use serde_json::json;
//!
//! let payload: CollectionPayload = serde_json::from_value(json!({
//!     "collectionDate": "2024-01-01",
//!     "roundNumber": 1,
//!     "weekNumber": 1,
//!     "machineLocation": "Site A",
//!     "machineCoins10baht": 400,
//!     "exchangeNote1000baht": 12,
//!     "postcardsRemaining": 50
//! }))
//! .unwrap();
//!
//! let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let fields = validate_new(&payload, today).unwrap();
//! let metrics = compute_metrics(&fields);
//!
//! assert_eq!(metrics.postcards_sold, 100);
//! assert!(metrics.exchange_balanced);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod denomination;
pub mod error;
pub mod metrics;
pub mod types;
pub mod validation;
pub mod week;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use denomination::{Denomination, ExchangeFloat};
pub use error::{CoreError, CoreResult, FieldErrors, ValidationError};
pub use metrics::{compute_metrics, CollectionMetrics};
pub use types::*;

use rust_decimal::Decimal;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Face value of the coins the vending machine accepts.
pub const MACHINE_COIN_VALUE_BAHT: i64 = 10;

/// Ten-baht coins consumed by one postcard.
///
/// ## Hardware Reason
/// The coin mechanism releases a postcard after exactly four coins, so the
/// machine's coin count is always a multiple of 4.
pub const COINS_PER_POSTCARD: i64 = 4;

/// Fixed selling price of one postcard (4 × 10 baht).
pub const POSTCARD_PRICE_BAHT: i64 = 40;

/// Amount the exchange float must total when it is balanced.
pub const EXPECTED_FLOAT_BAHT: i64 = 12_000;

/// Cost basis applied when a collection doesn't declare one (13.766 baht).
pub const DEFAULT_COST_PER_POSTCARD: Decimal = Decimal::from_parts(13_766, 0, 0, false, 3);

/// Lowest accepted cost per postcard.
pub const MIN_COST_PER_POSTCARD: Decimal = Decimal::ONE;

/// Highest accepted cost per postcard.
pub const MAX_COST_PER_POSTCARD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Machine location length bounds, in characters.
pub const MIN_LOCATION_LEN: usize = 3;
pub const MAX_LOCATION_LEN: usize = 200;

/// Default and maximum page size for collection listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;
