//! # Metrics Module
//!
//! The Metrics Calculator: turns a collection's raw counts into money.
//!
//! ## Formulas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  machineTotal     = machineCoins10baht × 10                             │
//! │  exchangeTotal    = Σ count × face value                                │
//! │  postcardsSold    = floor(machineCoins10baht / 4)                       │
//! │  revenue          = postcardsSold × 40                                  │
//! │  cost             = postcardsSold × costPerPostcard      (exact)        │
//! │  profit           = revenue − cost                       (exact)        │
//! │  exchangeBalanced = |exchangeTotal − 12000| < 1                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Metrics are never stored. They are recomputed every time a record is
//! returned, from whatever the record holds at that moment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::denomination::ExchangeFloat;
use crate::types::{CollectionFields, CollectionRecord};
use crate::{COINS_PER_POSTCARD, EXPECTED_FLOAT_BAHT, MACHINE_COIN_VALUE_BAHT, POSTCARD_PRICE_BAHT};

// =============================================================================
// Cash Tally
// =============================================================================

/// Anything carrying the counts the calculator needs.
pub trait CashTally {
    fn machine_coins_10baht(&self) -> i64;
    fn exchange(&self) -> &ExchangeFloat;
    fn cost_per_postcard(&self) -> Decimal;
}

impl CashTally for CollectionFields {
    fn machine_coins_10baht(&self) -> i64 {
        self.machine_coins_10baht
    }

    fn exchange(&self) -> &ExchangeFloat {
        &self.exchange
    }

    fn cost_per_postcard(&self) -> Decimal {
        self.cost_per_postcard
    }
}

impl CashTally for CollectionRecord {
    fn machine_coins_10baht(&self) -> i64 {
        self.fields.machine_coins_10baht
    }

    fn exchange(&self) -> &ExchangeFloat {
        &self.fields.exchange
    }

    fn cost_per_postcard(&self) -> Decimal {
        self.fields.cost_per_postcard
    }
}

// =============================================================================
// Collection Metrics
// =============================================================================

/// Derived financials for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CollectionMetrics {
    /// Cash emptied from the machine, in baht.
    pub machine_total: i64,

    /// Value of the exchange drawer, in baht.
    pub exchange_total: i64,

    pub postcards_sold: i64,

    /// Postcards sold at 40 baht each.
    pub revenue: i64,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub cost: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub profit: Decimal,

    /// Whether the drawer still holds the full 12,000 baht.
    pub exchange_balanced: bool,
}

/// Postcards sold; partial postcards round down.
#[inline]
pub fn postcards_sold(machine_coins_10baht: i64) -> i64 {
    machine_coins_10baht.div_euclid(COINS_PER_POSTCARD)
}

/// Whether an exchange total is within 1 baht of the expected float.
///
/// The bound is strict: 12,001 and 11,999 both count as off.
///
/// ## Example
/// ```rust
/// use coinbox_core::metrics::is_exchange_balanced;
/// use rust_decimal::Decimal;
///
/// assert!(is_exchange_balanced(Decimal::from(12_000)));
/// assert!(!is_exchange_balanced(Decimal::from(12_001)));
/// ```
pub fn is_exchange_balanced(exchange_total: Decimal) -> bool {
    (exchange_total - Decimal::from(EXPECTED_FLOAT_BAHT)).abs() < Decimal::ONE
}

/// Computes every metric for a collection.
///
/// Pure: the same counts always give the same metrics, and no clock or
/// storage is consulted.
pub fn compute_metrics<T: CashTally + ?Sized>(tally: &T) -> CollectionMetrics {
    let coins = tally.machine_coins_10baht();
    let exchange_total = tally.exchange().total();

    let postcards_sold = postcards_sold(coins);
    let revenue = postcards_sold.saturating_mul(POSTCARD_PRICE_BAHT);
    let cost = Decimal::from(postcards_sold) * tally.cost_per_postcard();

    CollectionMetrics {
        machine_total: coins.saturating_mul(MACHINE_COIN_VALUE_BAHT),
        exchange_total,
        postcards_sold,
        revenue,
        cost,
        profit: Decimal::from(revenue) - cost,
        exchange_balanced: is_exchange_balanced(Decimal::from(exchange_total)),
    }
}

// =============================================================================
// Enriched Record
// =============================================================================

/// A stored record with its metrics attached, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionWithMetrics {
    #[serde(flatten)]
    pub record: CollectionRecord,

    #[serde(flatten)]
    pub metrics: CollectionMetrics,
}

impl From<CollectionRecord> for CollectionWithMetrics {
    fn from(record: CollectionRecord) -> Self {
        let metrics = compute_metrics(&record);
        CollectionWithMetrics { record, metrics }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
