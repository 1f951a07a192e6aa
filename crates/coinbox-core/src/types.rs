//! # Domain Types
//!
//! Core domain types used throughout Coinbox.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  raw JSON ──► CollectionPayload ──validate──► CollectionFields (create) │
//! │                                    └────────► CollectionPatch  (update) │
//! │                                                                         │
//! │  ┌──────────────────────┐      ┌──────────────────────┐                 │
//! │  │   CollectionRecord   │      │  CollectionIdentity  │                 │
//! │  │  ──────────────────  │      │  ──────────────────  │                 │
//! │  │  id (store-assigned) │ ───► │  collection_date     │                 │
//! │  │  fields ─────────────┼──┐   │  round_number        │                 │
//! │  │  created_by + user   │  │   │  machine_location    │                 │
//! │  │  created_at/updated  │  │   └──────────────────────┘                 │
//! │  └──────────────────────┘  │                                            │
//! │                            ▼                                            │
//! │               CollectionFields { date, round, week, location,          │
//! │                 machine coins, ExchangeFloat, postcards, cost, notes }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! A collection is identified twice:
//! - `id`: integer assigned by the store, used in URLs
//! - Business identity: (date, round, location), unique across all records

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use ts_rs::TS;

use crate::denomination::{Denomination, ExchangeFloat};
use crate::error::ValidationError;
use crate::{DEFAULT_COST_PER_POSTCARD, DEFAULT_PAGE_LIMIT};

// =============================================================================
// Round
// =============================================================================

/// One of the two scheduled visits to a machine per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Round {
    First = 1,
    Second = 2,
}

impl Round {
    /// The round as it appears on the wire and in the database.
    #[inline]
    pub const fn number(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for Round {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Round::First),
            2 => Ok(Round::Second),
            _ => Err(ValidationError::RoundNotAllowed),
        }
    }
}

impl From<Round> for i64 {
    fn from(round: Round) -> Self {
        round.number()
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

// =============================================================================
// Collection Identity
// =============================================================================

/// The (date, round, location) triple no two collections may share.
///
/// Location comparison is exact: "Site A" and "site a" are different
/// machines as far as uniqueness is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionIdentity {
    pub collection_date: NaiveDate,
    pub round_number: Round,
    pub machine_location: String,
}

impl fmt::Display for CollectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} round {} at {}",
            self.collection_date, self.round_number, self.machine_location
        )
    }
}

// =============================================================================
// Collection Fields
// =============================================================================

/// Every caller-supplied attribute of a collection, fully validated.
///
/// This is the persisted shape minus the storage-owned columns. The
/// validator produces it on create; partial updates overlay a
/// [`CollectionPatch`] onto an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CollectionFields {
    /// Calendar day of the visit. Never after today.
    #[ts(as = "String")]
    pub collection_date: NaiveDate,

    /// Morning or afternoon visit.
    #[ts(type = "number")]
    pub round_number: Round,

    /// Caller-supplied business week label (≥ 1).
    pub week_number: i64,

    /// Free-text machine site, 3-200 characters.
    pub machine_location: String,

    /// 10-baht coins emptied from the machine. Multiple of 4.
    pub machine_coins_10baht: i64,

    /// Counts found in the exchange drawer.
    #[serde(flatten)]
    pub exchange: ExchangeFloat,

    /// Postcards still in the machine after the visit.
    pub postcards_remaining: i64,

    /// Purchase cost of one postcard, in [1, 50].
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub cost_per_postcard: Decimal,

    /// Free-form operator notes.
    pub notes: Option<String>,
}

impl CollectionFields {
    /// The business identity of this collection.
    pub fn identity(&self) -> CollectionIdentity {
        CollectionIdentity {
            collection_date: self.collection_date,
            round_number: self.round_number,
            machine_location: self.machine_location.clone(),
        }
    }
}

// =============================================================================
// Collection Record
// =============================================================================

/// The operator a collection was recorded by, as shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CollectionAuthor {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
}

/// A stored collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CollectionRecord {
    /// Store-assigned identifier.
    pub id: i64,

    #[serde(flatten)]
    pub fields: CollectionFields,

    /// Operator who created the record.
    pub created_by: i64,

    /// Summary of the `created_by` operator.
    pub user: CollectionAuthor,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CollectionRecord {
    #[inline]
    pub fn identity(&self) -> CollectionIdentity {
        self.fields.identity()
    }
}

// =============================================================================
// Collection Patch
// =============================================================================

/// A validated partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionPatch {
    pub collection_date: Option<NaiveDate>,
    pub round_number: Option<Round>,
    pub week_number: Option<i64>,
    pub machine_location: Option<String>,
    pub machine_coins_10baht: Option<i64>,
    /// Indexed by [`Denomination::index`].
    pub exchange: [Option<i64>; 9],
    pub postcards_remaining: Option<i64>,
    pub cost_per_postcard: Option<Decimal>,
    pub notes: Option<String>,
}

impl CollectionPatch {
    /// Whether any of date, round or location is being changed.
    pub fn touches_identity(&self) -> bool {
        self.collection_date.is_some()
            || self.round_number.is_some()
            || self.machine_location.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == CollectionPatch::default()
    }

    /// Count to apply for one denomination, if any.
    #[inline]
    pub fn exchange_count(&self, denomination: Denomination) -> Option<i64> {
        self.exchange[denomination.index()]
    }

    /// Overlays this patch onto `base`, producing the full candidate.
    pub fn apply_to(&self, base: &CollectionFields) -> CollectionFields {
        let mut exchange = base.exchange;
        for denomination in Denomination::ALL {
            if let Some(count) = self.exchange_count(denomination) {
                exchange.set(denomination, count);
            }
        }

        CollectionFields {
            collection_date: self.collection_date.unwrap_or(base.collection_date),
            round_number: self.round_number.unwrap_or(base.round_number),
            week_number: self.week_number.unwrap_or(base.week_number),
            machine_location: self
                .machine_location
                .clone()
                .unwrap_or_else(|| base.machine_location.clone()),
            machine_coins_10baht: self
                .machine_coins_10baht
                .unwrap_or(base.machine_coins_10baht),
            exchange,
            postcards_remaining: self
                .postcards_remaining
                .unwrap_or(base.postcards_remaining),
            cost_per_postcard: self.cost_per_postcard.unwrap_or(base.cost_per_postcard),
            notes: self.notes.clone().or_else(|| base.notes.clone()),
        }
    }

    /// Builds full fields for a new record, filling the defaultable ones.
    ///
    /// Returns `None` when a required field is missing.
    pub fn into_fields(self) -> Option<CollectionFields> {
        let mut exchange = ExchangeFloat::empty();
        for denomination in Denomination::ALL {
            exchange.set(denomination, self.exchange_count(denomination).unwrap_or(0));
        }

        Some(CollectionFields {
            collection_date: self.collection_date?,
            round_number: self.round_number?,
            week_number: self.week_number?,
            machine_location: self.machine_location?,
            machine_coins_10baht: self.machine_coins_10baht?,
            exchange,
            postcards_remaining: self.postcards_remaining?,
            cost_per_postcard: self.cost_per_postcard.unwrap_or(DEFAULT_COST_PER_POSTCARD),
            notes: self.notes,
        })
    }
}

// =============================================================================
// Collection Payload
// =============================================================================

/// Raw request body for create and update, before any typing.
///
/// Each field keeps its JSON value so the validator can report type errors
/// per field instead of failing the whole body. JSON `null` reads as absent,
/// except for `notes` where it is kept and rejected as a non-string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionPayload {
    pub collection_date: Option<Value>,
    pub round_number: Option<Value>,
    pub week_number: Option<Value>,
    pub machine_location: Option<Value>,
    pub machine_coins_10baht: Option<Value>,
    pub exchange_coins_1baht: Option<Value>,
    pub exchange_coins_2baht: Option<Value>,
    pub exchange_coins_5baht: Option<Value>,
    pub exchange_coins_10baht: Option<Value>,
    pub exchange_note_20baht: Option<Value>,
    pub exchange_note_50baht: Option<Value>,
    pub exchange_note_100baht: Option<Value>,
    pub exchange_note_500baht: Option<Value>,
    pub exchange_note_1000baht: Option<Value>,
    pub postcards_remaining: Option<Value>,
    pub cost_per_postcard: Option<Value>,
    #[serde(deserialize_with = "present_or_null")]
    pub notes: Option<Value>,
}

/// Any present value, `null` included. Missing keys fall back to `None`.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl CollectionPayload {
    /// Raw value supplied for one exchange denomination.
    pub fn exchange_value(&self, denomination: Denomination) -> Option<&Value> {
        match denomination {
            Denomination::Coin1 => self.exchange_coins_1baht.as_ref(),
            Denomination::Coin2 => self.exchange_coins_2baht.as_ref(),
            Denomination::Coin5 => self.exchange_coins_5baht.as_ref(),
            Denomination::Coin10 => self.exchange_coins_10baht.as_ref(),
            Denomination::Note20 => self.exchange_note_20baht.as_ref(),
            Denomination::Note50 => self.exchange_note_50baht.as_ref(),
            Denomination::Note100 => self.exchange_note_100baht.as_ref(),
            Denomination::Note500 => self.exchange_note_500baht.as_ref(),
            Denomination::Note1000 => self.exchange_note_1000baht.as_ref(),
        }
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Raw list query string, as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub location: Option<String>,
    pub week: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Validated list filters. Every bound is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionFilter {
    /// Case-insensitive substring of the machine location.
    pub location: Option<String>,
    pub week_number: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// One page of a listing (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Rows to skip before this page.
    #[inline]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// A validated list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionQuery {
    pub filter: CollectionFilter,
    pub page: PageRequest,
}

/// Paging block returned alongside a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// `total_pages = ceil(total / limit)`; zero rows means zero pages.
    pub fn new(request: PageRequest, total: i64) -> Self {
        let limit = i64::from(request.limit.max(1));
        Pagination {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: (total.max(0) + limit - 1) / limit,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
