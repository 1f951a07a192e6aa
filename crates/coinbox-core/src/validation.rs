//! # Validation Module
//!
//! The Validator: decides whether a candidate collection is legal.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Categories                              │
//! │                                                                         │
//! │  Category 1: Shape                                                     │
//! │  ├── Required fields present (create only)                             │
//! │  ├── JSON types (numbers are never read from strings)                  │
//! │  └── Ranges: round ∈ {1,2}, week ≥ 1, location 3-200, cost 1-50       │
//! │           │                                                             │
//! │           ▼  (stop here if anything failed)                             │
//! │  Category 2: Collection date                                           │
//! │  └── Parses as a calendar date and is not after today                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Category 3: Coin mechanism                                            │
//! │  └── Machine coins divisible by 4                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Store: UNIQUE(date, round, location) catches racing duplicates        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failing field of the first failing category is reported at once,
//! so the operator can fix the whole form in one pass.
//!
//! ## Usage
//! ```rust
//! use chrono::NaiveDate;
//! use coinbox_core::types::CollectionPayload;
//! use coinbox_core::validation::{field, validate_new};
//! use serde_json::json;
//!
//! let payload: CollectionPayload = serde_json::from_value(json!({
//!     "collectionDate": "2024-01-01",
//!     "roundNumber": 3,
//!     "weekNumber": 1,
//!     "machineLocation": "Site A",
//!     "machineCoins10baht": 400,
//!     "postcardsRemaining": 0
//! }))
//! .unwrap();
//!
//! let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let errors = validate_new(&payload, today).unwrap_err();
//! assert!(errors.contains(field::ROUND_NUMBER));
//! ```

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::denomination::Denomination;
use crate::error::{CoreError, CoreResult, FieldErrors, ValidationError};
use crate::types::{
    CollectionFields, CollectionFilter, CollectionIdentity, CollectionPatch, CollectionPayload,
    CollectionQuery, CollectionRecord, ListParams, PageRequest, Round,
};
use crate::{
    COINS_PER_POSTCARD, DEFAULT_PAGE_LIMIT, MAX_COST_PER_POSTCARD, MAX_LOCATION_LEN,
    MAX_PAGE_LIMIT, MIN_COST_PER_POSTCARD, MIN_LOCATION_LEN,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Payload field names, as they appear in requests and error maps.
pub mod field {
    pub const COLLECTION_DATE: &str = "collectionDate";
    pub const ROUND_NUMBER: &str = "roundNumber";
    pub const WEEK_NUMBER: &str = "weekNumber";
    pub const MACHINE_LOCATION: &str = "machineLocation";
    pub const MACHINE_COINS: &str = "machineCoins10baht";
    pub const POSTCARDS_REMAINING: &str = "postcardsRemaining";
    pub const COST_PER_POSTCARD: &str = "costPerPostcard";
    pub const NOTES: &str = "notes";

    pub const PAGE: &str = "page";
    pub const LIMIT: &str = "limit";
    pub const LOCATION: &str = "location";
    pub const WEEK: &str = "week";
    pub const START_DATE: &str = "startDate";
    pub const END_DATE: &str = "endDate";
}

/// Largest integer a JSON client can send without losing precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

// =============================================================================
// JSON Readers
// =============================================================================

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(expected: &'static str, value: &Value) -> ValidationError {
    ValidationError::InvalidType {
        expected,
        received: json_type_name(value),
    }
}

/// Reads a JSON number with no fractional part.
///
/// `4.0` is accepted (JSON doesn't distinguish it from `4`); `4.5` and
/// `"4"` are not.
pub fn read_whole_number(value: &Value) -> ValidationResult<i64> {
    let Value::Number(number) = value else {
        return Err(expected("number", value));
    };

    if let Some(n) = number.as_i64() {
        return Ok(n);
    }

    match number.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            Ok(f as i64)
        }
        _ => Err(ValidationError::NotWholeNumber),
    }
}

/// Reads a JSON number as an exact decimal, keeping the digits the client
/// sent (`13.766` stays `13.766`).
pub fn read_decimal(value: &Value) -> ValidationResult<Decimal> {
    let Value::Number(number) = value else {
        return Err(expected("number", value));
    };

    if let Some(n) = number.as_i64() {
        return Ok(Decimal::from(n));
    }

    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| cost_out_of_range())
}

/// Reads a JSON string.
pub fn read_text(value: &Value) -> ValidationResult<&str> {
    value.as_str().ok_or_else(|| expected("string", value))
}

// =============================================================================
// Field Rules
// =============================================================================

/// Validates a round number.
///
/// ## Example
/// ```rust
/// use coinbox_core::validation::validate_round_number;
/// use coinbox_core::Round;
///
/// assert_eq!(validate_round_number(2), Ok(Round::Second));
/// assert!(validate_round_number(3).is_err());
/// ```
pub fn validate_round_number(round: i64) -> ValidationResult<Round> {
    Round::try_from(round)
}

/// Week labels start at 1.
pub fn validate_week_number(week: i64) -> ValidationResult<()> {
    if week < 1 {
        return Err(ValidationError::TooSmall {
            label: "Week number",
            min: 1,
        });
    }
    Ok(())
}

/// Validates a machine location.
///
/// ## Rules
/// - Between 3 and 200 characters (Unicode scalar values, not bytes)
/// - Not trimmed: what the operator typed is what identifies the machine
pub fn validate_machine_location(location: &str) -> ValidationResult<()> {
    let len = location.chars().count();

    if len < MIN_LOCATION_LEN {
        return Err(ValidationError::TooShort {
            label: "Machine location",
            min: MIN_LOCATION_LEN,
        });
    }

    if len > MAX_LOCATION_LEN {
        return Err(ValidationError::TooLong {
            label: "Machine location",
            max: MAX_LOCATION_LEN,
        });
    }

    Ok(())
}

/// Physical counts can't go below zero.
pub fn validate_count(label: &'static str, count: i64) -> ValidationResult<()> {
    if count < 0 {
        return Err(ValidationError::Negative { label });
    }
    Ok(())
}

fn cost_out_of_range() -> ValidationError {
    ValidationError::OutOfRange {
        label: "Cost per postcard",
        min: MIN_COST_PER_POSTCARD.to_string(),
        max: MAX_COST_PER_POSTCARD.to_string(),
    }
}

/// Cost basis must lie in [1, 50], bounds included.
pub fn validate_cost_per_postcard(cost: Decimal) -> ValidationResult<()> {
    if cost < MIN_COST_PER_POSTCARD || cost > MAX_COST_PER_POSTCARD {
        return Err(cost_out_of_range());
    }
    Ok(())
}

/// Parses `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use coinbox_core::validation::parse_date;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// assert_eq!(parse_date("2024-03-09"), Ok(day));
/// assert_eq!(parse_date("2024-03-09T08:30:00+07:00"), Ok(day));
/// assert!(parse_date("next tuesday").is_err());
/// ```
pub fn parse_date(text: &str) -> ValidationResult<NaiveDate> {
    let text = text.trim();

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.date_naive()))
        .map_err(|_| ValidationError::InvalidDate)
}

/// A collection date must parse and must not be after `today`.
///
/// Same-day entries are allowed: the comparison is against the end of
/// today, which for calendar dates is `date <= today`.
pub fn validate_collection_date(text: &str, today: NaiveDate) -> ValidationResult<NaiveDate> {
    let date = parse_date(text)?;

    if date > today {
        return Err(ValidationError::FutureDate);
    }

    Ok(date)
}

/// Four coins buy one postcard, so the machine only ever holds multiples of 4.
pub fn validate_machine_coins_divisible(coins: i64) -> ValidationResult<()> {
    if coins % COINS_PER_POSTCARD != 0 {
        return Err(ValidationError::CoinsNotDivisible);
    }
    Ok(())
}

// =============================================================================
// Record Validation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Create,
    Update,
}

/// Runs `rule` on a present value, filing any error under `name`.
fn check<'a, T>(
    errors: &mut FieldErrors,
    name: &'static str,
    value: Option<&'a Value>,
    rule: impl FnOnce(&'a Value) -> ValidationResult<T>,
) -> Option<T> {
    match rule(value?) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            errors.push(name, error);
            None
        }
    }
}

fn read_count(value: &Value, label: &'static str) -> ValidationResult<i64> {
    let count = read_whole_number(value)?;
    validate_count(label, count)?;
    Ok(count)
}

fn missing_required(payload: &CollectionPayload) -> FieldErrors {
    let required = [
        (field::COLLECTION_DATE, &payload.collection_date),
        (field::ROUND_NUMBER, &payload.round_number),
        (field::WEEK_NUMBER, &payload.week_number),
        (field::MACHINE_LOCATION, &payload.machine_location),
        (field::MACHINE_COINS, &payload.machine_coins_10baht),
        (field::POSTCARDS_REMAINING, &payload.postcards_remaining),
    ];

    let mut errors = FieldErrors::new();
    for (name, value) in required {
        if value.is_none() {
            errors.push(name, ValidationError::Required);
        }
    }
    errors
}

fn validate_payload(
    payload: &CollectionPayload,
    today: NaiveDate,
    mode: Mode,
) -> Result<CollectionPatch, FieldErrors> {
    // Category 1: presence, types, ranges
    let mut errors = match mode {
        Mode::Create => missing_required(payload),
        Mode::Update => FieldErrors::new(),
    };

    let date_text = check(
        &mut errors,
        field::COLLECTION_DATE,
        payload.collection_date.as_ref(),
        read_text,
    );
    let round_number = check(
        &mut errors,
        field::ROUND_NUMBER,
        payload.round_number.as_ref(),
        |v| read_whole_number(v).and_then(validate_round_number),
    );
    let week_number = check(
        &mut errors,
        field::WEEK_NUMBER,
        payload.week_number.as_ref(),
        |v| {
            let week = read_whole_number(v)?;
            validate_week_number(week)?;
            Ok(week)
        },
    );
    let machine_location = check(
        &mut errors,
        field::MACHINE_LOCATION,
        payload.machine_location.as_ref(),
        |v| {
            let location = read_text(v)?;
            validate_machine_location(location)?;
            Ok(location.to_string())
        },
    );
    let machine_coins_10baht = check(
        &mut errors,
        field::MACHINE_COINS,
        payload.machine_coins_10baht.as_ref(),
        |v| read_count(v, "Machine coins"),
    );

    let mut exchange = [None; 9];
    for denomination in Denomination::ALL {
        exchange[denomination.index()] = check(
            &mut errors,
            denomination.field_name(),
            payload.exchange_value(denomination),
            |v| read_count(v, "Exchange count"),
        );
    }

    let postcards_remaining = check(
        &mut errors,
        field::POSTCARDS_REMAINING,
        payload.postcards_remaining.as_ref(),
        |v| read_count(v, "Postcards remaining"),
    );
    let cost_per_postcard = check(
        &mut errors,
        field::COST_PER_POSTCARD,
        payload.cost_per_postcard.as_ref(),
        |v| {
            let cost = read_decimal(v)?;
            validate_cost_per_postcard(cost)?;
            Ok(cost)
        },
    );
    let notes = check(&mut errors, field::NOTES, payload.notes.as_ref(), |v| {
        read_text(v).map(str::to_string)
    });

    errors.finish_phase()?;

    // Category 2: the date itself
    let collection_date = check_text(&mut errors, field::COLLECTION_DATE, date_text, |text| {
        validate_collection_date(text, today)
    });

    errors.finish_phase()?;

    // Category 3: coin mechanism
    if let Some(coins) = machine_coins_10baht {
        if let Err(error) = validate_machine_coins_divisible(coins) {
            errors.push(field::MACHINE_COINS, error);
        }
    }

    errors.finish_phase()?;

    Ok(CollectionPatch {
        collection_date,
        round_number,
        week_number,
        machine_location,
        machine_coins_10baht,
        exchange,
        postcards_remaining,
        cost_per_postcard,
        notes,
    })
}

/// Validates a create payload into complete collection fields.
///
/// Omitted exchange counts become 0 and an omitted cost becomes 13.766.
pub fn validate_new(
    payload: &CollectionPayload,
    today: NaiveDate,
) -> Result<CollectionFields, FieldErrors> {
    validate_payload(payload, today, Mode::Create)?
        .into_fields()
        .ok_or_else(|| missing_required(payload))
}

/// Validates an update payload. Only fields present are checked.
pub fn validate_patch(
    payload: &CollectionPayload,
    today: NaiveDate,
) -> Result<CollectionPatch, FieldErrors> {
    validate_payload(payload, today, Mode::Update)
}

// =============================================================================
// Duplicate Identity
// =============================================================================

fn has_identity(fields: &CollectionFields, identity: &CollectionIdentity) -> bool {
    fields.collection_date == identity.collection_date
        && fields.round_number == identity.round_number
        && fields.machine_location == identity.machine_location
}

/// Rejects `candidate` if any of `existing` (other than `exclude_id`)
/// already owns the same (date, round, location).
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use coinbox_core::validation::ensure_unique_identity;
/// use coinbox_core::{CollectionIdentity, CollectionRecord, Round};
///
/// let candidate = CollectionIdentity {
///     collection_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     round_number: Round::First,
///     machine_location: "Site A".to_string(),
/// };
/// let nothing: Vec<CollectionRecord> = Vec::new();
/// assert!(ensure_unique_identity(&candidate, &nothing, None).is_ok());
/// ```
pub fn ensure_unique_identity<'a, I>(
    candidate: &CollectionIdentity,
    existing: I,
    exclude_id: Option<i64>,
) -> CoreResult<()>
where
    I: IntoIterator<Item = &'a CollectionRecord>,
{
    let clash = existing
        .into_iter()
        .filter(|record| Some(record.id) != exclude_id)
        .any(|record| has_identity(&record.fields, candidate));

    if clash {
        return Err(CoreError::DuplicateCollection {
            identity: candidate.clone(),
        });
    }

    Ok(())
}

// =============================================================================
// List Query
// =============================================================================

/// Query-string values are optional and empty means absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn read_query_number(text: &str) -> ValidationResult<i64> {
    text.parse::<i64>().map_err(|_| ValidationError::InvalidType {
        expected: "integer",
        received: "string",
    })
}

fn read_page(text: &str) -> ValidationResult<u32> {
    let page = read_query_number(text)?;
    if page < 1 {
        return Err(ValidationError::TooSmall {
            label: "Page",
            min: 1,
        });
    }
    u32::try_from(page).map_err(|_| ValidationError::OutOfRange {
        label: "Page",
        min: "1".to_string(),
        max: u32::MAX.to_string(),
    })
}

fn read_limit(text: &str) -> ValidationResult<u32> {
    let limit = read_query_number(text)?;
    if !(1..=i64::from(MAX_PAGE_LIMIT)).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            label: "Limit",
            min: "1".to_string(),
            max: MAX_PAGE_LIMIT.to_string(),
        });
    }
    u32::try_from(limit).map_err(|_| ValidationError::OutOfRange {
        label: "Limit",
        min: "1".to_string(),
        max: MAX_PAGE_LIMIT.to_string(),
    })
}

fn check_text<T>(
    errors: &mut FieldErrors,
    name: &'static str,
    value: Option<&str>,
    rule: impl FnOnce(&str) -> ValidationResult<T>,
) -> Option<T> {
    match rule(value?) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            errors.push(name, error);
            None
        }
    }
}

/// Validates list filters and paging.
///
/// ## Defaults
/// - `page`: 1
/// - `limit`: 10 (at most 100)
pub fn validate_list_params(params: &ListParams) -> Result<CollectionQuery, FieldErrors> {
    let mut errors = FieldErrors::new();

    let page = check_text(&mut errors, field::PAGE, present(&params.page), read_page);
    let limit = check_text(&mut errors, field::LIMIT, present(&params.limit), read_limit);
    let week_number = check_text(&mut errors, field::WEEK, present(&params.week), |text| {
        let week = read_query_number(text)?;
        if week < 1 {
            return Err(ValidationError::TooSmall {
                label: "Week",
                min: 1,
            });
        }
        Ok(week)
    });
    let start_date = check_text(
        &mut errors,
        field::START_DATE,
        present(&params.start_date),
        parse_date,
    );
    let end_date = check_text(
        &mut errors,
        field::END_DATE,
        present(&params.end_date),
        parse_date,
    );

    errors.finish_phase()?;

    Ok(CollectionQuery {
        filter: CollectionFilter {
            location: present(&params.location).map(str::to_string),
            week_number,
            start_date,
            end_date,
        },
        page: PageRequest {
            page: page.unwrap_or(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        },
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
