//! # Error Types
//!
//! Domain-specific error types for coinbox-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  coinbox-core errors (this file)                                       │
//! │  ├── CoreError        - Domain failures (validation, duplicate, 404)   │
//! │  ├── FieldErrors      - Every failing field of one request             │
//! │  └── ValidationError  - One rule broken by one field                   │
//! │                                                                         │
//! │  coinbox-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  coinbox-api errors (in app)                                           │
//! │  └── ApiError         - What HTTP clients see                          │
//! │                                                                         │
//! │  Flow: ValidationError → FieldErrors → CoreError → ApiError → Client   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros
//! 2. A `ValidationError` never names its field; `FieldErrors` keys it
//! 3. Messages are the exact text shown to operators on the collection form

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::types::CollectionIdentity;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more fields broke a validation rule.
    ///
    /// ## When This Occurs
    /// - A required field is missing on create
    /// - A value has the wrong type or is out of range
    /// - The collection date is in the future
    /// - The machine coin count is not a multiple of 4
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Another collection already owns this date/round/location.
    ///
    /// ## User Workflow
    /// ```text
    /// Operator submits round 1 at "Site A" for 2024-01-01
    ///      │
    ///      ▼
    /// Record #7 already has (2024-01-01, 1, "Site A")
    ///      │
    ///      ▼
    /// DuplicateCollection → 409, form asks "did you mean round 2?"
    /// ```
    #[error("A collection already exists for this date, round, and location")]
    DuplicateCollection { identity: CollectionIdentity },

    /// No collection with the given id.
    #[error("Collection not found: {0}")]
    CollectionNotFound(i64),

    /// The request body or a path/query value could not be understood at all.
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl From<FieldErrors> for CoreError {
    fn from(errors: FieldErrors) -> Self {
        CoreError::Validation(errors)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single broken rule.
///
/// The field it belongs to is carried by [`FieldErrors`], so messages read
/// the same whether they appear inline on a form or in a log line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Field missing on create.
    #[error("Required")]
    Required,

    /// Wrong JSON type (e.g. the string "400" for a coin count).
    #[error("Expected {expected}, received {received}")]
    InvalidType {
        expected: &'static str,
        received: &'static str,
    },

    /// A count with a fractional part.
    #[error("Expected integer, received float")]
    NotWholeNumber,

    /// Negative count or amount.
    #[error("{label} cannot be negative")]
    Negative { label: &'static str },

    /// Number below its lower bound.
    #[error("{label} must be at least {min}")]
    TooSmall { label: &'static str, min: i64 },

    /// Numeric value outside a closed range.
    #[error("{label} must be between {min} and {max}")]
    OutOfRange {
        label: &'static str,
        min: String,
        max: String,
    },

    /// Text shorter than allowed.
    #[error("{label} must be at least {min} characters")]
    TooShort { label: &'static str, min: usize },

    /// Text longer than allowed.
    #[error("{label} must be at most {max} characters")]
    TooLong { label: &'static str, max: usize },

    /// Round number other than 1 or 2.
    #[error("Round number must be 1 or 2")]
    RoundNotAllowed,

    /// Date text that is not a calendar date.
    #[error("Invalid date")]
    InvalidDate,

    /// Collection date after today.
    #[error("Collection date cannot be in the future")]
    FutureDate,

    /// Machine coins that don't form whole postcards.
    #[error("Machine coins must be divisible by 4 (4 coins = 1 postcard)")]
    CoinsNotDivisible,
}

// =============================================================================
// Field Errors
// =============================================================================

/// Every failing field of one request, keyed by payload field name.
///
/// Serializes as `{ "fieldName": ["message", ...] }`, the shape the
/// collection form renders under each input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<ValidationError>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one error against a field.
    pub fn push(&mut self, field: &'static str, error: ValidationError) {
        self.0.entry(field).or_default().push(error);
    }

    /// Single-error constructor.
    pub fn single(field: &'static str, error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.push(field, error);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Errors recorded for one field.
    pub fn get(&self, field: &str) -> Option<&[ValidationError]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Names of every failing field, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// Closes a validation phase: `Ok` if nothing was recorded, otherwise
    /// hands back (and clears) everything collected so far.
    pub fn finish_phase(&mut self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, errors) in &self.0 {
            for error in errors {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {error}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, errors) in &self.0 {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            map.serialize_entry(field, &messages)?;
        }
        map.end()
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::Required.to_string(), "Required");
        assert_eq!(
            ValidationError::Negative { label: "Machine coins" }.to_string(),
            "Machine coins cannot be negative"
        );
        assert_eq!(
            ValidationError::TooShort {
                label: "Machine location",
                min: 3
            }
            .to_string(),
            "Machine location must be at least 3 characters"
        );
        assert_eq!(
            ValidationError::CoinsNotDivisible.to_string(),
            "Machine coins must be divisible by 4 (4 coins = 1 postcard)"
        );
    }

    #[test]
    fn test_field_errors_serialize_as_message_lists() {
        let mut errors = FieldErrors::new();
        errors.push("roundNumber", ValidationError::RoundNotAllowed);
        errors.push("machineLocation", ValidationError::Required);

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["roundNumber"][0], "Round number must be 1 or 2");
        assert_eq!(json["machineLocation"][0], "Required");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_finish_phase_drains() {
        let mut errors = FieldErrors::new();
        assert!(errors.finish_phase().is_ok());

        errors.push("weekNumber", ValidationError::Required);
        let drained = errors.finish_phase().unwrap_err();
        assert!(drained.contains("weekNumber"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_field_errors_convert_to_core_error() {
        let errors = FieldErrors::single("collectionDate", ValidationError::FutureDate);
        let core_err: CoreError = errors.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(
            core_err.to_string(),
            "Validation failed: collectionDate: Collection date cannot be in the future"
        );
    }
}
