//! # Denomination Module
//!
//! The nine coin and note denominations that make up the exchange float.
//!
//! ## The Exchange Float
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Beside every machine sits a drawer of change so customers can break  │
//! │  notes into 10-baht coins. It always starts the day at 12,000 baht.   │
//! │                                                                         │
//! │   Coins:  1 │ 2 │ 5 │ 10                                               │
//! │   Notes: 20 │ 50 │ 100 │ 500 │ 1000                                    │
//! │                                                                         │
//! │   exchange total = Σ count × face value                                │
//! │   12,000 → balanced      anything ≥ 1 baht off → discrepancy           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All counts are whole numbers of physical coins or notes. Values are whole
//! baht, held in `i64` like every other amount that is not a cost basis.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Denomination
// =============================================================================

/// A coin or note that can appear in the exchange float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Denomination {
    Coin1,
    Coin2,
    Coin5,
    Coin10,
    Note20,
    Note50,
    Note100,
    Note500,
    Note1000,
}

impl Denomination {
    /// Every denomination, smallest first.
    pub const ALL: [Denomination; 9] = [
        Denomination::Coin1,
        Denomination::Coin2,
        Denomination::Coin5,
        Denomination::Coin10,
        Denomination::Note20,
        Denomination::Note50,
        Denomination::Note100,
        Denomination::Note500,
        Denomination::Note1000,
    ];

    /// Face value in baht.
    ///
    /// ## Example
    /// ```rust
    /// use coinbox_core::Denomination;
    ///
    /// assert_eq!(Denomination::Note1000.face_value(), 1000);
    /// assert_eq!(Denomination::Coin5.face_value(), 5);
    /// ```
    #[inline]
    pub const fn face_value(self) -> i64 {
        match self {
            Denomination::Coin1 => 1,
            Denomination::Coin2 => 2,
            Denomination::Coin5 => 5,
            Denomination::Coin10 => 10,
            Denomination::Note20 => 20,
            Denomination::Note50 => 50,
            Denomination::Note100 => 100,
            Denomination::Note500 => 500,
            Denomination::Note1000 => 1000,
        }
    }

    /// Whether this is a banknote rather than a coin.
    #[inline]
    pub const fn is_note(self) -> bool {
        self.face_value() >= 20
    }

    /// Name of the count field in request payloads and error maps.
    pub const fn field_name(self) -> &'static str {
        match self {
            Denomination::Coin1 => "exchangeCoins1baht",
            Denomination::Coin2 => "exchangeCoins2baht",
            Denomination::Coin5 => "exchangeCoins5baht",
            Denomination::Coin10 => "exchangeCoins10baht",
            Denomination::Note20 => "exchangeNote20baht",
            Denomination::Note50 => "exchangeNote50baht",
            Denomination::Note100 => "exchangeNote100baht",
            Denomination::Note500 => "exchangeNote500baht",
            Denomination::Note1000 => "exchangeNote1000baht",
        }
    }

    /// Position in [`Denomination::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_note() { "note" } else { "coin" };
        write!(f, "{} baht {}", self.face_value(), kind)
    }
}

// =============================================================================
// Exchange Float
// =============================================================================

/// Counts of each denomination found in the exchange drawer.
///
/// Serialized flat, so a record carries `exchangeCoins1baht`,
/// `exchangeNote1000baht`, etc. directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExchangeFloat {
    pub exchange_coins_1baht: i64,
    pub exchange_coins_2baht: i64,
    pub exchange_coins_5baht: i64,
    pub exchange_coins_10baht: i64,
    pub exchange_note_20baht: i64,
    pub exchange_note_50baht: i64,
    pub exchange_note_100baht: i64,
    pub exchange_note_500baht: i64,
    pub exchange_note_1000baht: i64,
}

impl ExchangeFloat {
    /// An empty drawer.
    pub const fn empty() -> Self {
        ExchangeFloat {
            exchange_coins_1baht: 0,
            exchange_coins_2baht: 0,
            exchange_coins_5baht: 0,
            exchange_coins_10baht: 0,
            exchange_note_20baht: 0,
            exchange_note_50baht: 0,
            exchange_note_100baht: 0,
            exchange_note_500baht: 0,
            exchange_note_1000baht: 0,
        }
    }

    /// Count held for one denomination.
    pub const fn count(&self, denomination: Denomination) -> i64 {
        match denomination {
            Denomination::Coin1 => self.exchange_coins_1baht,
            Denomination::Coin2 => self.exchange_coins_2baht,
            Denomination::Coin5 => self.exchange_coins_5baht,
            Denomination::Coin10 => self.exchange_coins_10baht,
            Denomination::Note20 => self.exchange_note_20baht,
            Denomination::Note50 => self.exchange_note_50baht,
            Denomination::Note100 => self.exchange_note_100baht,
            Denomination::Note500 => self.exchange_note_500baht,
            Denomination::Note1000 => self.exchange_note_1000baht,
        }
    }

    /// Mutable slot for one denomination.
    fn slot_mut(&mut self, denomination: Denomination) -> &mut i64 {
        match denomination {
            Denomination::Coin1 => &mut self.exchange_coins_1baht,
            Denomination::Coin2 => &mut self.exchange_coins_2baht,
            Denomination::Coin5 => &mut self.exchange_coins_5baht,
            Denomination::Coin10 => &mut self.exchange_coins_10baht,
            Denomination::Note20 => &mut self.exchange_note_20baht,
            Denomination::Note50 => &mut self.exchange_note_50baht,
            Denomination::Note100 => &mut self.exchange_note_100baht,
            Denomination::Note500 => &mut self.exchange_note_500baht,
            Denomination::Note1000 => &mut self.exchange_note_1000baht,
        }
    }

    /// Sets the count for one denomination.
    pub fn set(&mut self, denomination: Denomination, count: i64) {
        *self.slot_mut(denomination) = count;
    }

    /// Builder form of [`ExchangeFloat::set`].
    ///
    /// ## Example
    /// ```rust
    /// use coinbox_core::{Denomination, ExchangeFloat};
    ///
    /// let float = ExchangeFloat::empty()
    ///     .with(Denomination::Note1000, 11)
    ///     .with(Denomination::Note500, 2);
    /// assert_eq!(float.total(), 12_000);
    /// ```
    pub fn with(mut self, denomination: Denomination, count: i64) -> Self {
        self.set(denomination, count);
        self
    }

    /// Iterates `(denomination, count)` pairs, smallest denomination first.
    pub fn iter(&self) -> impl Iterator<Item = (Denomination, i64)> + '_ {
        Denomination::ALL.into_iter().map(|d| (d, self.count(d)))
    }

    /// Value of one denomination's stack in baht.
    #[inline]
    pub fn value_of(&self, denomination: Denomination) -> i64 {
        self.count(denomination)
            .saturating_mul(denomination.face_value())
    }

    /// Total value of the drawer in baht.
    pub fn total(&self) -> i64 {
        Denomination::ALL
            .into_iter()
            .fold(0i64, |acc, d| acc.saturating_add(self.value_of(d)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
