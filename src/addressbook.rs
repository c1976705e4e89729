//! Address-book entry shape and threshold conversion
//!
//! Address books live in the chat-bot layer; the engine consumes this shape
//! only to translate user-entered decimal thresholds into the minor units it
//! stores, using the `ChainType` unit scales. Lifecycle of these entries is
//! not owned here.

use serde::{Deserialize, Serialize};

use crate::chain::ChainType;
use crate::error::SyncError;

/// A chat-scoped link between an address book and a tracked account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressBookEntry {
    pub address_book_id: i64,
    pub account_address: String,
    pub chain_type: ChainType,
    pub account_alias: String,
    #[serde(default)]
    pub track_native: bool,
    /// Alert threshold in native minor units
    #[serde(default)]
    pub native_threshold: u128,
    #[serde(default)]
    pub track_token: bool,
    /// Alert threshold in token minor units
    #[serde(default)]
    pub token_threshold: u128,
    /// Polling interval in minutes
    #[serde(default = "default_schedule")]
    pub schedule: u32,
}

fn default_schedule() -> u32 {
    10
}

impl AddressBookEntry {
    pub fn short_address(&self) -> String {
        if self.account_address.len() <= 6 {
            return self.account_address.clone();
        }
        format!(
            "{}...{}",
            &self.account_address[..3],
            &self.account_address[self.account_address.len() - 3..]
        )
    }
}

/// Number of decimal places implied by a power-of-ten unit scale
fn decimals_of(unit: u128) -> u32 {
    let mut decimals = 0;
    let mut scale = unit;
    while scale >= 10 {
        scale /= 10;
        decimals += 1;
    }
    decimals
}

/// Convert a user-entered decimal string ("1.5") into minor units for the
/// given unit scale. Rejects negatives, empty input and more fractional
/// digits than the scale carries; no floating point is involved.
pub fn threshold_to_minor_units(value: &str, unit: u128) -> Result<u128, SyncError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') || trimmed.starts_with('+') {
        return Err(SyncError::InvalidAmount(format!(
            "Not a positive decimal: {:?}",
            value
        )));
    }

    let (whole_part, frac_part) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };
    let whole_part = if whole_part.is_empty() { "0" } else { whole_part };

    let decimals = decimals_of(unit) as usize;
    if frac_part.len() > decimals {
        return Err(SyncError::InvalidAmount(format!(
            "{:?} has more than {} decimal places",
            value, decimals
        )));
    }

    let whole = whole_part
        .parse::<u128>()
        .map_err(|e| SyncError::InvalidAmount(format!("{:?}: {}", value, e)))?;
    let frac = if frac_part.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac_part, width = decimals);
        padded
            .parse::<u128>()
            .map_err(|e| SyncError::InvalidAmount(format!("{:?}: {}", value, e)))?
    };

    whole
        .checked_mul(unit)
        .and_then(|scaled| scaled.checked_add(frac))
        .ok_or_else(|| SyncError::InvalidAmount(format!("{:?} overflows minor units", value)))
}

/// Render minor units as a decimal string with trailing zeros trimmed and
/// the whole part grouped with an apostrophe every three digits.
pub fn format_minor_units(amount: u128, unit: u128) -> String {
    let whole = amount / unit;
    let frac = amount % unit;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('\'');
        }
        grouped.push(c);
    }

    if frac == 0 {
        return grouped;
    }
    let decimals = decimals_of(unit) as usize;
    let frac_str = format!("{:0>width$}", frac, width = decimals);
    let trimmed = frac_str.trim_end_matches('0');
    format!("{}.{}", grouped, trimmed)
}
