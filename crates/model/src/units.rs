//! Conversions between human readable token amounts and base units.

use {
    alloy::primitives::{
        U256,
        utils::{ParseUnits, UnitsError, format_units, parse_units},
    },
    thiserror::Error,
};

/// Decimals of WETH and ZRX.
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Error)]
pub enum AmountError {
    #[error("invalid amount {amount:?}: {source}")]
    Parse { amount: String, source: UnitsError },
    #[error("amount {0:?} is negative")]
    Negative(String),
}

/// Converts a decimal amount like `"0.1"` into base units of a token with
/// `decimals` decimals.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    match parse_units(amount, decimals) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(AmountError::Negative(amount.to_owned())),
        Err(source) => Err(AmountError::Parse {
            amount: amount.to_owned(),
            source,
        }),
    }
}

/// Inverse of [`to_base_units`]. Falls back to the raw base units for
/// decimals alloy cannot represent.
pub fn to_unit_amount(value: U256, decimals: u8) -> String {
    format_units(value, decimals).unwrap_or_else(|_| value.to_string())
}

pub trait TokenUnit: Sized {
    /// Returns the amount in base units of an 18 decimals token.
    fn atoms(self) -> U256;
}

impl TokenUnit for u64 {
    fn atoms(self) -> U256 {
        U256::from(self) * U256::from(10).pow(U256::from(DEFAULT_DECIMALS))
    }
}
