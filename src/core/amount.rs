//! Amount - native asset value in wei (10^18 per whole unit)
//!
//! Decimal strings ("2.1") are what users see; the provider wants the wei
//! value hex-encoded ("0x1d24b2dfac520000").

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DECIMALS: u32 = 18;
pub const WEI_PER_UNIT: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid amount '{0}'")]
    Invalid(String),
    #[error("amount '{0}' has more than 18 decimal places")]
    TooPrecise(String),
    #[error("amount '{0}' is too large")]
    Overflow(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    pub fn wei(&self) -> u128 {
        self.0
    }

    pub fn parse_decimal(input: &str) -> Result<Self, AmountError> {
        if input.is_empty() {
            return Err(AmountError::Empty);
        }
        let (whole, frac) = match input.split_once('.') {
            Some((w, f)) => (w, f),
            None => (input, ""),
        };
        let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
            return Err(AmountError::Invalid(input.into()));
        }
        if frac.len() > DECIMALS as usize {
            return Err(AmountError::TooPrecise(input.into()));
        }

        let overflow = || AmountError::Overflow(input.into());
        let whole_wei = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u128>()
                .map_err(|_| overflow())?
                .checked_mul(WEI_PER_UNIT)
                .ok_or_else(overflow)?
        };
        let frac_wei = if frac.is_empty() {
            0
        } else {
            // Right-pad to 18 digits: "1" -> 100000000000000000
            let padded = format!("{:0<width$}", frac, width = DECIMALS as usize);
            padded.parse::<u128>().map_err(|_| AmountError::Invalid(input.into()))?
        };
        whole_wei.checked_add(frac_wei).map(Self).ok_or_else(overflow)
    }

    /// Lowercase `0x`-prefixed hex of the wei value, as `eth_sendTransaction` expects.
    pub fn to_hex(&self) -> String {
        format!("{:#x}", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / WEI_PER_UNIT;
        let frac = self.0 % WEI_PER_UNIT;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let frac = format!("{:018}", frac);
        write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = AmountError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Amount::parse_decimal(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fee_amounts() {
        assert_eq!(Amount::parse_decimal("2.1").unwrap().wei(), 2_100_000_000_000_000_000);
        assert_eq!(Amount::parse_decimal("1").unwrap().wei(), WEI_PER_UNIT);
        assert_eq!(Amount::parse_decimal(".5").unwrap().wei(), WEI_PER_UNIT / 2);
        assert_eq!(Amount::parse_decimal("3.").unwrap().wei(), 3 * WEI_PER_UNIT);
        assert_eq!(Amount::parse_decimal("0.000000000000000001").unwrap().wei(), 1);
    }

    #[test]
    fn hex_encoding() {
        assert_eq!(Amount::parse_decimal("2.1").unwrap().to_hex(), "0x1d24b2dfac520000");
        assert_eq!(Amount::parse_decimal("1.1").unwrap().to_hex(), "0xf43fc2c04ee0000");
        assert_eq!(Amount::ZERO.to_hex(), "0x0");
    }

    #[test]
    fn display_is_shortest_decimal() {
        assert_eq!(Amount::parse_decimal("2.10").unwrap().to_string(), "2.1");
        assert_eq!(Amount::parse_decimal("1.6").unwrap().to_string(), "1.6");
        assert_eq!(Amount::from_wei(WEI_PER_UNIT * 7).to_string(), "7");
        assert_eq!(Amount::from_wei(1).to_string(), "0.000000000000000001");
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Amount::parse_decimal(""), Err(AmountError::Empty));
        assert!(matches!(Amount::parse_decimal("."), Err(AmountError::Invalid(_))));
        assert!(matches!(Amount::parse_decimal("-1"), Err(AmountError::Invalid(_))));
        assert!(matches!(Amount::parse_decimal("1.2.3"), Err(AmountError::Invalid(_))));
        assert!(matches!(Amount::parse_decimal("1e18"), Err(AmountError::Invalid(_))));
        assert!(matches!(
            Amount::parse_decimal("0.0000000000000000001"),
            Err(AmountError::TooPrecise(_))
        ));
        assert!(matches!(
            Amount::parse_decimal("1000000000000000000000000"),
            Err(AmountError::Overflow(_))
        ));
    }
}
