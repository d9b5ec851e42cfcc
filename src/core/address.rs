//! Address: `0x`-prefixed, 40 hex digit account/contract address

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Exactly 42 characters, no surrounding whitespace tolerated.
static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("address pattern compiles")
});

/// Why an address input was refused. Raised before any provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a token contract address before proceeding.")]
    Empty,
    #[error("Invalid address: expected 0x followed by 40 hexadecimal characters.")]
    Malformed,
}

/// A format-validated address. Keeps the caller's casing for display;
/// equality ignores case so checksummed and lowercase forms compare equal.
#[derive(Debug, Clone, Eq)]
pub struct Address(String);

impl Address {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.is_empty() {
            return Err(ValidationError::Empty);
        }
        if !ADDRESS_RE.is_match(input) {
            return Err(ValidationError::Malformed);
        }
        Ok(Self(input.to_string()))
    }

    pub fn is_valid(input: &str) -> bool {
        ADDRESS_RE.is_match(input)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x1234…abcd` form for compact status lines.
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[38..])
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Address::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "0x43b608fA9AEcE01036f3227849A889435f830428";

    #[test]
    fn accepts_mixed_case_hex() {
        let addr = Address::parse(VALID).unwrap();
        assert_eq!(addr.as_str(), VALID);
        assert_eq!(addr, Address::parse(&VALID.to_lowercase()).unwrap());
    }

    #[test]
    fn rejects_empty_separately() {
        assert_eq!(Address::parse(""), Err(ValidationError::Empty));
    }

    #[test]
    fn rejects_format_deviations() {
        let cases = [
            "43b608fA9AEcE01036f3227849A889435f830428",     // no prefix
            "0X43b608fA9AEcE01036f3227849A889435f830428",   // uppercase prefix
            "0x43b608fA9AEcE01036f3227849A889435f83042",    // 39 digits
            "0x43b608fA9AEcE01036f3227849A889435f8304280",  // 41 digits
            "0x43b608fA9AEcE01036f3227849A889435f83042g",   // non-hex
            " 0x43b608fA9AEcE01036f3227849A889435f830428",  // leading space
            "0x43b608fA9AEcE01036f3227849A889435f830428\n", // trailing newline
            "0x",
        ];
        for case in cases {
            assert_eq!(Address::parse(case), Err(ValidationError::Malformed), "{case:?}");
        }
    }

    #[test]
    fn short_form() {
        let addr = Address::parse(VALID).unwrap();
        assert_eq!(addr.short(), "0x43b6…0428");
    }

    #[test]
    fn serde_validates() {
        let ok: Address = serde_json::from_str(&format!("\"{VALID}\"")).unwrap();
        assert_eq!(ok.as_str(), VALID);
        assert!(serde_json::from_str::<Address>("\"0xnope\"").is_err());
    }
}
