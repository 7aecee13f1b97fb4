//! Serial numbers of the form `KON-<type>-<n>` and the sequence that issues them.

use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FleetError;

/// Prefix shared by every serial number.
pub const SERIAL_PREFIX: &str = "KON";

/// Single-letter code identifying the container variant in a serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCode {
    /// Liquid container (`L`).
    Liquid,
    /// Gas container (`G`).
    Gas,
    /// Refrigerated container (`C`).
    Refrigerated,
}

impl TypeCode {
    /// Letter used inside the serial number.
    pub fn letter(self) -> char {
        match self {
            Self::Liquid => 'L',
            Self::Gas => 'G',
            Self::Refrigerated => 'C',
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'L' => Some(Self::Liquid),
            'G' => Some(Self::Gas),
            'C' => Some(Self::Refrigerated),
            _ => None,
        }
    }
}

/// Globally unique container identifier.
///
/// The sequence number alone is unique across variants; the type code is kept
/// so the rendered form matches what operators see on the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerialNumber {
    code: TypeCode,
    sequence: u64,
}

impl SerialNumber {
    /// Build a serial number from its parts.
    pub fn new(code: TypeCode, sequence: u64) -> Self {
        Self { code, sequence }
    }

    /// Variant code embedded in the serial.
    pub fn code(&self) -> TypeCode {
        self.code
    }

    /// Position in the issuing sequence.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            SERIAL_PREFIX,
            self.code.letter(),
            self.sequence
        )
    }
}

static SERIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^KON-([LGC])-(\d+)$").expect("failed to compile serial number regex")
});

impl FromStr for SerialNumber {
    type Err = FleetError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let captures = SERIAL_RE.captures(trimmed).ok_or_else(|| {
            FleetError::validation(format!("'{trimmed}' is not a serial like KON-L-1"))
        })?;
        let code = captures
            .get(1)
            .and_then(|m| m.as_str().chars().next())
            .and_then(TypeCode::from_letter)
            .ok_or_else(|| FleetError::validation(format!("unknown type code in '{trimmed}'")))?;
        let sequence = captures
            .get(2)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .ok_or_else(|| FleetError::validation(format!("invalid number in '{trimmed}'")))?;
        Ok(Self::new(code, sequence))
    }
}

/// Monotonic counter issuing serial numbers.
///
/// Shared across all variants and never rewound; a fresh sequence starts
/// at 1.
#[derive(Debug, Clone)]
pub struct SerialSequence {
    last: u64,
}

impl SerialSequence {
    /// Sequence whose first issued number is 1.
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// Sequence that continues after `last`.
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Issue the next serial number for the given variant.
    pub fn issue(&mut self, code: TypeCode) -> SerialNumber {
        self.last += 1;
        SerialNumber::new(code, self.last)
    }

    /// Last number issued, `0` when nothing was issued yet.
    pub fn last_issued(&self) -> u64 {
        self.last
    }
}

impl Default for SerialSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_shared_across_variants() {
        let mut sequence = SerialSequence::new();
        let first = sequence.issue(TypeCode::Liquid);
        let second = sequence.issue(TypeCode::Gas);
        let third = sequence.issue(TypeCode::Refrigerated);
        assert_eq!(first.to_string(), "KON-L-1");
        assert_eq!(second.to_string(), "KON-G-2");
        assert_eq!(third.to_string(), "KON-C-3");
        assert_eq!(sequence.last_issued(), 3);
    }

    #[test]
    fn parses_rendered_form() -> anyhow::Result<()> {
        let serial: SerialNumber = " kon-c-42 ".parse()?;
        assert_eq!(serial, SerialNumber::new(TypeCode::Refrigerated, 42));
        assert_eq!(serial.to_string(), "KON-C-42");
        Ok(())
    }

    #[test]
    fn rejects_malformed_serials() {
        for input in ["", "KON-X-1", "KON-L-", "CON-L-1", "KON-L-1-2"] {
            let err = input.parse::<SerialNumber>().unwrap_err();
            assert!(matches!(err, FleetError::Validation(_)), "{input}");
        }
    }

    #[test]
    fn continues_after_given_number() {
        let mut sequence = SerialSequence::starting_after(9);
        assert_eq!(sequence.issue(TypeCode::Gas).sequence(), 10);
    }
}
