use std::fmt;

use crate::{Currency, EngineError, ResultEngine};

/// Signed amount in **minor units** of a currency.
///
/// The ledger itself only stores raw `i64` minor units; `Money` is the
/// boundary type used to read amounts typed by operators and to print
/// balances with their currency.
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::new(12_34, Currency::Eur);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34 EUR");
/// ```
///
/// Parsing accepts `.` or `,` as decimal separator and rejects more fraction
/// digits than the currency has:
///
/// ```rust
/// use engine::{Currency, Money};
///
/// assert_eq!(Money::parse("10", Currency::Eur).unwrap().minor(), 1000);
/// assert_eq!(Money::parse("10,5", Currency::Eur).unwrap().minor(), 1050);
/// assert!(Money::parse("12.345", Currency::Eur).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    #[must_use]
    pub const fn new(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.minor
    }

    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Parses a decimal string in major units.
    ///
    /// Accepts an optional leading `+`/`-`; rejects empty input, stray
    /// characters and excess fraction digits.
    pub fn parse(input: &str, currency: Currency) -> ResultEngine<Self> {
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {input:?}"));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = input.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let rest = rest.trim().replace(',', ".");
        if rest.is_empty() {
            return Err(EngineError::InvalidAmount("empty amount".to_string()));
        }

        let (major_str, fraction_str) = match rest.split_once('.') {
            Some((major, fraction)) => (major, fraction),
            None => (rest.as_str(), ""),
        };
        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !fraction_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = usize::from(currency.minor_units());
        if fraction_str.len() > digits {
            return Err(EngineError::InvalidAmount("too many decimals".to_string()));
        }
        let scale = 10i64.pow(u32::from(currency.minor_units()));
        let major: i64 = major_str.parse().map_err(|_| overflow())?;
        let fraction: i64 = if fraction_str.is_empty() {
            0
        } else {
            let padded = format!("{fraction_str:0<digits$}");
            padded.parse().map_err(|_| invalid())?
        };

        let total = major
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(overflow)?;
        let minor = if negative { -total } else { total };

        Ok(Self { minor, currency })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = usize::from(self.currency.minor_units());
        let scale = 10u64.pow(u32::from(self.currency.minor_units()));
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:0digits$} {}",
            abs / scale,
            abs % scale,
            self.currency.code()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_code() {
        assert_eq!(Money::new(0, Currency::Eur).to_string(), "0.00 EUR");
        assert_eq!(Money::new(7, Currency::Usd).to_string(), "0.07 USD");
        assert_eq!(Money::new(-1050, Currency::Eur).to_string(), "-10.50 EUR");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        let eur = Currency::Eur;
        assert_eq!(Money::parse("10.5", eur).unwrap().minor(), 1050);
        assert_eq!(Money::parse("10,50", eur).unwrap().minor(), 1050);
        assert_eq!(Money::parse("-0.01", eur).unwrap().minor(), -1);
        assert_eq!(Money::parse("+1.", eur).unwrap().minor(), 100);
        assert_eq!(Money::parse("  2.30 ", eur).unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_garbage() {
        let eur = Currency::Eur;
        assert!(Money::parse("", eur).is_err());
        assert!(Money::parse("-", eur).is_err());
        assert!(Money::parse("1.2.3", eur).is_err());
        assert!(Money::parse("12.345", eur).is_err());
        assert!(Money::parse("abc", eur).is_err());
    }
}
