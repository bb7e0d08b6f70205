//! Money type in minor units with currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are stored as integers in the smallest unit the payment rail
//! accepts: cents for USD, whole shillings for KES (M-Pesa has no cents).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in the smallest currency unit.
    pub amount: i64,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// Currencies the payment rails settle in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar (Pesapal card payments).
    Usd,
    /// Kenyan Shilling (M-Pesa).
    Kes,
}

impl Currency {
    /// Number of decimal places the stored minor unit represents.
    #[must_use]
    pub const fn minor_unit_scale(self) -> u32 {
        match self {
            Self::Usd => 2,
            Self::Kes => 0,
        }
    }
}

impl Money {
    /// Creates a new Money instance from a minor-unit amount.
    #[must_use]
    pub const fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a USD amount from whole dollars.
    #[must_use]
    pub const fn usd_dollars(dollars: i64) -> Self {
        Self::new(dollars * 100, Currency::Usd)
    }

    /// Creates a KES amount from whole shillings.
    #[must_use]
    pub const fn kes(shillings: i64) -> Self {
        Self::new(shillings, Currency::Kes)
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.amount < 0
    }

    /// Returns the amount in major units as a decimal (e.g. `79.00`).
    #[must_use]
    pub fn major_units(&self) -> Decimal {
        Decimal::new(self.amount, self.currency.minor_unit_scale())
    }

    /// Formats the amount for customer-facing messages.
    ///
    /// KES renders as `KSH 10,000`; USD renders as `$79.00`.
    #[must_use]
    pub fn display(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let magnitude = self.amount.unsigned_abs();
        match self.currency {
            Currency::Kes => format!("KSH {sign}{}", group_thousands(magnitude)),
            Currency::Usd => format!(
                "{sign}${}.{:02}",
                group_thousands(magnitude / 100),
                magnitude % 100
            ),
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usd => write!(f, "USD"),
            Self::Kes => write!(f, "KES"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "KES" | "KSH" => Ok(Self::Kes),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_constructors() {
        assert_eq!(Money::usd_dollars(79), Money::new(7900, Currency::Usd));
        assert_eq!(Money::kes(10_000).amount, 10_000);
        assert!(Money::kes(0).is_zero());
        assert!(Money::new(-5, Currency::Usd).is_negative());
    }

    #[test]
    fn test_major_units() {
        assert_eq!(Money::usd_dollars(199).major_units(), dec!(199.00));
        assert_eq!(Money::new(7950, Currency::Usd).major_units(), dec!(79.50));
        assert_eq!(Money::kes(25_000).major_units(), dec!(25000));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::kes(10_000).display(), "KSH 10,000");
        assert_eq!(Money::kes(63_000).display(), "KSH 63,000");
        assert_eq!(Money::kes(950).display(), "KSH 950");
        assert_eq!(Money::usd_dollars(79).display(), "$79.00");
        assert_eq!(Money::new(129_905, Currency::Usd).display(), "$1,299.05");
    }

    #[test]
    fn test_display_negative_amounts() {
        assert_eq!(Money::new(-50, Currency::Usd).display(), "-$0.50");
        assert_eq!(Money::new(-7_950, Currency::Usd).display(), "-$79.50");
        assert_eq!(Money::new(-129_905, Currency::Usd).display(), "-$1,299.05");
        assert_eq!(Money::kes(-10_000).display(), "KSH -10,000");
        assert_eq!(Money::new(i64::MIN, Currency::Kes).display(), "KSH -9,223,372,036,854,775,808");
    }

    #[test]
    fn test_currency_display_and_parse() {
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(Currency::Kes.to_string(), "KES");
        assert_eq!(Currency::from_str("usd").unwrap(), Currency::Usd);
        assert_eq!(Currency::from_str("KSH").unwrap(), Currency::Kes);
        assert_eq!(Currency::from_str("KES").unwrap(), Currency::Kes);
        assert!(Currency::from_str("XXX").is_err());
    }
}
