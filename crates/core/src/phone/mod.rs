//! Kenyan MSISDN normalisation and validation.
//!
//! M-Pesa only accepts numbers in the international `2547XXXXXXXX` /
//! `2541XXXXXXXX` form. Customers type them in every other shape.

#[cfg(test)]
mod props;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kenya's country calling code.
pub const KENYA_COUNTRY_CODE: &str = "254";

/// Phone number errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    /// Input does not normalise to a Kenyan mobile number.
    #[error("Invalid Kenyan phone number: {0}")]
    Invalid(String),
}

/// Normalises a Kenyan phone number to `254XXXXXXXXX`.
///
/// Whitespace, `-` and `+` are removed, a leading `0` is replaced by the
/// country code, and the country code is prefixed when missing. The result
/// is not validated.
#[must_use]
pub fn format_kenyan_phone_number(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '+')
        .collect();

    let cleaned = match cleaned.strip_prefix('0') {
        Some(rest) => format!("{KENYA_COUNTRY_CODE}{rest}"),
        None => cleaned,
    };

    if cleaned.starts_with(KENYA_COUNTRY_CODE) {
        cleaned
    } else {
        format!("{KENYA_COUNTRY_CODE}{cleaned}")
    }
}

/// Returns true if the number normalises to `254` + `7|1` + 8 digits.
#[must_use]
pub fn is_valid_kenyan_phone_number(raw: &str) -> bool {
    is_normalised_mobile(&format_kenyan_phone_number(raw))
}

fn is_normalised_mobile(formatted: &str) -> bool {
    let Some(subscriber) = formatted.strip_prefix(KENYA_COUNTRY_CODE) else {
        return false;
    };
    let bytes = subscriber.as_bytes();
    bytes.len() == 9 && matches!(bytes[0], b'7' | b'1') && bytes.iter().all(u8::is_ascii_digit)
}

/// A validated, normalised Kenyan mobile number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KenyanMsisdn(String);

impl KenyanMsisdn {
    /// Normalises and validates a phone number.
    ///
    /// # Errors
    ///
    /// Returns `PhoneError::Invalid` if the number is not a Kenyan mobile number.
    pub fn parse(raw: &str) -> Result<Self, PhoneError> {
        let formatted = format_kenyan_phone_number(raw);
        if is_normalised_mobile(&formatted) {
            Ok(Self(formatted))
        } else {
            Err(PhoneError::Invalid(raw.to_string()))
        }
    }

    /// The `254XXXXXXXXX` form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KenyanMsisdn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for KenyanMsisdn {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KenyanMsisdn> for String {
    fn from(value: KenyanMsisdn) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0712345678", "254712345678")]
    #[case("+254712345678", "254712345678")]
    #[case("254712345678", "254712345678")]
    #[case("0712 345 678", "254712345678")]
    #[case("0712-345-678", "254712345678")]
    #[case("712345678", "254712345678")]
    #[case(" 0110 123 456 ", "254110123456")]
    fn test_format(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_kenyan_phone_number(input), expected);
    }

    #[rstest]
    #[case("0712345678", true)]
    #[case("254712345678", true)]
    #[case("+254712345678", true)]
    #[case("0  732345678", true)]
    #[case("254732345678", true)]
    #[case("0110123456", true)]
    #[case("0612345678", false)]
    #[case("071234567", false)]
    #[case("07123456789", false)]
    #[case("255712345678", false)]
    #[case("+1234567890", false)]
    #[case("07123x5678", false)]
    #[case("", false)]
    fn test_validity(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(is_valid_kenyan_phone_number(input), valid);
    }

    #[test]
    fn test_msisdn_parse() {
        let msisdn = KenyanMsisdn::parse("0712 345 678").unwrap();
        assert_eq!(msisdn.as_str(), "254712345678");
        assert_eq!(msisdn.to_string(), "254712345678");

        assert_eq!(
            KenyanMsisdn::parse("0612345678"),
            Err(PhoneError::Invalid("0612345678".to_string()))
        );
    }

    #[test]
    fn test_msisdn_serde() {
        let msisdn: KenyanMsisdn = serde_json::from_str("\"+254 712 345 678\"").unwrap();
        assert_eq!(serde_json::to_string(&msisdn).unwrap(), "\"254712345678\"");
        assert!(serde_json::from_str::<KenyanMsisdn>("\"12345\"").is_err());
    }
}
