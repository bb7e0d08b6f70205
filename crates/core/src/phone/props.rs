//! Property-based tests for phone normalisation.

use proptest::prelude::*;

use super::{KenyanMsisdn, format_kenyan_phone_number, is_valid_kenyan_phone_number};

/// Eight subscriber digits after the `7`/`1` network prefix.
fn subscriber() -> impl Strategy<Value = (char, String)> {
    (prop::sample::select(vec!['7', '1']), "[0-9]{8}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Formatting a formatted number changes nothing.
    #[test]
    fn test_format_idempotent(raw in "[0-9+\\- ]{0,16}") {
        let once = format_kenyan_phone_number(&raw);
        prop_assert_eq!(format_kenyan_phone_number(&once), once);
    }

    /// Output always carries the country code and no separators.
    #[test]
    fn test_format_prefix_and_no_separators(raw in "[0-9+\\- ]{0,16}") {
        let formatted = format_kenyan_phone_number(&raw);
        prop_assert!(formatted.starts_with("254"));
        prop_assert!(!formatted.contains(['+', '-', ' ']));
    }

    /// Every local, international and bare spelling of a mobile number is valid
    /// and normalises to the same MSISDN.
    #[test]
    fn test_spellings_agree((net, rest) in subscriber()) {
        let canonical = format!("254{net}{rest}");
        let spellings = [
            format!("0{net}{rest}"),
            format!("+254{net}{rest}"),
            format!("{net}{rest}"),
            format!("0{net}{} {}", &rest[..2], &rest[2..]),
            canonical.clone(),
        ];
        for spelling in spellings {
            prop_assert!(is_valid_kenyan_phone_number(&spelling));
            let msisdn = KenyanMsisdn::parse(&spelling).unwrap();
            prop_assert_eq!(msisdn.as_str(), canonical.as_str());
        }
    }

    /// Other network prefixes are rejected.
    #[test]
    fn test_rejects_other_prefixes(net in "[02-689]", rest in "[0-9]{8}") {
        let local = format!("0{net}{rest}");
        prop_assert!(!is_valid_kenyan_phone_number(&local));
    }
}
