//! Property-based tests for payment classification.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use super::*;
use crate::billing::SubscriptionTier;
use contentforge_shared::types::Money;

fn query(result_code: String) -> StkQueryResponse {
    StkQueryResponse {
        response_code: "0".to_string(),
        response_description: String::new(),
        merchant_request_id: String::new(),
        checkout_request_id: String::new(),
        result_code,
        result_desc: String::new(),
    }
}

fn any_status() -> impl Strategy<Value = TransactionStatus> {
    prop_oneof![
        Just(TransactionStatus::Pending),
        Just(TransactionStatus::Completed),
        Just(TransactionStatus::Failed),
        Just(TransactionStatus::Refunded),
    ]
}

fn any_result() -> impl Strategy<Value = ProviderResult> {
    prop_oneof![
        Just(ProviderResult::Pending),
        proptest::option::of("[A-Z0-9]{10}")
            .prop_map(|receipt| ProviderResult::Paid { receipt, paid_at: None }),
        proptest::option::of(".{0,40}").prop_map(|reason| ProviderResult::Failed { reason }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A query result is exactly one of successful, pending, failed.
    #[test]
    fn test_query_outcome_exclusive(code in "[0-9]{1,4}") {
        let response = query(code);
        let successful = is_mpesa_payment_successful(&response);
        let pending = is_mpesa_payment_pending(&response);
        prop_assert!(!(successful && pending));
        let outcome = MpesaQueryOutcome::from_query(&response);
        prop_assert_eq!(outcome == MpesaQueryOutcome::Successful, successful);
        prop_assert_eq!(outcome == MpesaQueryOutcome::Pending, pending);
    }

    /// Pesapal predicates never overlap.
    #[test]
    fn test_pesapal_predicates_exclusive(code in -2i32..10) {
        let status: PesapalTransactionStatus =
            serde_json::from_value(serde_json::json!({ "status_code": code })).unwrap();
        let hits = [
            is_pesapal_payment_completed(&status),
            is_pesapal_payment_failed(&status),
            is_pesapal_payment_pending(&status),
        ];
        prop_assert!(hits.iter().filter(|hit| **hit).count() <= 1);
    }

    /// Only pending transactions produce writes, and completions always
    /// open a thirty-day period.
    #[test]
    fn test_only_pending_settles(current in any_status(), result in any_result(), offset in 0i64..10_000_000) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(offset);
        let plan = plan_settlement(current, &result, SubscriptionTier::Pro, Money::kes(25_000), now);

        if current != TransactionStatus::Pending {
            prop_assert!(!plan.is_write());
        }
        if let SettlementPlan::Complete { activation, .. } = plan {
            prop_assert_eq!(activation.period_end - activation.period_start, Duration::days(30));
        }
    }
}
