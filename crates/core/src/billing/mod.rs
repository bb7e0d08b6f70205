//! Plans, prices, and payment references.

pub mod plans;

pub use plans::{
    PlanInfo, PlanTier, PollPolicy, SubscriptionTier, account_reference, catalogue,
    merchant_reference,
};
