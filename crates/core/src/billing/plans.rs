//! Subscription plan catalogue.

use std::time::Duration;

use chrono::{DateTime, Utc};
use contentforge_shared::types::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Every tier a subscription row can hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// No paid plan.
    #[default]
    Free,
    /// Creator plan.
    Creator,
    /// Pro plan.
    Pro,
    /// Agency plan.
    Agency,
    /// Sales-negotiated plan.
    Enterprise,
}

impl SubscriptionTier {
    /// Column value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Creator => "creator",
            Self::Pro => "pro",
            Self::Agency => "agency",
            Self::Enterprise => "enterprise",
        }
    }

    /// The self-serve plan for this tier, if any.
    #[must_use]
    pub const fn plan(&self) -> Option<PlanTier> {
        match self {
            Self::Creator => Some(PlanTier::Creator),
            Self::Pro => Some(PlanTier::Pro),
            Self::Agency => Some(PlanTier::Agency),
            Self::Free | Self::Enterprise => None,
        }
    }
}

/// Plans customers can buy through M-Pesa or Pesapal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// 79 USD / 10,000 KES.
    Creator,
    /// 199 USD / 25,000 KES.
    Pro,
    /// 499 USD / 63,000 KES.
    Agency,
}

impl PlanTier {
    /// All purchasable plans, cheapest first.
    pub const ALL: [Self; 3] = [Self::Creator, Self::Pro, Self::Agency];

    /// Card price, in cents.
    #[must_use]
    pub const fn usd_price(&self) -> Money {
        match self {
            Self::Creator => Money::usd_dollars(79),
            Self::Pro => Money::usd_dollars(199),
            Self::Agency => Money::usd_dollars(499),
        }
    }

    /// M-Pesa price, in whole shillings.
    #[must_use]
    pub const fn kes_price(&self) -> Money {
        match self {
            Self::Creator => Money::kes(10_000),
            Self::Pro => Money::kes(25_000),
            Self::Agency => Money::kes(63_000),
        }
    }

    /// Price in the given currency.
    #[must_use]
    pub const fn price(&self, currency: Currency) -> Money {
        match currency {
            Currency::Usd => self.usd_price(),
            Currency::Kes => self.kes_price(),
        }
    }

    /// Returns true if `amount` pays at least this plan's price in its currency.
    #[must_use]
    pub const fn covers(&self, amount: Money) -> bool {
        amount.amount >= self.price(amount.currency).amount
    }

    /// Display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Creator => "Creator",
            Self::Pro => "Pro",
            Self::Agency => "Agency",
        }
    }

    /// Upper-case code used in payment references.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Creator => "CREATOR",
            Self::Pro => "PRO",
            Self::Agency => "AGENCY",
        }
    }

    /// The subscription tier this plan activates.
    #[must_use]
    pub const fn tier(&self) -> SubscriptionTier {
        match self {
            Self::Creator => SubscriptionTier::Creator,
            Self::Pro => SubscriptionTier::Pro,
            Self::Agency => SubscriptionTier::Agency,
        }
    }

    /// Marketing feature bullets.
    #[must_use]
    pub const fn features(&self) -> &'static [&'static str] {
        match self {
            Self::Creator => &[
                "10 hours of content/month",
                "2 brand profiles",
                "LinkedIn + Twitter",
                "Basic analytics",
                "Email support",
            ],
            Self::Pro => &[
                "40 hours of content/month",
                "5 brand profiles",
                "All platforms",
                "Advanced analytics",
                "Priority support",
                "API access",
            ],
            Self::Agency => &[
                "200 hours of content/month",
                "Unlimited brands",
                "All platforms + white-label",
                "Custom analytics",
                "Dedicated support",
                "Full API access",
                "Team collaboration",
            ],
        }
    }

    /// Default order/STK description.
    #[must_use]
    pub fn description(&self) -> String {
        format!("ContentForge {} Plan Subscription", self.display_name())
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "creator" => Ok(Self::Creator),
            "pro" => Ok(Self::Pro),
            "agency" => Ok(Self::Agency),
            _ => Err(format!("Unknown plan: {s}")),
        }
    }
}

/// Pesapal merchant reference: `SUB-{PLAN}-{unix millis}`.
#[must_use]
pub fn merchant_reference(plan: PlanTier, now: DateTime<Utc>) -> String {
    format!("SUB-{}-{}", plan.code(), now.timestamp_millis())
}

/// M-Pesa account reference: `SUB-{PLAN}`.
#[must_use]
pub fn account_reference(plan: PlanTier) -> String {
    format!("SUB-{}", plan.code())
}

/// How clients should poll STK status after a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollPolicy {
    /// Seconds between status checks.
    pub interval_seconds: u64,
    /// Checks before giving up.
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Every 6 seconds, 20 times (two minutes).
    pub const STK_DEFAULT: Self = Self {
        interval_seconds: 6,
        max_attempts: 20,
    };

    /// Total time a client keeps polling.
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.interval_seconds * u64::from(self.max_attempts))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::STK_DEFAULT
    }
}

/// Plan listing entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInfo {
    /// Plan id (`creator`, `pro`, `agency`).
    pub id: PlanTier,
    /// Display name.
    pub name: &'static str,
    /// Card price.
    pub price_usd: Money,
    /// M-Pesa price.
    pub price_kes: Money,
    /// Marketing bullets.
    pub features: &'static [&'static str],
    /// Highlighted in the UI.
    pub popular: bool,
}

/// The plan catalogue.
#[must_use]
pub fn catalogue() -> Vec<PlanInfo> {
    PlanTier::ALL
        .iter()
        .map(|plan| PlanInfo {
            id: *plan,
            name: plan.display_name(),
            price_usd: plan.usd_price(),
            price_kes: plan.kes_price(),
            features: plan.features(),
            popular: matches!(plan, PlanTier::Pro),
        })
        .collect()
}
