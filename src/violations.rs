use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Violation {
    TitleIsBlank,
    DescriptionIsBlank,
    GoalIsNotPositive { goal: f64 },
    LifetimeIsNotPositive { lifetime_seconds: i64 },
    LifetimeIsTooLong { lifetime_seconds: i64, max_lifetime_seconds: i64 },
    DonationIsNotPositive { amount: f64 },
    DonationOverflowsTotal { amount: f64, raised_amount: f64 },
}
