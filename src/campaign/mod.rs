use std::convert::TryFrom;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::typedid::{TypedId, TypedIdMarker};
use crate::violations::Violation;

pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type CampaignId = TypedId<Campaign>;

/// Ten years; longer lifetimes are rejected at creation.
pub const MAX_LIFETIME_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub title: String,
    pub description: String,
    pub goal: f64,
    pub image: Option<String>,
    // absent exactly when the campaign is fixed
    pub lifetime_seconds: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub is_fixed: bool,
    #[serde(default)]
    pub raised_amount: f64,
    #[serde(default)]
    pub backers: u32,
}

impl Campaign {
    /// A user campaign that expires `lifetime_seconds` after `created_at`.
    pub fn expiring(
        title: String,
        description: String,
        goal: f64,
        image: Option<String>,
        lifetime_seconds: u64,
        created_at: DateTime<Utc>,
    ) -> Campaign {
        Campaign {
            id: CampaignId::new(),
            title,
            description,
            goal,
            image,
            lifetime_seconds: Some(lifetime_seconds),
            created_at,
            is_fixed: false,
            raised_amount: 0.0,
            backers: 0,
        }
    }

    /// A compiled-in campaign that never expires.
    pub fn fixed(
        id: CampaignId,
        title: &str,
        description: &str,
        goal: f64,
        image: &str,
        created_at: DateTime<Utc>,
    ) -> Campaign {
        Campaign {
            id,
            title: title.to_owned(),
            description: description.to_owned(),
            goal,
            image: Some(image.to_owned()),
            lifetime_seconds: None,
            created_at,
            is_fixed: true,
            raised_amount: 0.0,
            backers: 0,
        }
    }

    /// `None` for fixed campaigns, and for lifetimes that do not fit on the
    /// calendar.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.lifetime_seconds?).ok()?;
        let lifetime = Duration::try_seconds(seconds)?;

        self.created_at.checked_add_signed(lifetime)
    }

    pub fn progress_percent(&self) -> f64 {
        if self.goal <= 0.0 {
            return 0.0;
        }

        (self.raised_amount / self.goal * 100.0).min(100.0)
    }
}

impl TypedIdMarker for Campaign {
    fn tag() -> &'static str {
        "CPN"
    }
}

/// User input for a campaign before it is accepted by the store.
#[derive(Clone, Debug, PartialEq)]
pub struct NewCampaign {
    pub title: String,
    pub description: String,
    pub goal: f64,
    pub image: Option<String>,
    pub lifetime_seconds: i64,
}

impl NewCampaign {
    pub fn violations(&self) -> Vec<Violation> {
        let mut violations = vec![];

        if self.title.trim().is_empty() {
            violations.push(Violation::TitleIsBlank);
        }
        if self.description.trim().is_empty() {
            violations.push(Violation::DescriptionIsBlank);
        }
        if !self.goal.is_finite() || self.goal <= 0.0 {
            violations.push(Violation::GoalIsNotPositive { goal: self.goal });
        }
        if self.lifetime_seconds <= 0 {
            violations.push(Violation::LifetimeIsNotPositive {
                lifetime_seconds: self.lifetime_seconds,
            });
        }
        if self.lifetime_seconds > MAX_LIFETIME_SECONDS {
            violations.push(Violation::LifetimeIsTooLong {
                lifetime_seconds: self.lifetime_seconds,
                max_lifetime_seconds: MAX_LIFETIME_SECONDS,
            });
        }

        violations
    }
}

/// Totals across every active campaign, fixed ones included.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CampaignStats {
    pub total_campaigns: usize,
    pub total_goal: f64,
    pub total_raised: f64,
    pub total_backers: u64,
}

impl CampaignStats {
    pub fn tally<'a, I>(campaigns: I) -> CampaignStats
    where
        I: IntoIterator<Item = &'a Campaign>,
    {
        let mut stats = CampaignStats {
            total_campaigns: 0,
            total_goal: 0.0,
            total_raised: 0.0,
            total_backers: 0,
        };

        for campaign in campaigns {
            stats.total_campaigns += 1;
            stats.total_goal += campaign.goal;
            stats.total_raised += campaign.raised_amount;
            stats.total_backers += u64::from(campaign.backers);
        }

        stats
    }
}
