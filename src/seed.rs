use chrono::{DateTime, Utc};

use crate::campaign::{Campaign, CampaignId};

const CLEAN_WATER_ID: CampaignId = CampaignId::from_u128(0x16E77539_8873_4C8A_BCA3_2036010474AD);
const EDUCATION_ID: CampaignId = CampaignId::from_u128(0x5EA81D0A_9788_4B8A_82D9_1A0D636B53CE);
const HEALTHCARE_ID: CampaignId = CampaignId::from_u128(0x33957EB6_0EE7_487F_A087_E55C335BD63C);

/// The permanent campaigns shown ahead of every user campaign.
///
/// These are never persisted; the store merges them in on every read.
pub fn fixed_campaigns() -> Vec<Campaign> {
    let seeded_at = DateTime::<Utc>::UNIX_EPOCH;

    vec![
        Campaign::fixed(
            CLEAN_WATER_ID,
            "Clean Water for All",
            "Help us provide clean and safe water to remote villages.",
            5000.0,
            "https://images.unsplash.com/photo-1464983953574-0892a716854b?auto=format&fit=crop&w=400&q=80",
            seeded_at,
        ),
        Campaign::fixed(
            EDUCATION_ID,
            "Education for Every Child",
            "Support our mission to build schools in rural areas.",
            10000.0,
            "https://images.unsplash.com/photo-1503676382389-4809596d5290?auto=format&fit=crop&w=400&q=80",
            seeded_at,
        ),
        Campaign::fixed(
            HEALTHCARE_ID,
            "Healthcare Access Fund",
            "Provide essential healthcare to those in need.",
            8000.0,
            "https://images.unsplash.com/photo-1515378791036-0648a3ef77b2?auto=format&fit=crop&w=400&q=80",
            seeded_at,
        ),
    ]
}
