use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::Campaign;

pub mod db;
pub mod endpoints;
pub use endpoints::*;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogAction {
    Created,
    Removed,
    Restart,
    Donated,
}

/// One lifecycle transition. Entries are appended and never changed.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LogEntry {
    pub action: LogAction,
    pub campaign: Option<Campaign>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn for_campaign(action: LogAction, campaign: &Campaign, timestamp: DateTime<Utc>) -> LogEntry {
        LogEntry {
            action,
            campaign: Some(campaign.clone()),
            timestamp,
        }
    }

    pub fn restart(timestamp: DateTime<Utc>) -> LogEntry {
        LogEntry {
            action: LogAction::Restart,
            campaign: None,
            timestamp,
        }
    }
}
