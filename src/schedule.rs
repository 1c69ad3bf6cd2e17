use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::campaign::manager::CampaignStore;
use crate::campaign::CampaignId;

/// Pending expirations ordered by due time, then by registration order.
#[derive(Debug, Default)]
pub struct ExpirySchedule {
    pending: BTreeMap<(DateTime<Utc>, u64), CampaignId>,
    index: HashMap<CampaignId, (DateTime<Utc>, u64)>,
    sequence: u64,
}

impl ExpirySchedule {
    pub fn new() -> ExpirySchedule {
        ExpirySchedule::default()
    }

    /// Arms the expiration for `campaign_id`, replacing any earlier one.
    pub fn arm(&mut self, campaign_id: CampaignId, due: DateTime<Utc>) {
        self.cancel(campaign_id);

        let key = (due, self.sequence);
        self.sequence += 1;
        self.pending.insert(key, campaign_id);
        self.index.insert(campaign_id, key);
    }

    pub fn cancel(&mut self, campaign_id: CampaignId) -> bool {
        match self.index.remove(&campaign_id) {
            Some(key) => self.pending.remove(&key).is_some(),
            None => false,
        }
    }

    /// Removes and returns every expiration due at or before `now`.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Vec<CampaignId> {
        let mut due = vec![];

        loop {
            let (key, campaign_id) = match self.pending.iter().next() {
                Some((&key, &campaign_id)) if key.0 <= now => (key, campaign_id),
                _ => break,
            };

            self.pending.remove(&key);
            self.index.remove(&campaign_id);
            due.push(campaign_id);
        }

        due
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Fires due expirations until the store is torn down.
///
/// Sleeps until the next due time, at most `idle`, and wakes early whenever
/// the store's schedule changes.
pub async fn drive_expirations(store: Arc<CampaignStore>, idle: Duration) {
    info!("expiry driver started");

    loop {
        if store.is_closed() {
            break;
        }

        match store.expire_due().await {
            Ok(outcome) => {
                if let Some(warning) = outcome.persistence_warning {
                    warn!(?warning, "expired campaigns were not persisted");
                }
            }
            Err(err) => error!("failed to expire campaigns: {}", err),
        }

        let wait = match store.next_expiry().await {
            Some(due) => (due - store.now()).to_std().unwrap_or(Duration::ZERO).min(idle),
            None => idle,
        };
        debug!(?wait, "expiry driver sleeping");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = store.schedule_changed() => {}
        }
    }

    info!("expiry driver stopped");
}
