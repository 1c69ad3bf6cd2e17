use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::futures::Notified;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

use crate::activity::{self, LogAction, LogEntry};
use crate::clock::Clock;
use crate::error::{Error, PersistenceWarning};
use crate::schedule::ExpirySchedule;
use crate::seed;
use crate::storage::Storage;
use crate::violations::Violation;

use super::{db, Campaign, CampaignId, CampaignStats, NewCampaign, MAX_LIFETIME_SECONDS};

/// The result of a mutation along with whether it reached storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub persistence_warning: Option<PersistenceWarning>,
}

struct StoreState {
    campaigns: Vec<Campaign>,
    log: Vec<LogEntry>,
    schedule: ExpirySchedule,
}

/// Owns the user campaigns, the activity log and their pending expirations.
///
/// In-memory state is authoritative; every mutation is written through to
/// `storage` while the state lock is held, so writes land in mutation order.
/// A storage namespace must only ever have one store writing to it.
pub struct CampaignStore {
    storage: Box<dyn Storage>,
    clock: Arc<dyn Clock>,
    fixed: Vec<Campaign>,
    state: Mutex<StoreState>,
    schedule_changed: Notify,
    closed: AtomicBool,
}

impl CampaignStore {
    /// Loads persisted campaigns and log, and re-arms their expirations.
    #[tracing::instrument(skip(storage, clock))]
    pub async fn init(
        storage: Box<dyn Storage>,
        clock: Arc<dyn Clock>,
    ) -> Result<CampaignStore, Error> {
        let campaigns: Vec<Campaign> = db::fetch_campaigns(&*storage)
            .await?
            .into_iter()
            .filter(|campaign| !campaign.is_fixed)
            .collect();
        let log = activity::db::fetch_log(&*storage).await?;

        let mut schedule = ExpirySchedule::new();
        for campaign in &campaigns {
            if let Some(due) = campaign.expires_at() {
                schedule.arm(campaign.id, due);
            }
        }

        info!(
            campaigns = campaigns.len(),
            entries = log.len(),
            "campaign store initialized"
        );

        Ok(CampaignStore {
            storage,
            clock,
            fixed: seed::fixed_campaigns(),
            state: Mutex::new(StoreState {
                campaigns,
                log,
                schedule,
            }),
            schedule_changed: Notify::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Flushes state to storage and stops accepting mutations.
    #[tracing::instrument(skip(self))]
    pub async fn teardown(&self) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        self.closed.store(true, Ordering::SeqCst);
        state.schedule.clear();

        let result = self.write_state(&state).await;
        drop(state);
        self.schedule_changed.notify_one();

        info!("campaign store torn down");
        result
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, input: NewCampaign) -> Result<Outcome<Campaign>, Error> {
        let violations = input.violations();
        if !violations.is_empty() {
            return Err(Error::CampaignViolatesRules { violations });
        }

        let mut state = self.state.lock().await;
        self.ensure_open()?;

        let now = self.clock.now();
        let lifetime_seconds = input.lifetime_seconds;
        let image = input.image.filter(|image| !image.trim().is_empty());
        let campaign = Campaign::expiring(
            input.title,
            input.description,
            input.goal,
            image,
            lifetime_seconds as u64,
            now,
        );
        let due = campaign
            .expires_at()
            .ok_or_else(|| Error::CampaignViolatesRules {
                violations: vec![Violation::LifetimeIsTooLong {
                    lifetime_seconds,
                    max_lifetime_seconds: MAX_LIFETIME_SECONDS,
                }],
            })?;

        state.campaigns.push(campaign.clone());
        state
            .log
            .push(LogEntry::for_campaign(LogAction::Created, &campaign, now));
        state.schedule.arm(campaign.id, due);

        let persistence_warning = self.persist(&state).await;
        drop(state);
        self.schedule_changed.notify_one();

        info!(campaign_id = %campaign.id, "campaign created");
        Ok(Outcome {
            value: campaign,
            persistence_warning,
        })
    }

    /// Fixed campaigns in seed order, then user campaigns in creation order.
    pub async fn list_active(&self) -> Vec<Campaign> {
        let state = self.state.lock().await;

        self.fixed
            .iter()
            .chain(state.campaigns.iter())
            .cloned()
            .collect()
    }

    /// Totals over everything `list_active` would return.
    pub async fn stats(&self) -> CampaignStats {
        let state = self.state.lock().await;

        CampaignStats::tally(self.fixed.iter().chain(state.campaigns.iter()))
    }

    pub async fn get_campaign(&self, campaign_id: CampaignId) -> Result<Campaign, Error> {
        if let Some(campaign) = self.fixed.iter().find(|c| c.id == campaign_id) {
            return Ok(campaign.clone());
        }

        let state = self.state.lock().await;
        state
            .campaigns
            .iter()
            .find(|c| c.id == campaign_id)
            .cloned()
            .ok_or(Error::CampaignNotFound { campaign_id })
    }

    /// The activity log, oldest entry first.
    pub async fn get_log(&self) -> Vec<LogEntry> {
        self.state.lock().await.log.clone()
    }

    /// Removes every user campaign at once; fixed campaigns are untouched.
    #[tracing::instrument(skip(self))]
    pub async fn restart(&self) -> Result<Outcome<Vec<CampaignId>>, Error> {
        let mut state = self.state.lock().await;
        self.ensure_open()?;

        let now = self.clock.now();
        let removed: Vec<CampaignId> = state.campaigns.drain(..).map(|c| c.id).collect();
        for campaign_id in &removed {
            state.schedule.cancel(*campaign_id);
        }
        state.log.push(LogEntry::restart(now));

        let persistence_warning = self.persist(&state).await;
        drop(state);
        self.schedule_changed.notify_one();

        info!(removed = removed.len(), "campaign store restarted");
        Ok(Outcome {
            value: removed,
            persistence_warning,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn donate(
        &self,
        campaign_id: CampaignId,
        amount: f64,
    ) -> Result<Outcome<Campaign>, Error> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::DonationViolatesRules {
                violations: vec![Violation::DonationIsNotPositive { amount }],
            });
        }
        if self.fixed.iter().any(|c| c.id == campaign_id) {
            return Err(Error::CampaignIsFixed { campaign_id });
        }

        let mut state = self.state.lock().await;
        self.ensure_open()?;

        let now = self.clock.now();
        let campaign = state
            .campaigns
            .iter_mut()
            .find(|c| c.id == campaign_id)
            .ok_or(Error::CampaignNotFound { campaign_id })?;
        if !(campaign.raised_amount + amount).is_finite() {
            return Err(Error::DonationViolatesRules {
                violations: vec![Violation::DonationOverflowsTotal {
                    amount,
                    raised_amount: campaign.raised_amount,
                }],
            });
        }
        campaign.raised_amount += amount;
        campaign.backers += 1;
        let campaign = campaign.clone();
        state
            .log
            .push(LogEntry::for_campaign(LogAction::Donated, &campaign, now));

        let persistence_warning = self.persist(&state).await;

        info!(%campaign_id, amount, "donation received");
        Ok(Outcome {
            value: campaign,
            persistence_warning,
        })
    }

    /// Expires one campaign now. Returns `false` if it was already gone.
    #[tracing::instrument(skip(self))]
    pub async fn expire(&self, campaign_id: CampaignId) -> Result<Outcome<bool>, Error> {
        let mut state = self.state.lock().await;
        self.ensure_open()?;
        state.schedule.cancel(campaign_id);

        let now = self.clock.now();
        if remove_campaign(&mut state, campaign_id, now).is_none() {
            debug!(%campaign_id, "campaign already removed");
            return Ok(Outcome {
                value: false,
                persistence_warning: None,
            });
        }

        let persistence_warning = self.persist(&state).await;

        info!(%campaign_id, "campaign expired");
        Ok(Outcome {
            value: true,
            persistence_warning,
        })
    }

    /// Fires every expiration due by the clock's current time.
    #[tracing::instrument(skip(self))]
    pub async fn expire_due(&self) -> Result<Outcome<Vec<CampaignId>>, Error> {
        let mut state = self.state.lock().await;

        let now = self.clock.now();
        let due = state.schedule.pop_due(now);
        let removed: Vec<CampaignId> = due
            .into_iter()
            .filter_map(|campaign_id| remove_campaign(&mut state, campaign_id, now))
            .map(|campaign| campaign.id)
            .collect();

        if removed.is_empty() {
            return Ok(Outcome {
                value: removed,
                persistence_warning: None,
            });
        }

        let persistence_warning = self.persist(&state).await;

        for campaign_id in &removed {
            info!(%campaign_id, "campaign expired");
        }
        Ok(Outcome {
            value: removed,
            persistence_warning,
        })
    }

    pub async fn next_expiry(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.schedule.next_due()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Resolves the next time an expiration is armed or cancelled.
    pub fn schedule_changed(&self) -> Notified<'_> {
        self.schedule_changed.notified()
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.is_closed() {
            return Err(Error::StoreClosed);
        }

        Ok(())
    }

    async fn write_state(&self, state: &StoreState) -> Result<(), Error> {
        db::store_campaigns(&*self.storage, &state.campaigns).await?;
        activity::db::store_log(&*self.storage, &state.log).await?;

        Ok(())
    }

    async fn persist(&self, state: &StoreState) -> Option<PersistenceWarning> {
        match self.write_state(state).await {
            Ok(()) => None,
            Err(err) => {
                warn!("failed to persist campaign store: {}", err);
                Some(PersistenceWarning::from(&err))
            }
        }
    }
}

fn remove_campaign(
    state: &mut StoreState,
    campaign_id: CampaignId,
    now: DateTime<Utc>,
) -> Option<Campaign> {
    let index = state.campaigns.iter().position(|c| c.id == campaign_id)?;
    let campaign = state.campaigns.remove(index);
    state
        .log
        .push(LogEntry::for_campaign(LogAction::Removed, &campaign, now));

    Some(campaign)
}
