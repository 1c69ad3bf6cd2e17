use actix_web::web::{Data, Json, Path};
use actix_web::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, PersistenceWarning};

use super::manager::{CampaignStore, Outcome};
use super::{Campaign, CampaignId, CampaignStats, NewCampaign};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateCampaignBody {
    pub title: String,
    pub description: String,
    pub goal: f64,
    #[serde(default)]
    pub image: Option<String>,
    pub lifetime_seconds: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DonateBody {
    pub amount: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignBody {
    pub id: CampaignId,
    pub title: String,
    pub description: String,
    pub goal: f64,
    pub image: Option<String>,
    pub is_fixed: bool,
    pub lifetime_seconds: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub seconds_left: Option<i64>,
    pub raised_amount: f64,
    pub backers: u32,
    pub progress_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_warning: Option<PersistenceWarning>,
}

impl CampaignBody {
    pub fn render(campaign: Campaign, now: DateTime<Utc>) -> CampaignBody {
        let expires_at = campaign.expires_at();
        CampaignBody {
            progress_percent: campaign.progress_percent(),
            id: campaign.id,
            title: campaign.title,
            description: campaign.description,
            goal: campaign.goal,
            image: campaign.image,
            is_fixed: campaign.is_fixed,
            lifetime_seconds: campaign.lifetime_seconds,
            created_at: campaign.created_at,
            expires_at,
            seconds_left: expires_at.map(|at| (at - now).num_seconds().max(0)),
            raised_amount: campaign.raised_amount,
            backers: campaign.backers,
            persistence_warning: None,
        }
    }

    pub fn render_outcome(outcome: Outcome<Campaign>, now: DateTime<Utc>) -> CampaignBody {
        CampaignBody {
            persistence_warning: outcome.persistence_warning,
            ..CampaignBody::render(outcome.value, now)
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestartBody {
    pub removed_campaign_ids: Vec<CampaignId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_warning: Option<PersistenceWarning>,
}

#[post("/campaigns")]
#[tracing::instrument(skip(store))]
pub async fn create_campaign(
    store: Data<CampaignStore>,
    body: Json<CreateCampaignBody>,
) -> Result<Json<CampaignBody>, Error> {
    let body = body.into_inner();

    let outcome = store
        .create(NewCampaign {
            title: body.title,
            description: body.description,
            goal: body.goal,
            image: body.image,
            lifetime_seconds: body.lifetime_seconds,
        })
        .await?;

    Ok(Json(CampaignBody::render_outcome(outcome, store.now())))
}

#[get("/campaigns")]
#[tracing::instrument(skip(store))]
pub async fn get_campaigns(store: Data<CampaignStore>) -> Result<Json<Vec<CampaignBody>>, Error> {
    let now = store.now();
    let campaigns = store.list_active().await;

    let body = campaigns
        .into_iter()
        .map(|campaign| CampaignBody::render(campaign, now))
        .collect();

    Ok(Json(body))
}

// registered ahead of the `{campaign_id}` routes
#[post("/campaigns/restart")]
#[tracing::instrument(skip(store))]
pub async fn restart_campaigns(store: Data<CampaignStore>) -> Result<Json<RestartBody>, Error> {
    let outcome = store.restart().await?;

    Ok(Json(RestartBody {
        removed_campaign_ids: outcome.value,
        persistence_warning: outcome.persistence_warning,
    }))
}

#[get("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(store))]
pub async fn get_campaign_by_id(
    store: Data<CampaignStore>,
    params: Path<CampaignId>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();

    let campaign = store.get_campaign(campaign_id).await?;

    Ok(Json(CampaignBody::render(campaign, store.now())))
}

#[post("/campaigns/{campaign_id}/donations")]
#[tracing::instrument(skip(store))]
pub async fn donate_to_campaign(
    store: Data<CampaignStore>,
    params: Path<CampaignId>,
    body: Json<DonateBody>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();
    let body = body.into_inner();

    let outcome = store.donate(campaign_id, body.amount).await?;

    Ok(Json(CampaignBody::render_outcome(outcome, store.now())))
}

#[get("/stats")]
#[tracing::instrument(skip(store))]
pub async fn get_stats(store: Data<CampaignStore>) -> Result<Json<CampaignStats>, Error> {
    let stats = store.stats().await;

    Ok(Json(stats))
}
