use actix_web::get;
use actix_web::web::{Data, Json, Query};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::manager::CampaignStore;
use crate::campaign::Campaign;
use crate::error::Error;

use super::{LogAction, LogEntry};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOrder {
    Oldest,
    Newest,
}

impl Default for LogOrder {
    fn default() -> LogOrder {
        LogOrder::Oldest
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub order: LogOrder,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntryBody {
    pub action: LogAction,
    pub campaign: Option<Campaign>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntryBody {
    pub fn render(entry: LogEntry) -> LogEntryBody {
        LogEntryBody {
            action: entry.action,
            campaign: entry.campaign,
            timestamp: entry.timestamp,
        }
    }
}

#[get("/activity")]
#[tracing::instrument(skip(store))]
pub async fn get_activity(
    store: Data<CampaignStore>,
    query: Query<LogQuery>,
) -> Result<Json<Vec<LogEntryBody>>, Error> {
    let mut log = store.get_log().await;
    if query.order == LogOrder::Newest {
        log.reverse();
    }

    let body = log.into_iter().map(LogEntryBody::render).collect();

    Ok(Json(body))
}
