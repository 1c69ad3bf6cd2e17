use crate::error::Error;
use crate::storage::Storage;

use super::LogEntry;

pub const ACTIVITY_LOG: &str = "activity_log";

#[tracing::instrument(skip(db))]
pub async fn fetch_log(db: &dyn Storage) -> Result<Vec<LogEntry>, Error> {
    let log = match db.get(ACTIVITY_LOG).await? {
        Some(value) => serde_json::from_str(&value)?,
        None => vec![],
    };

    Ok(log)
}

#[tracing::instrument(skip(db, log), fields(count = log.len()))]
pub async fn store_log(db: &dyn Storage, log: &[LogEntry]) -> Result<(), Error> {
    let value = serde_json::to_string(log)?;
    db.set(ACTIVITY_LOG, value).await?;

    Ok(())
}
