use crate::error::Error;
use crate::storage::Storage;

use super::Campaign;

pub const CAMPAIGNS: &str = "campaigns";

#[tracing::instrument(skip(db))]
pub async fn fetch_campaigns(db: &dyn Storage) -> Result<Vec<Campaign>, Error> {
    let campaigns = match db.get(CAMPAIGNS).await? {
        Some(value) => serde_json::from_str(&value)?,
        None => vec![],
    };

    Ok(campaigns)
}

#[tracing::instrument(skip(db, campaigns), fields(count = campaigns.len()))]
pub async fn store_campaigns(db: &dyn Storage, campaigns: &[Campaign]) -> Result<(), Error> {
    let value = serde_json::to_string(campaigns)?;
    db.set(CAMPAIGNS, value).await?;

    Ok(())
}
