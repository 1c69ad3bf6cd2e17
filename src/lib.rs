use std::sync::Arc;

use actix_web::web::{self, Data, JsonConfig, PathConfig, QueryConfig, ServiceConfig};
use actix_web::{App, HttpServer, ResponseError};
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;

pub mod activity;
pub mod campaign;
pub mod clock;
pub mod config;
pub mod error;
pub mod schedule;
pub mod seed;
pub mod storage;
pub mod typedid;
pub mod violations;

pub use activity::{LogAction, LogEntry, LogEntryBody, LogOrder};
pub use campaign::manager::{CampaignStore, Outcome};
pub use campaign::{
    Campaign, CampaignBody, CampaignId, CampaignStats, CreateCampaignBody, DonateBody, NewCampaign,
    RestartBody,
};
pub use config::{Config, StorageConfig, StorageLocation};
pub use error::{Error, PersistenceWarning};

use crate::clock::SystemClock;

/// Registers every route and the custom extractor error formats.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(|err, _req| {
        // format json errors with custom format
        Error::InvalidJson(err).into()
    }))
    .app_data(PathConfig::default().error_handler(|err, _req| {
        // format path errors with custom format
        Error::InvalidPath(err).into()
    }))
    .app_data(QueryConfig::default().error_handler(|err, _req| {
        // format query errors with custom format
        Error::InvalidQuery(err).into()
    }))
    .service(campaign::endpoints::create_campaign)
    .service(campaign::endpoints::get_campaigns)
    .service(campaign::endpoints::restart_campaigns)
    .service(campaign::endpoints::get_campaign_by_id)
    .service(campaign::endpoints::donate_to_campaign)
    .service(campaign::endpoints::get_stats)
    .service(activity::endpoints::get_activity);
}

pub async fn run(config: Config) -> Result<(), Error> {
    let storage = storage::connect(&config.storage_config()).await?;
    let store = Arc::new(CampaignStore::init(storage, Arc::new(SystemClock)).await?);

    let expirations = actix_web::rt::spawn(schedule::drive_expirations(
        Arc::clone(&store),
        config.expiry_idle,
    ));

    let data = Data::from(Arc::clone(&store));
    info!("listening on {}", config.bind_address);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(TracingLogger::default())
            .configure(configure)
            .default_service(web::to(|| async { Error::PathNotFound.error_response() }))
    })
    .bind(config.bind_address)?
    .run()
    .await?;

    store.teardown().await?;
    join_expiry_driver(expirations).await;

    Ok(())
}

/// Waits for the expiry driver; returns `false` if it panicked or was
/// cancelled.
async fn join_expiry_driver(driver: JoinHandle<()>) -> bool {
    match driver.await {
        Ok(()) => true,
        Err(err) => {
            error!("expiry driver failed: {}", err);
            false
        }
    }
}
