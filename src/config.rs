use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tracing::Level;

/// Server settings, read from flags or their `CROWDFUND_*` variables.
#[derive(Clone, Debug, PartialEq, Parser)]
#[command(name = "crowdfund_server")]
#[command(about = "Campaign store with expiring user campaigns and an activity log")]
pub struct Config {
    #[arg(long = "bind", env = "CROWDFUND_BIND", default_value = "127.0.0.1:8080")]
    pub bind_address: SocketAddr,

    /// `memory`, or a `mongodb://` / `mongodb+srv://` uri
    #[arg(
        long,
        env = "CROWDFUND_STORAGE",
        default_value = "mongodb://localhost:27017",
        value_parser = parse_storage
    )]
    pub storage: StorageLocation,

    #[arg(long, env = "CROWDFUND_DATABASE", default_value = "crowdfund")]
    pub database: String,

    #[arg(long, env = "CROWDFUND_LOG_LEVEL", default_value = "debug")]
    pub log_level: Level,

    /// Longest the expiry driver sleeps when nothing is due sooner.
    #[arg(
        long = "expiry-idle-seconds",
        env = "CROWDFUND_EXPIRY_IDLE_SECONDS",
        default_value = "60",
        value_parser = parse_idle
    )]
    pub expiry_idle: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StorageLocation {
    Memory,
    Mongo(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum StorageConfig {
    Memory,
    Mongo { uri: String, database: String },
}

impl Config {
    pub fn storage_config(&self) -> StorageConfig {
        match &self.storage {
            StorageLocation::Memory => StorageConfig::Memory,
            StorageLocation::Mongo(uri) => StorageConfig::Mongo {
                uri: uri.clone(),
                database: self.database.clone(),
            },
        }
    }
}

fn parse_storage(value: &str) -> Result<StorageLocation, String> {
    if value == "memory" {
        Ok(StorageLocation::Memory)
    } else if value.starts_with("mongodb://") || value.starts_with("mongodb+srv://") {
        Ok(StorageLocation::Mongo(value.to_owned()))
    } else {
        Err(format!("expected `memory` or a mongodb uri, got `{}`", value))
    }
}

fn parse_idle(value: &str) -> Result<Duration, String> {
    match value.parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(format!("expected a positive number of seconds, got `{}`", value)),
    }
}
