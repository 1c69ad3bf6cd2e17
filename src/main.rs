use clap::Parser;
use tracing_subscriber::fmt::format::FmtSpan;

use crowdfund_server::{Config, Error};

#[actix_web::main]
async fn main() -> Result<(), Error> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_span_events(FmtSpan::NEW)
        .compact()
        .init();

    crowdfund_server::run(config).await
}
