pub mod config;
pub mod logging;
pub mod pipeline;

pub use config::{Config, ConfigError, LogLevel};
pub use logging::setup_logging;
pub use pipeline::{RunSummary, run};

use crate::fetcher::Ec2PriceHistory;
use clap::Parser;
use std::process;
use tracing::{error, info};

/// Main entry point for the application.
///
/// Exactly one pipeline execution per process invocation; repetition is an
/// external scheduler's concern (cron or similar). Exit code 0 only on
/// full fetch→shape→encode→send completion.
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::parse();
    logging::setup_logging(config.log_level);

    if let Err(e) = config.validate() {
        error!("Configuration error: {e}");
        process::exit(1);
    }

    info!("Starting spot-price-forwarder v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: interval={}m, products={:?}, target={}:{}",
        config.interval,
        config.product_descriptions(),
        config.graphite_host,
        config.graphite_port
    );

    let source = Ec2PriceHistory::connect(&config.aws_settings(), config.product_descriptions()).await;

    match pipeline::run(&config, &source).await {
        Ok(summary) => {
            info!(
                observations = summary.observations,
                bytes = summary.bytes_sent,
                "pipeline completed"
            );
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {e}");
            process::exit(1);
        }
    }
}
