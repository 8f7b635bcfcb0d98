use super::config::Config;
use crate::domain::{self, PipelineError};
use crate::encoder;
use crate::fetcher::{PriceHistorySource, PriceWindow};
use crate::transport;
use tracing::{debug, info};

/// Outcome of one successful pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub observations: usize,
    pub bytes_sent: usize,
}

/// Run the pipeline once: fetch → shape → encode → send.
///
/// Strictly sequential. The first error aborts the remaining stages, so
/// nothing reaches the transport unless the entire batch was fetched,
/// shaped and encoded.
pub async fn run(
    config: &Config,
    source: &dyn PriceHistorySource,
) -> Result<RunSummary, PipelineError> {
    let window = PriceWindow::ending_now(config.interval);
    debug!(start = %window.start, end = %window.end, "fetching spot price history");

    let observations = source.fetch(window).await?;
    info!(count = observations.len(), "fetched spot price observations");

    let mut points = Vec::with_capacity(observations.len());
    for observation in &observations {
        let point = domain::shape(&config.graphite_prefix, observation)?;
        debug!("{} {} {}", point.path, point.timestamp, point.value);
        points.push(point);
    }

    let frame = encoder::encode(&points)?;
    transport::send(&config.graphite_host, config.graphite_port, &frame).await?;

    info!(
        metrics = points.len(),
        bytes = frame.len(),
        host = %config.graphite_host,
        port = config.graphite_port,
        "batch delivered to Graphite"
    );

    Ok(RunSummary {
        observations: observations.len(),
        bytes_sent: frame.len(),
    })
}
