use super::observation::SpotPriceObservation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("Malformed spot price {price:?} for {instance_type} in {availability_zone}: {source}")]
    MalformedPrice {
        price: String,
        instance_type: String,
        availability_zone: String,
        source: std::num::ParseFloatError,
    },
}

/// One Graphite time-series point, ready for pickle encoding.
///
/// Created from exactly one [`SpotPriceObservation`] and consumed exactly
/// once by the batch encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Dot-delimited metric path, `prefix.product.zone.instance`.
    pub path: String,
    /// Unix seconds, truncated (not rounded).
    pub timestamp: i64,
    pub value: f64,
}

/// Lowercase the input and collapse every run of characters outside
/// `[a-z0-9_.-]` into a single `_`.
///
/// Dots are preserved so instance types like `m5.large` keep their dot, and
/// a trailing `_` produced by a trailing disallowed run is kept. Existing
/// dashboards are built on exactly this mapping ("Linux/UNIX (Amazon VPC)"
/// becomes `linux_unix_amazon_vpc_`), so it must not change.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Build the metric path for an observation. The path depends only on the
/// product, zone and instance type, never on price or timestamp.
pub fn metric_path(prefix: &str, observation: &SpotPriceObservation) -> String {
    let mut path = String::new();
    if !prefix.is_empty() {
        path.push_str(prefix);
        path.push('.');
    }
    path.push_str(&sanitize(&observation.product_description));
    path.push('.');
    path.push_str(&sanitize(&observation.availability_zone));
    path.push('.');
    path.push_str(&sanitize(&observation.instance_type));
    path
}

/// Shape one observation into a metric point. Pure function, no I/O.
///
/// A price string that does not parse as a float is fatal for the whole
/// run: a malformed batch must never be silently dropped or partially sent.
pub fn shape(prefix: &str, observation: &SpotPriceObservation) -> Result<MetricPoint, ShapeError> {
    let value: f64 =
        observation
            .spot_price
            .parse()
            .map_err(|source| ShapeError::MalformedPrice {
                price: observation.spot_price.clone(),
                instance_type: observation.instance_type.clone(),
                availability_zone: observation.availability_zone.clone(),
                source,
            })?;

    Ok(MetricPoint {
        path: metric_path(prefix, observation),
        timestamp: observation.timestamp.timestamp(),
        value,
    })
}
