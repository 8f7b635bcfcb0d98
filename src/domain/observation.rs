use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One spot price sample as returned by the EC2 API.
///
/// Immutable once produced by the fetcher and consumed exactly once by the
/// metric shaper. Duplicates (same instance/zone/product at the same
/// timestamp) pass through unmodified; the pipeline performs no
/// de-duplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotPriceObservation {
    pub instance_type: String,
    pub availability_zone: String,
    pub product_description: String,
    /// Decimal string exactly as returned by the API, e.g. "0.0321".
    /// Parsing happens in the shaper so a malformed value aborts the run
    /// before anything reaches the transport.
    pub spot_price: String,
    pub timestamp: DateTime<Utc>,
}
