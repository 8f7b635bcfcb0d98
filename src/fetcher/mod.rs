use crate::domain::SpotPriceObservation;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::operation::describe_spot_price_history::DescribeSpotPriceHistoryError;
use aws_sdk_ec2::primitives::DateTime as AwsDateTime;
use aws_sdk_ec2::types::SpotPrice;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Upper bound on the whole fetch, pagination included. The API has no
/// documented worst case, so an expired timeout is treated as a fatal
/// fetch failure rather than waiting indefinitely.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// EC2 error codes that indicate a credential problem rather than a
/// transient API failure.
const AUTH_ERROR_CODES: &[&str] = &[
    "AuthFailure",
    "UnauthorizedOperation",
    "SignatureDoesNotMatch",
    "MissingAuthenticationToken",
];

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Spot price history request failed: {0}")]
    Api(String),
    #[error("Spot price history entry is missing {field}")]
    MissingField { field: &'static str },
    #[error("Spot price history entry has out-of-range timestamp {0}")]
    InvalidTimestamp(i64),
    #[error("Spot price history request timed out after {0:?}")]
    Timeout(Duration),
}

/// Closed time window for one fetch, `[start, end]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PriceWindow {
    /// Window covering the last `interval_minutes` minutes, ending now.
    pub fn ending_now(interval_minutes: u32) -> Self {
        let end = Utc::now();
        Self {
            start: end - ChronoDuration::minutes(i64::from(interval_minutes)),
            end,
        }
    }
}

/// Seam between the pipeline and the EC2 API. One call per run; the
/// returned sequence is finite and complete (pagination followed
/// exhaustively) or the call fails as a whole.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    async fn fetch(&self, window: PriceWindow) -> Result<Vec<SpotPriceObservation>, FetchError>;
}

/// Credential and region settings resolved from the CLI. Flags override
/// the ambient profile-derived defaults; unset fields fall back to
/// whatever the AWS config chain resolves.
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub profile: String,
    pub region: Option<String>,
}

/// Production [`PriceHistorySource`] backed by `DescribeSpotPriceHistory`.
pub struct Ec2PriceHistory {
    client: Client,
    products: Vec<String>,
}

impl Ec2PriceHistory {
    pub fn new(client: Client, products: Vec<String>) -> Self {
        Self { client, products }
    }

    /// Resolve AWS configuration and build the EC2 client. Credentials are
    /// verified lazily by the first API call, not here.
    pub async fn connect(settings: &AwsSettings, products: Vec<String>) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).profile_name(&settings.profile);

        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&settings.access_key_id, &settings.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
                None,
                "cli-flags",
            ));
        }

        let sdk_config = loader.load().await;
        debug!(region = ?sdk_config.region(), "EC2 client configured");

        Self::new(Client::new(&sdk_config), products)
    }
}

#[async_trait]
impl PriceHistorySource for Ec2PriceHistory {
    async fn fetch(&self, window: PriceWindow) -> Result<Vec<SpotPriceObservation>, FetchError> {
        let request = self
            .client
            .describe_spot_price_history()
            .start_time(AwsDateTime::from_secs(window.start.timestamp()))
            .end_time(AwsDateTime::from_secs(window.end.timestamp()))
            .set_product_descriptions(Some(self.products.clone()));

        let collect = async {
            let mut pages = request.into_paginator().items().send();
            let mut observations = Vec::new();
            // Every page must arrive; a failure mid-pagination aborts the
            // whole fetch instead of returning a truncated batch.
            while let Some(item) = pages.next().await {
                let price = item.map_err(map_sdk_error)?;
                observations.push(into_observation(price)?);
            }
            Ok(observations)
        };

        match tokio::time::timeout(FETCH_TIMEOUT, collect).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(FETCH_TIMEOUT)),
        }
    }
}

fn map_sdk_error(err: SdkError<DescribeSpotPriceHistoryError>) -> FetchError {
    let code = err.code().map(str::to_owned);
    let message = DisplayErrorContext(err).to_string();
    match code.as_deref() {
        Some(code) if AUTH_ERROR_CODES.contains(&code) => FetchError::Auth(message),
        _ => FetchError::Api(message),
    }
}

fn into_observation(price: SpotPrice) -> Result<SpotPriceObservation, FetchError> {
    let instance_type = price
        .instance_type()
        .map(|t| t.as_str().to_owned())
        .ok_or(FetchError::MissingField {
            field: "instanceType",
        })?;
    let availability_zone =
        price
            .availability_zone()
            .map(str::to_owned)
            .ok_or(FetchError::MissingField {
                field: "availabilityZone",
            })?;
    let product_description = price
        .product_description()
        .map(|p| p.as_str().to_owned())
        .ok_or(FetchError::MissingField {
            field: "productDescription",
        })?;
    let spot_price = price
        .spot_price()
        .map(str::to_owned)
        .ok_or(FetchError::MissingField { field: "spotPrice" })?;
    let aws_timestamp = price
        .timestamp()
        .ok_or(FetchError::MissingField { field: "timestamp" })?;
    let timestamp =
        DateTime::<Utc>::from_timestamp(aws_timestamp.secs(), aws_timestamp.subsec_nanos())
            .ok_or(FetchError::InvalidTimestamp(aws_timestamp.secs()))?;

    Ok(SpotPriceObservation {
        instance_type,
        availability_zone,
        product_description,
        spot_price,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{InstanceType, RiProductDescription};

    fn sample_price() -> SpotPrice {
        SpotPrice::builder()
            .instance_type(InstanceType::from("m5.large"))
            .availability_zone("us-east-1a")
            .product_description(RiProductDescription::from("Linux/UNIX (Amazon VPC)"))
            .spot_price("0.0321")
            .timestamp(AwsDateTime::from_secs(1_704_067_230))
            .build()
    }

    #[test]
    fn maps_a_complete_api_entry() {
        let observation = into_observation(sample_price()).unwrap();

        assert_eq!(observation.instance_type, "m5.large");
        assert_eq!(observation.availability_zone, "us-east-1a");
        assert_eq!(observation.product_description, "Linux/UNIX (Amazon VPC)");
        assert_eq!(observation.spot_price, "0.0321");
        assert_eq!(observation.timestamp.timestamp(), 1_704_067_230);
    }

    #[test]
    fn missing_fields_are_fetch_errors() {
        let price = SpotPrice::builder()
            .availability_zone("us-east-1a")
            .spot_price("0.0321")
            .build();

        let err = into_observation(price).unwrap_err();
        assert!(matches!(
            err,
            FetchError::MissingField {
                field: "instanceType"
            }
        ));
    }

    #[test]
    fn window_covers_the_requested_interval() {
        let window = PriceWindow::ending_now(5);
        assert_eq!(window.end - window.start, ChronoDuration::minutes(5));
        assert!(window.end <= Utc::now());
    }
}
