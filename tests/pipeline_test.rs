use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use spot_price_forwarder::app::{Config, pipeline};
use spot_price_forwarder::domain::{PipelineError, SpotPriceObservation};
use spot_price_forwarder::fetcher::{FetchError, PriceHistorySource, PriceWindow};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

/// Canned source standing in for the EC2 API.
struct StaticSource {
    result: std::sync::Mutex<Option<Result<Vec<SpotPriceObservation>, FetchError>>>,
}

impl StaticSource {
    fn new(result: Result<Vec<SpotPriceObservation>, FetchError>) -> Self {
        Self {
            result: std::sync::Mutex::new(Some(result)),
        }
    }
}

#[async_trait]
impl PriceHistorySource for StaticSource {
    async fn fetch(&self, _window: PriceWindow) -> Result<Vec<SpotPriceObservation>, FetchError> {
        self.result
            .lock()
            .expect("source poisoned")
            .take()
            .expect("fetch called twice")
    }
}

fn observation(instance: &str, zone: &str, price: &str) -> SpotPriceObservation {
    SpotPriceObservation {
        instance_type: instance.to_string(),
        availability_zone: zone.to_string(),
        product_description: "Linux/UNIX (Amazon VPC)".to_string(),
        spot_price: price.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 30).unwrap(),
    }
}

async fn spawn_receiver() -> (u16, tokio::task::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.unwrap();
        received
    });
    (port, handle)
}

fn config_for(port: u16) -> Config {
    Config {
        graphite_host: "127.0.0.1".to_string(),
        graphite_port: port,
        ..Config::default()
    }
}

#[tokio::test]
async fn end_to_end_frame_reaches_the_receiver() -> Result<()> {
    let (port, receiver) = spawn_receiver().await;

    let source = StaticSource::new(Ok(vec![
        observation("m5.large", "us-east-1a", "0.0321"),
        observation("m5.large", "us-east-1b", "0.0335"),
        observation("c5.xlarge", "us-east-1a", "0.0712"),
    ]));

    let config = config_for(port);
    let summary = pipeline::run(&config, &source).await?;
    assert_eq!(summary.observations, 3);

    let received = receiver.await?;
    assert_eq!(received.len(), summary.bytes_sent);

    // Header length must match the pickle payload exactly.
    let header = u32::from_be_bytes(received[..4].try_into()?) as usize;
    assert_eq!(header, received.len() - 4);

    let decoded: Vec<(String, (i64, f64))> =
        serde_pickle::from_slice(&received[4..], serde_pickle::DeOptions::new())?;
    assert_eq!(decoded.len(), 3);
    assert_eq!(
        decoded[0].0,
        "aws.ec2.spot-price.linux_unix_amazon_vpc_.us-east-1a.m5.large"
    );
    assert_eq!(decoded[0].1, (1_704_067_230, 0.0321));
    assert_eq!(
        decoded[2].0,
        "aws.ec2.spot-price.linux_unix_amazon_vpc_.us-east-1a.c5.xlarge"
    );

    Ok(())
}

#[tokio::test]
async fn malformed_price_sends_zero_bytes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let source = StaticSource::new(Ok(vec![observation("m5.large", "us-east-1a", "N/A")]));

    let config = config_for(port);
    let err = pipeline::run(&config, &source).await.unwrap_err();
    assert!(matches!(err, PipelineError::Shape(_)), "{err}");

    let accepted =
        tokio::time::timeout(std::time::Duration::from_millis(100), listener.accept()).await;
    assert!(accepted.is_err(), "nothing should have been sent");
}

#[tokio::test]
async fn fetch_error_propagates_with_non_success() {
    let source = StaticSource::new(Err(FetchError::Auth(
        "AuthFailure: credentials rejected".to_string(),
    )));

    // Port doesn't matter, the pipeline must fail before the transport.
    let config = config_for(9);
    let err = pipeline::run(&config, &source).await.unwrap_err();
    assert!(matches!(err, PipelineError::Fetch(FetchError::Auth(_))), "{err}");
}

#[tokio::test]
async fn transport_failure_is_fatal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let source = StaticSource::new(Ok(vec![observation("m5.large", "us-east-1a", "0.0321")]));

    let config = config_for(port);
    let err = pipeline::run(&config, &source).await.unwrap_err();
    assert!(matches!(err, PipelineError::Transport(_)), "{err}");
}
