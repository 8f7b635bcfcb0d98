use crate::fetcher::AwsSettings;
use clap::Parser;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "lower")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Process-wide configuration, immutable after startup. Flags override the
/// ambient profile-derived AWS defaults.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Fetch EC2 spot price history and forward it to Graphite",
    long_about = None
)]
pub struct Config {
    /// AWS access key id, overriding ambient credentials
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub aws_access_key_id: Option<String>,

    /// AWS secret access key, overriding ambient credentials
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY")]
    pub aws_secret_access_key: Option<String>,

    /// Named AWS credential profile
    #[arg(long, env = "AWS_PROFILE", default_value = "default")]
    pub profile: String,

    /// AWS region (falls back to the ambient configured region)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Minutes of spot price history to pull, back from now
    #[arg(long, env = "INTERVAL_MINUTES", default_value = "1")]
    pub interval: u32,

    /// Comma-separated list of product descriptions to fetch
    #[arg(
        long,
        env = "PRODUCT_DESCRIPTIONS",
        default_value = "Linux/UNIX (Amazon VPC), Windows (Amazon VPC)"
    )]
    pub products: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "error")]
    pub log_level: LogLevel,

    /// Graphite host to send the metrics to
    #[arg(long, env = "GRAPHITE_HOST", default_value = "localhost")]
    pub graphite_host: String,

    /// Graphite pickle receiver port
    #[arg(long, env = "GRAPHITE_PORT", default_value = "2004")]
    pub graphite_port: u16,

    /// Prefix prepended to every metric path
    #[arg(long, env = "GRAPHITE_PREFIX", default_value = "aws.ec2.spot-price")]
    pub graphite_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aws_access_key_id: None,
            aws_secret_access_key: None,
            profile: "default".to_string(),
            region: None,
            interval: 1,
            products: "Linux/UNIX (Amazon VPC), Windows (Amazon VPC)".to_string(),
            log_level: LogLevel::Error,
            graphite_host: "localhost".to_string(),
            graphite_port: 2004,
            graphite_prefix: "aws.ec2.spot-price".to_string(),
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::parse_from(args);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval == 0 {
            return Err(ConfigError::InvalidConfig(
                "--interval must be at least 1 minute".to_string(),
            ));
        }
        if self.aws_access_key_id.is_some() != self.aws_secret_access_key.is_some() {
            return Err(ConfigError::InvalidConfig(
                "--aws-access-key-id and --aws-secret-access-key must be supplied together"
                    .to_string(),
            ));
        }
        if self.product_descriptions().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "--products must name at least one product description".to_string(),
            ));
        }
        Ok(())
    }

    /// The comma-separated `--products` value split into trimmed entries.
    pub fn product_descriptions(&self) -> Vec<String> {
        self.products
            .split(',')
            .map(str::trim)
            .filter(|product| !product.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn aws_settings(&self) -> AwsSettings {
        AwsSettings {
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
            profile: self.profile.clone(),
            region: self.region.clone(),
        }
    }
}
