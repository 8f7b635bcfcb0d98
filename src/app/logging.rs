use super::config::LogLevel;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directives quieting chatty upstream crates regardless of the configured
/// default level.
const DEFAULT_DIRECTIVES: &[&str] = &[
    "hyper=warn",
    "aws_config=warn",
    "aws_smithy_runtime=warn",
    "aws_sdk_ec2=warn",
];

/// Initialize the global tracing subscriber exactly once.
///
/// Safe to call repeatedly (tests do); later calls are no-ops. An invalid
/// filter falls back to plain ERROR so operator-critical failures are
/// always logged.
pub fn setup_logging(level: LogLevel) {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let mut filter = level.as_str().to_string();
        for directive in DEFAULT_DIRECTIVES {
            filter.push(',');
            filter.push_str(directive);
        }

        let env_filter = EnvFilter::try_new(&filter)
            .unwrap_or_else(|_| EnvFilter::new(LogLevel::Error.as_str()));

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).compact());

        // A subscriber may already be installed by a test harness.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
