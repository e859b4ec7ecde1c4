//! Bootstrap utilities for ltip binaries.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LOG_ENV_VAR};
use crate::services::VestingService;
use crate::storage::init_storage;

/// Initialize tracing with the LTIP_LOG environment variable.
///
/// Defaults to "info" level if LTIP_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Open the configured storage and wrap it in a vesting service.
pub async fn build_service(config: &Config) -> Result<VestingService, Box<dyn std::error::Error>> {
    let storage = init_storage(&config.storage).await?;
    info!(
        max_duration_months = config.vesting.max_duration_months,
        default_cliff_percentage = ?config.vesting.default_cliff_percentage,
        "Vesting service ready"
    );
    Ok(VestingService::new(storage, config.vesting.clone()))
}
