//! ltip-preview: print the vesting schedule described by a YAML request.
//!
//! Usage: `ltip-preview <request.yaml>`
//!
//! ```yaml
//! total_shares: 50000
//! vesting_start_date: 2024-01-01
//! plan:
//!   kind: frequency
//!   total_duration_months: 48
//!   cliff_months: 12
//!   cliff_percentage: 25
//!   frequency: monthly
//! ```
//!
//! The computed schedule is written to stdout as JSON; logs go to stderr.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};

use ltip_vesting::calculator::VestingPlan;
use ltip_vesting::config::{Config, StorageType};
use ltip_vesting::utils::bootstrap::{build_service, init_tracing};

#[derive(Debug, Deserialize)]
struct PreviewRequest {
    total_shares: u64,
    vesting_start_date: NaiveDate,
    plan: VestingPlan,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let request_path = std::env::args()
        .nth(1)
        .ok_or("usage: ltip-preview <request.yaml>")?;

    let mut config = Config::load(None).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    // Previews never persist.
    config.storage.storage_type = StorageType::Memory;

    let service = build_service(&config).await?;

    let raw = tokio::fs::read_to_string(&request_path).await?;
    let request: PreviewRequest = serde_yaml::from_str(&raw)?;
    info!(
        path = %request_path,
        total_shares = request.total_shares,
        start = %request.vesting_start_date,
        "Computing vesting preview"
    );

    let schedule = service
        .preview(request.total_shares, request.vesting_start_date, &request.plan)
        .map_err(|e| {
            error!(error = %e, "Preview rejected");
            e
        })?;

    println!("{}", serde_json::to_string_pretty(&schedule)?);
    Ok(())
}
