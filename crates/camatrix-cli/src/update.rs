//! Best-effort update check.
//!
//! Fetches the published latest-version descriptor and logs a hint when
//! this build is behind. Never fatal: any failure, including no network at
//! all, is silently ignored.

use std::time::Duration;

use serde::Deserialize;
use tracing::info;

/// Version of this build.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const LATEST_VERSION_URL: &str =
    "https://raw.githubusercontent.com/camatrix/camatrix/main/assets/latestVersion.json";

#[derive(Debug, Deserialize)]
struct LatestVersion {
    #[serde(rename = "latestVersion")]
    latest_version: String,
}

/// Logs an update hint when a newer release is published.
pub async fn check_for_update(http: &reqwest::Client) {
    if let Some(latest) = fetch_latest(http).await {
        if latest != CURRENT_VERSION {
            info!(
                current = CURRENT_VERSION,
                latest = %latest,
                "update available"
            );
        }
    }
}

async fn fetch_latest(http: &reqwest::Client) -> Option<String> {
    let response = http
        .get(LATEST_VERSION_URL)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .ok()?;
    let latest: LatestVersion = response.json().await.ok()?;
    Some(latest.latest_version)
}
