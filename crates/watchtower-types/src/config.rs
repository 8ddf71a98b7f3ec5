//! Configuration recognized by the core pipeline (spec.md §6).

use serde::{Deserialize, Serialize};

fn default_batch_size() -> u32 {
    10_000
}
fn default_confirmations() -> u32 {
    12
}
fn default_overlap_blocks() -> u32 {
    50
}
fn default_fetch_timeout_ms() -> u32 {
    5_000
}
fn default_max_card_bytes() -> u32 {
    2_097_152
}
fn default_max_redirects() -> u32 {
    3
}
fn default_churn_window_seconds() -> u32 {
    604_800
}
fn default_churn_threshold() -> u32 {
    3
}
fn default_newborn_age_seconds() -> u32 {
    1_209_600
}
fn default_scoring_snapshot_window() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub chain_id: u32,
    pub registry_address: String,
    pub start_block: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_confirmations")]
    pub confirmations: u32,
    #[serde(default = "default_overlap_blocks")]
    pub overlap_blocks: u32,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u32,
    #[serde(default = "default_max_card_bytes")]
    pub max_card_bytes: u32,
    #[serde(default)]
    pub allow_http: bool,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    #[serde(default = "default_churn_window_seconds")]
    pub churn_window_seconds: u32,
    #[serde(default = "default_churn_threshold")]
    pub churn_threshold: u32,
    #[serde(default = "default_newborn_age_seconds")]
    pub newborn_age_seconds: u32,

    /// Open Question (b): deactivation of superseded alerts is opt-in.
    #[serde(default)]
    pub alerts_auto_deactivate: bool,

    /// How many of an agent's most recent behavioral snapshots feed
    /// scoring (spec.md §4.7's "latest-N snapshots").
    #[serde(default = "default_scoring_snapshot_window")]
    pub scoring_snapshot_window: u32,
}
