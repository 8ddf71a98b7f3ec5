//! Orchestrator configuration: the pipeline tuning knobs from
//! `watchtower_types::Config` plus the filesystem layout spec.md §6
//! names (DB file, transparency log directory, keypair file).

use crate::error::OrchestratorResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use watchtower_types::Config as PipelineConfig;

fn default_db_path() -> PathBuf {
    PathBuf::from("watchtower.db")
}
fn default_translog_dir() -> PathBuf {
    PathBuf::from("transparency-log")
}
fn default_keypair_path() -> PathBuf {
    PathBuf::from("watchtower-keypair.json")
}
fn default_tick_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(flatten)]
    pub pipeline: PipelineConfig,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_translog_dir")]
    pub translog_dir: PathBuf,
    #[serde(default = "default_keypair_path")]
    pub keypair_path: PathBuf,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

/// Loads configuration from `path` (TOML), overridden by `WATCHTOWER_`-
/// prefixed environment variables, matching the layered approach the rest
/// of this codebase uses for service configuration.
pub fn load_config(path: &std::path::Path) -> OrchestratorResult<OrchestratorConfig> {
    let _ = dotenvy::dotenv();

    let built = config::Config::builder()
        .add_source(config::File::from(path.to_path_buf()).required(true))
        .add_source(config::Environment::with_prefix("WATCHTOWER").separator("__").try_parsing(true))
        .build()?;

    Ok(built.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_required_fields_and_applies_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, r#"chain_id = 1
registry_address = "0xabc"
start_block = 1000"#)
        .unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.pipeline.chain_id, 1);
        assert_eq!(cfg.pipeline.batch_size, 10_000);
        assert_eq!(cfg.tick_interval_secs, 60);
        assert_eq!(cfg.db_path, PathBuf::from("watchtower.db"));
    }
}
