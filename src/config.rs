use std::path::PathBuf;

use serde::Deserialize;
use snafu::ResultExt;

use crate::error::{ApplicationError, ConfigLoadSnafu};

const PREFIX: &str = "TRACKER_";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Wire snapshot to ingest on startup.
    pub snapshot: PathBuf,
    /// How many places the "most" charts show.
    #[serde(default = "default_top_places")]
    pub top_places: usize,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_top_places() -> usize {
    5
}

pub fn load() -> Result<Config, ApplicationError> {
    envy::prefixed(PREFIX)
        .from_env::<Config>()
        .context(ConfigLoadSnafu)
}
