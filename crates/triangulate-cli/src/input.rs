//! Reading arbitration input from files or stdin

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use triangulation::ensemble::TopicSummaries;

/// Summaries for every topic of one race, already collected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceBundle {
    pub race_id: String,
    #[serde(default)]
    pub topics: Vec<TopicSummaries>,
}

/// Read JSON from a path, or from stdin when the path is `-`
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read input from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()))?
    };

    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON input in {}", path.display()))
}
