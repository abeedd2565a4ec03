use config::{Config, ConfigError, Environment, File as ConfigFile};
use glob::Pattern;
use serde::Deserialize;
use std::path::Path;
use tracing::error;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Default scan root when the caller does not pass one.
    #[serde(default)]
    pub scan_root: Option<String>,
    /// Extraction pool size override. Defaults to available parallelism minus one.
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Glob patterns; matching paths are dropped from scanner groups.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("NEAR_DUPER")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Worker count for the extraction pool: one unit is left to the orchestrator.
pub fn extraction_workers(configured: Option<usize>) -> usize {
    if let Some(n) = configured {
        return n.max(1);
    }
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Compiled ignore patterns. Invalid globs are logged and skipped.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    pub fn new(globs: &[String]) -> Self {
        let patterns = globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches_path(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
