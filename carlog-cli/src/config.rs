use anyhow::{Context, Result};
use carlog::{AppSettings, TollRate, TollSchedule};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarlogConfig {
    /// Where the ledger file lives. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Quiet period after the last change before the ledger is written.
    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,

    /// Quiet period after the last keystroke before a search is applied (shell only).
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Fill an empty ledger with sample trips on first run.
    #[serde(default = "default_seed_sample_data")]
    pub seed_sample_data: bool,

    #[serde(default)]
    pub tolls: Vec<TollRate>,
}

fn default_page_size() -> usize {
    20
}

fn default_persist_debounce_ms() -> u64 {
    1000
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_seed_sample_data() -> bool {
    true
}

impl Default for CarlogConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            page_size: default_page_size(),
            persist_debounce_ms: default_persist_debounce_ms(),
            search_debounce_ms: default_search_debounce_ms(),
            seed_sample_data: default_seed_sample_data(),
            tolls: Vec::new(),
        }
    }
}

impl CarlogConfig {
    pub fn config_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Cannot determine config directory")?
            .join("carlog")
            .join("config.toml"))
    }

    /// Load config from disk. Returns default config if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::data_dir()
                .context("Cannot determine data directory")?
                .join("carlog")),
        }
    }

    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            page_size: self.page_size.max(1),
            persist_debounce: time::Duration::milliseconds(self.persist_debounce_ms as i64),
            search_debounce: time::Duration::milliseconds(self.search_debounce_ms as i64),
        }
    }

    pub fn toll_schedule(&self) -> TollSchedule {
        TollSchedule::new(self.tolls.clone())
    }
}
