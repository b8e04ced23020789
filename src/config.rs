//! Runtime configuration.
//!
//! One explicit struct constructed at process start and passed by reference
//! into the store and the orchestrator. No global state: tests inject temp
//! directories, embedders inject their own roots and quotas.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Default file count quota for the snapshot directory.
pub const DEFAULT_MAX_FILE_COUNT: usize = 10;

/// Default free-space floor: 1 GiB.
pub const DEFAULT_MIN_FREE_SPACE: u64 = 1024 * 1024 * 1024;

/// Default retention window for the maintenance sweep.
pub const DEFAULT_EXPIRED_AFTER: Duration = Duration::from_secs(5 * 24 * 60 * 60);

/// Default hard deadline handed to the heap inspector.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(600);

pub struct Config {
    /// Directory holding snapshot files. One per host process install.
    pub storage_root: PathBuf,
    /// Label embedded into snapshot filenames, typically the process name.
    pub process_label: String,
    pub max_file_count: usize,
    pub min_free_space: u64,
    pub expired_after: Duration,
    pub analysis_timeout: Duration,
}

/// On-disk config shape (~/.config/leakwarden/leakwarden.toml). Durations
/// are humantime strings ("5d", "600s"); absent fields keep defaults.
#[derive(Deserialize, Default)]
struct FileConfig {
    storage_root: Option<PathBuf>,
    process_label: Option<String>,
    max_file_count: Option<usize>,
    min_free_space_bytes: Option<u64>,
    expired_after: Option<String>,
    analysis_timeout: Option<String>,
}

impl Config {
    pub fn default() -> Self {
        Config {
            storage_root: default_storage_root(),
            process_label: default_process_label(),
            max_file_count: DEFAULT_MAX_FILE_COUNT,
            min_free_space: DEFAULT_MIN_FREE_SPACE,
            expired_after: DEFAULT_EXPIRED_AFTER,
            analysis_timeout: DEFAULT_ANALYSIS_TIMEOUT,
        }
    }

    /// Load config from an explicit file, or from the default location if it
    /// exists, or fall back to pure defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.is_file()),
        };

        let Some(path) = path else {
            return Ok(Config::default());
        };

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        let file: FileConfig = toml::from_str(&raw)
            .map_err(|e| format!("failed to parse {}: {e}", path.display()))?;

        Config::from_file(file)
    }

    fn from_file(file: FileConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = Config::default();

        if let Some(root) = file.storage_root {
            config.storage_root = root;
        }
        if let Some(label) = file.process_label {
            config.process_label = label;
        }
        if let Some(count) = file.max_file_count {
            config.max_file_count = count;
        }
        if let Some(bytes) = file.min_free_space_bytes {
            config.min_free_space = bytes;
        }
        if let Some(s) = file.expired_after {
            config.expired_after = humantime::parse_duration(&s)
                .map_err(|e| format!("invalid expired_after '{s}': {e}"))?;
        }
        if let Some(s) = file.analysis_timeout {
            config.analysis_timeout = humantime::parse_duration(&s)
                .map_err(|e| format!("invalid analysis_timeout '{s}': {e}"))?;
        }

        Ok(config)
    }
}

/// Platform cache directory (~/.cache/leakwarden/dumps or equivalent),
/// falling back to the system temp dir when no home is resolvable.
fn default_storage_root() -> PathBuf {
    directories::ProjectDirs::from("", "", "leakwarden")
        .map(|dirs| dirs.cache_dir().join("dumps"))
        .unwrap_or_else(|| std::env::temp_dir().join("leakwarden-dumps"))
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "leakwarden")
        .map(|dirs| dirs.config_dir().join("leakwarden.toml"))
}

fn default_process_label() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".to_string())
}
