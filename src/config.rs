//! Persistent application settings.
//!
//! Settings live in a TOML file under the `.matchmill` application root.
//! Loading is lenient (a missing file yields defaults) and saving is atomic
//! so a crash mid-write cannot leave a truncated config behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::instrument::FailurePolicy;

/// Name of the settings file inside the application root.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable that overrides the scan worker count when the
/// configured value is `0` (auto).
pub const SCAN_WORKERS_ENV: &str = "MATCHMILL_SCAN_WORKERS";

pub(crate) const MAX_SCAN_WORKER_COUNT: u32 = 64;

fn default_worker_count() -> u32 {
    0
}

fn clamp_worker_count(value: u32) -> u32 {
    value.min(MAX_SCAN_WORKER_COUNT)
}

/// App settings that belong in the TOML config file.
///
/// Config tables: `scan`, `instrumentation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub instrumentation: InstrumentationSettings,
}

impl AppSettings {
    pub(crate) fn normalized(mut self) -> Self {
        self.scan.worker_count = clamp_worker_count(self.scan.worker_count);
        self
    }
}

/// Preferences for directory scans.
///
/// Config keys: `worker_count`, `max_file_size_bytes`, `timeout_seconds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Scan worker count override (0 = auto).
    #[serde(default = "default_worker_count")]
    pub worker_count: u32,
    /// Skip files larger than this many bytes.
    #[serde(default)]
    pub max_file_size_bytes: Option<u64>,
    /// Abort a scan once this many seconds have elapsed.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl ScanSettings {
    /// Resolve the worker count to use for a scan.
    ///
    /// Order of precedence: explicit config value, then the
    /// `MATCHMILL_SCAN_WORKERS` environment variable, then the number of
    /// available CPUs. Always at least one.
    pub fn effective_worker_count(&self) -> usize {
        if self.worker_count > 0 {
            return self.worker_count as usize;
        }
        if let Ok(value) = std::env::var(SCAN_WORKERS_ENV) {
            if let Ok(parsed) = value.trim().parse::<u32>() {
                if parsed > 0 {
                    return clamp_worker_count(parsed) as usize;
                }
            }
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(MAX_SCAN_WORKER_COUNT as usize)
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            max_file_size_bytes: None,
            timeout_seconds: None,
        }
    }
}

/// Preferences for the instrumentation wrapper.
///
/// Config keys: `failure_policy`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentationSettings {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// Errors that may occur while loading or saving app configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("No suitable config directory found")]
    NoConfigDir,
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load settings from disk, returning defaults if the file is missing.
pub fn load_or_default() -> Result<AppSettings, ConfigError> {
    let path = config_path()?;
    load_settings_from(&path)
}

/// Load settings from a specific path, returning defaults if missing.
pub fn load_settings_from(path: &Path) -> Result<AppSettings, ConfigError> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<AppSettings>(&text)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
        .map(AppSettings::normalized)
}

/// Persist settings to the default location, overwriting previous contents.
pub fn save(settings: &AppSettings) -> Result<(), ConfigError> {
    let path = config_path()?;
    save_settings_to_path(settings, &path)
}

/// Write the TOML settings file atomically to prevent partial writes on crash.
pub fn save_settings_to_path(settings: &AppSettings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, data.as_bytes())
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    use rand::TryRngCore;
    let write_error = |path: &Path, source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().ok_or_else(|| {
        write_error(
            path,
            std::io::Error::other("config path has no parent directory"),
        )
    })?;
    let file_name = path.file_name().ok_or_else(|| {
        write_error(path, std::io::Error::other("config path has no file name"))
    })?;

    let mut last_err = None;
    for _ in 0..4 {
        let mut bytes = [0u8; 6];
        rand::rngs::OsRng.try_fill_bytes(&mut bytes).map_err(|source| {
            write_error(
                path,
                std::io::Error::other(format!(
                    "failed to generate temporary file suffix: {source}"
                )),
            )
        })?;
        let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let tmp_path = dir.join(format!("{}.tmp-{suffix}", file_name.to_string_lossy()));

        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                last_err = Some(err);
                continue;
            }
            Err(err) => return Err(write_error(&tmp_path, err)),
        };

        let result = file.write_all(data).and_then(|()| file.sync_all());
        if let Err(err) = result {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(write_error(&tmp_path, err));
        }
        drop(file);
        if let Err(err) = replace_file(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(write_error(path, err));
        }
        sync_parent_dir(dir)?;
        return Ok(());
    }

    Err(write_error(
        path,
        std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!(
                "failed to create temporary file for {}: {}",
                path.display(),
                last_err
                    .as_ref()
                    .map(|err| err.to_string())
                    .unwrap_or_else(|| "unknown error".into())
            ),
        ),
    ))
}

fn replace_file(temp_path: &Path, path: &Path) -> Result<(), std::io::Error> {
    match std::fs::rename(temp_path, path) {
        Ok(()) => Ok(()),
        Err(err) => {
            #[cfg(target_os = "windows")]
            if err.kind() == std::io::ErrorKind::AlreadyExists
                || err.kind() == std::io::ErrorKind::PermissionDenied
            {
                if let Err(inner) = std::fs::remove_file(path) {
                    if inner.kind() != std::io::ErrorKind::NotFound {
                        return Err(inner);
                    }
                }
                std::fs::rename(temp_path, path)?;
                return Ok(());
            }
            Err(err)
        }
    }
}

fn sync_parent_dir(dir: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        let handle = std::fs::File::open(dir).map_err(|source| ConfigError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        handle.sync_all().map_err(|source| ConfigError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
    }
    Ok(())
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => ConfigError::CreateDir { path, source },
    }
}
