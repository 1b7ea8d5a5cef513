// ABOUTME: Launcher configuration resolved from environment variables.
// ABOUTME: EnvProvider abstracts env access so tests can inject fixed values.

use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ENV_ROOT: &str = "SVBOOT_ROOT";
pub const ENV_DATA: &str = "SVBOOT_DATA";
pub const ENV_METRICS_DIR: &str = "SVBOOT_METRICS_DIR";
pub const ENV_LOG: &str = "SVBOOT_LOG";
pub const ENV_MODE: &str = "SVBOOT_MODE";
pub const ENV_LOG_MODE: &str = "SVBOOT_LOG_MODE";
pub const ENV_SUPERVISOR_BIN: &str = "SVBOOT_SUPERVISOR_BIN";

/// Source of environment variables.
pub trait EnvProvider {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed set of variables, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MapEnv(BTreeMap<String, String>);

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    #[cfg(test)]
    pub fn remove(&mut self, key: &str) {
        self.0.remove(key);
    }
}

impl EnvProvider for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// How the supervisor's combined output log is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogMode {
    #[default]
    Truncate,
    Append,
}

/// Where the operational mode comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSource {
    /// Explicit value from SVBOOT_MODE.
    Env(String),
    /// Contents of `<data>/mode`.
    File { path: PathBuf, value: String },
    /// Nothing configured.
    Default,
}

impl ModeSource {
    /// Raw mode string to validate at render time.
    pub fn raw(&self) -> &str {
        match self {
            ModeSource::Env(v) => v,
            ModeSource::File { value, .. } => value,
            ModeSource::Default => "none",
        }
    }
}

/// Fully resolved launcher configuration.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Installation root (read-only tree with bin/).
    pub root: PathBuf,
    /// Mutable data root.
    pub data: PathBuf,
    /// Shared metrics directory, recreated on every launch.
    pub metrics_dir: PathBuf,
    /// Combined stdout/stderr log for the supervisor.
    pub log_path: PathBuf,
    pub log_mode: LogMode,
    pub mode: ModeSource,
    pub supervisor_bin: PathBuf,
}

impl LauncherConfig {
    /// Resolve every variable, failing on the first missing or invalid one.
    pub fn from_env(env: &dyn EnvProvider) -> Result<Self, ConfigError> {
        let root = required_path(env, ENV_ROOT)?;
        let data = required_path(env, ENV_DATA)?;
        let metrics_dir = required_path(env, ENV_METRICS_DIR)?;
        let log_path = required_path(env, ENV_LOG)?;

        let log_mode = match optional(env, ENV_LOG_MODE)
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("truncate") => LogMode::Truncate,
            Some("append") => LogMode::Append,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_MODE,
                    value: other.to_string(),
                    message: "expected \"truncate\" or \"append\"".to_string(),
                })
            }
        };

        let mode = match optional(env, ENV_MODE) {
            Some(value) => ModeSource::Env(value),
            None => read_mode_file(&data.join("mode"))?,
        };

        let supervisor_bin = optional(env, ENV_SUPERVISOR_BIN)
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("bin").join("supervisord"));

        check_metrics_dir(&metrics_dir, &root, ENV_ROOT)?;
        check_metrics_dir(&metrics_dir, &data, ENV_DATA)?;
        if let Some(log_dir) = log_path.parent() {
            check_metrics_dir(&metrics_dir, log_dir, ENV_LOG)?;
        }
        if let Some(bin_dir) = supervisor_bin.parent() {
            check_metrics_dir(&metrics_dir, bin_dir, ENV_SUPERVISOR_BIN)?;
        }

        Ok(Self {
            root,
            data,
            metrics_dir,
            log_path,
            log_mode,
            mode,
            supervisor_bin,
        })
    }

    /// Directory handed to the supervisor with `-d`.
    pub fn supervisor_dir(&self) -> PathBuf {
        self.data.join("supervisord")
    }

    /// Fixed location of the rendered config.
    pub fn config_path(&self) -> PathBuf {
        self.supervisor_dir().join("supervisord.conf")
    }
}

fn optional(env: &dyn EnvProvider, key: &str) -> Option<String> {
    env.var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_path(env: &dyn EnvProvider, key: &'static str) -> Result<PathBuf, ConfigError> {
    optional(env, key)
        .map(PathBuf::from)
        .ok_or(ConfigError::MissingVar(key))
}

// The metrics dir is wiped on every launch, so it must not contain any other configured path.
fn check_metrics_dir(metrics_dir: &Path, other: &Path, other_key: &str) -> Result<(), ConfigError> {
    if other.starts_with(metrics_dir) {
        return Err(ConfigError::InvalidValue {
            key: ENV_METRICS_DIR,
            value: metrics_dir.display().to_string(),
            message: format!(
                "must not be or contain the {other_key} path {}",
                other.display()
            ),
        });
    }
    Ok(())
}

fn read_mode_file(path: &Path) -> Result<ModeSource, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let value = content.trim().to_string();
            if value.is_empty() {
                Ok(ModeSource::Default)
            } else {
                Ok(ModeSource::File {
                    path: path.to_path_buf(),
                    value,
                })
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ModeSource::Default),
        Err(e) => Err(ConfigError::ReadModeFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
