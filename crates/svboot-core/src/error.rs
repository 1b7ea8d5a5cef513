// ABOUTME: Error taxonomy for the bootstrap pipeline using thiserror.
// ABOUTME: One error type per stage, aggregated into BootstrapError with exit codes.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for configuration (environment) failures.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for workspace preparation failures.
pub const EXIT_WORKSPACE: i32 = 3;
/// Exit code for render failures.
pub const EXIT_RENDER: i32 = 4;
/// Exit code for supervisor launch failures.
pub const EXIT_LAUNCH: i32 = 5;

/// Errors resolving the launcher configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    /// A variable holds a value outside its accepted set.
    #[error("invalid value {value:?} for {key}: {message}")]
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },

    /// The mode file exists but could not be read.
    #[error("failed to read mode file {path}: {source}")]
    ReadModeFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which filesystem operation failed while resetting a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    Inspect,
    Remove,
    Create,
}

impl std::fmt::Display for FsOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FsOp::Inspect => "inspect",
            FsOp::Remove => "remove",
            FsOp::Create => "create",
        };
        f.write_str(s)
    }
}

/// Failure while deleting or recreating the runtime workspace.
#[derive(Error, Debug)]
#[error("failed to {op} {path}: {source}")]
pub struct FilesystemError {
    pub op: FsOp,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Errors producing the supervisor configuration file.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The requested operational mode is not one of the supported modes.
    #[error("unsupported operational mode {0:?} (expected one of: none, region, rack, region+rack, all)")]
    InvalidMode(String),

    /// The directory holding the config file could not be created.
    #[error("failed to create config directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or publishing the config file failed.
    #[error("failed to write config to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors handing control over to the supervisor binary.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The supervisor binary does not exist.
    #[error("supervisor binary {0} does not exist")]
    BinaryMissing(PathBuf),

    /// The supervisor binary exists but is not an executable file.
    #[error("supervisor binary {0} is not an executable file")]
    NotExecutable(PathBuf),

    /// The combined output log could not be opened.
    #[error("failed to open supervisor log {path}: {source}")]
    OpenLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process image replacement itself failed.
    #[error("failed to exec {path}: {source}")]
    Exec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any failure of the bootstrap pipeline, tagged by stage.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl BootstrapError {
    /// Process exit code distinguishing the failing stage.
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapError::Config(_) => EXIT_CONFIG,
            BootstrapError::Filesystem(_) => EXIT_WORKSPACE,
            BootstrapError::Render(_) => EXIT_RENDER,
            BootstrapError::Launch(_) => EXIT_LAUNCH,
        }
    }

    /// Short stage name used in diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            BootstrapError::Config(_) => "config",
            BootstrapError::Filesystem(_) => "workspace",
            BootstrapError::Render(_) => "render",
            BootstrapError::Launch(_) => "launch",
        }
    }
}

/// Result type alias using BootstrapError.
pub type Result<T> = std::result::Result<T, BootstrapError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exit_codes_are_distinct_per_stage() {
        let errors: Vec<BootstrapError> = vec![
            ConfigError::MissingVar("SVBOOT_ROOT").into(),
            FilesystemError {
                op: FsOp::Create,
                path: PathBuf::from("/run/metrics"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            }
            .into(),
            RenderError::InvalidMode("bogus".to_string()).into(),
            LaunchError::BinaryMissing(PathBuf::from("/nope")).into(),
        ];

        let codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        assert_eq!(codes, vec![EXIT_CONFIG, EXIT_WORKSPACE, EXIT_RENDER, EXIT_LAUNCH]);
        assert!(codes.iter().all(|c| *c != 0));
    }

    #[test]
    fn test_filesystem_error_display() {
        let err = FilesystemError {
            op: FsOp::Remove,
            path: PathBuf::from("/run/metrics"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };
        let display = err.to_string();
        assert!(display.contains("failed to remove"));
        assert!(display.contains("/run/metrics"));
        assert!(display.contains("access denied"));
    }

    #[test]
    fn test_invalid_mode_display() {
        let err = RenderError::InvalidMode("bogus".to_string());
        let display = err.to_string();
        assert!(display.contains("unsupported operational mode"));
        assert!(display.contains("bogus"));
    }

    #[test]
    fn test_launch_error_display() {
        let err = LaunchError::NotExecutable(PathBuf::from("/opt/bin/supervisord"));
        assert!(err.to_string().contains("not an executable"));
        assert!(err.to_string().contains("/opt/bin/supervisord"));
    }

    #[test]
    fn test_transparent_display_and_stage() {
        let err: BootstrapError = ConfigError::MissingVar("SVBOOT_LOG").into();
        assert_eq!(err.to_string(), "required environment variable SVBOOT_LOG is not set");
        assert_eq!(err.stage(), "config");
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let err = LaunchError::Exec {
            path: PathBuf::from("/opt/bin/supervisord"),
            source: io::Error::new(io::ErrorKind::Other, "exec format error"),
        };
        assert!(err.source().is_some());
        assert!(LaunchError::BinaryMissing(PathBuf::from("/x")).source().is_none());
    }
}
