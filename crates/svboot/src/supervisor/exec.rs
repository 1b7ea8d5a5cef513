// ABOUTME: Replaces the launcher process image with the supervisor binary.
// ABOUTME: Validates the binary, redirects stdout/stderr to the log, then execs.

use std::convert::Infallible;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;
use svboot_core::{LaunchError, LogMode};

/// Everything needed to start the supervisor in the foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorCommand {
    pub binary: PathBuf,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    pub log_path: PathBuf,
    pub log_mode: LogMode,
}

impl SupervisorCommand {
    /// Arguments for a non-daemonizing supervisord run.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "-n".into(),
            "-d".into(),
            self.data_dir.clone().into_os_string(),
            "-c".into(),
            self.config_path.clone().into_os_string(),
        ]
    }

    /// Fail early if the binary is absent or cannot be executed.
    pub fn check_binary(&self) -> Result<(), LaunchError> {
        let meta = match std::fs::metadata(&self.binary) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LaunchError::BinaryMissing(self.binary.clone()))
            }
            Err(e) => {
                return Err(LaunchError::Exec {
                    path: self.binary.clone(),
                    source: e,
                })
            }
        };

        if !meta.is_file() || meta.permissions().mode() & 0o111 == 0 {
            return Err(LaunchError::NotExecutable(self.binary.clone()));
        }
        Ok(())
    }

    /// Open the combined output log, creating its directory if needed.
    pub fn open_log(&self) -> Result<File, LaunchError> {
        let err = |source: std::io::Error| LaunchError::OpenLog {
            path: self.log_path.clone(),
            source,
        };

        if let Some(parent) = self.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(err)?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true);
        match self.log_mode {
            LogMode::Append => options.append(true),
            LogMode::Truncate => options.write(true).truncate(true),
        };
        options.open(&self.log_path).map_err(err)
    }

    /// Replace the current process with the supervisor.
    ///
    /// Only returns on failure. Nothing after a successful call runs, so
    /// callers must finish their own cleanup first.
    pub fn exec(self) -> Result<Infallible, LaunchError> {
        self.check_binary()?;

        let stdout = self.open_log()?;
        let stderr = stdout.try_clone().map_err(|e| LaunchError::OpenLog {
            path: self.log_path.clone(),
            source: e,
        })?;

        tracing::info!(
            binary = %self.binary.display(),
            config = %self.config_path.display(),
            log = %self.log_path.display(),
            "Handing over to supervisor"
        );

        let source = Command::new(&self.binary)
            .args(self.args())
            .stdout(stdout)
            .stderr(stderr)
            .exec();

        Err(LaunchError::Exec {
            path: self.binary,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn command(dir: &Path, binary: PathBuf) -> SupervisorCommand {
        SupervisorCommand {
            binary,
            config_path: dir.join("supervisord/supervisord.conf"),
            data_dir: dir.join("supervisord"),
            log_path: dir.join("log/supervisor-run.log"),
            log_mode: LogMode::Truncate,
        }
    }

    fn write_script(path: &Path, mode: u32) {
        std::fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_args_run_in_foreground() {
        let cmd = command(Path::new("/var/lib/svboot"), PathBuf::from("/opt/bin/supervisord"));
        let args: Vec<String> = cmd
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-n",
                "-d",
                "/var/lib/svboot/supervisord",
                "-c",
                "/var/lib/svboot/supervisord/supervisord.conf",
            ]
        );
    }

    #[test]
    fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = command(dir.path(), dir.path().join("bin/supervisord"));

        let err = cmd.exec().unwrap_err();
        assert!(matches!(err, LaunchError::BinaryMissing(_)));
        // The log is only opened once the binary checks out.
        assert!(!dir.path().join("log/supervisor-run.log").exists());
    }

    #[test]
    fn test_non_executable_binary() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("supervisord");
        write_script(&bin, 0o644);

        let err = command(dir.path(), bin).check_binary().unwrap_err();
        assert!(matches!(err, LaunchError::NotExecutable(_)));
    }

    #[test]
    fn test_directory_is_not_executable() {
        let dir = tempfile::tempdir().unwrap();
        let err = command(dir.path(), dir.path().to_path_buf())
            .check_binary()
            .unwrap_err();
        assert!(matches!(err, LaunchError::NotExecutable(_)));
    }

    #[test]
    fn test_executable_binary_passes() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("supervisord");
        write_script(&bin, 0o755);
        command(dir.path(), bin).check_binary().unwrap();
    }

    #[test]
    fn test_open_log_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = command(dir.path(), PathBuf::from("/unused"));
        std::fs::create_dir_all(dir.path().join("log")).unwrap();
        std::fs::write(&cmd.log_path, "previous run\n").unwrap();

        drop(cmd.open_log().unwrap());
        assert_eq!(std::fs::read_to_string(&cmd.log_path).unwrap(), "");
    }

    #[test]
    fn test_open_log_appends() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let mut cmd = command(dir.path(), PathBuf::from("/unused"));
        cmd.log_mode = LogMode::Append;
        std::fs::create_dir_all(dir.path().join("log")).unwrap();
        std::fs::write(&cmd.log_path, "previous run\n").unwrap();

        let mut log = cmd.open_log().unwrap();
        log.write_all(b"next run\n").unwrap();
        drop(log);
        assert_eq!(
            std::fs::read_to_string(&cmd.log_path).unwrap(),
            "previous run\nnext run\n"
        );
    }

    #[test]
    fn test_open_log_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = command(dir.path(), PathBuf::from("/unused"));
        drop(cmd.open_log().unwrap());
        assert!(cmd.log_path.exists());
    }
}
