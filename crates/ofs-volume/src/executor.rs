//! Mount and unmount side effects.
//!
//! The coordinator never touches the mount table itself. It asks a
//! [`MountExecutor`] to do it, which in production runs the ObjectiveFS
//! mount helper and `umount`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::config::DriverConfig;

/// Error from running an external mount or unmount command.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The program ran and reported failure.
    #[error("{program}: {status}")]
    Failed {
        /// Program that failed.
        program: String,
        /// Exit status text, e.g. `exit status: 1`.
        status: String,
    },
}

/// Arguments for a single mount invocation.
#[derive(Debug, Clone, Copy)]
pub struct MountRequest<'a> {
    /// Comma-joined mount options, passed as one `-o<options>` token.
    pub options: &'a str,
    /// Backing filesystem.
    pub source: &'a str,
    /// Mountpoint.
    pub target: &'a Path,
    /// `KEY=VALUE` environment for the mount helper.
    pub env: &'a [String],
}

/// Performs physical mounts and unmounts.
#[async_trait]
pub trait MountExecutor: Send + Sync {
    /// Mount `request.source` at `request.target`.
    async fn mount(&self, request: &MountRequest<'_>) -> Result<(), ExecError>;

    /// Unmount whatever is mounted at `target`.
    async fn unmount(&self, target: &Path) -> Result<(), ExecError>;
}

/// Runs the mount helper and unmount program as child processes.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    mount_program: PathBuf,
    unmount_program: PathBuf,
}

impl CommandExecutor {
    /// Create an executor for the given programs.
    pub fn new(mount_program: impl Into<PathBuf>, unmount_program: impl Into<PathBuf>) -> Self {
        Self {
            mount_program: mount_program.into(),
            unmount_program: unmount_program.into(),
        }
    }

    /// Create an executor from driver configuration.
    #[must_use]
    pub fn from_config(config: &DriverConfig) -> Self {
        Self::new(&config.mount_program, &config.unmount_program)
    }

    /// Build the mount command without running it.
    #[must_use]
    pub fn mount_command(&self, request: &MountRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.mount_program);
        cmd.arg(format!("-o{}", request.options))
            .arg(request.source)
            .arg(request.target);

        // An empty list keeps the inherited environment.
        if !request.env.is_empty() {
            cmd.env_clear();
            for entry in request.env {
                let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
                cmd.env(key, value);
            }
        }
        cmd
    }

    /// Build the unmount command without running it.
    #[must_use]
    pub fn unmount_command(&self, target: &Path) -> Command {
        let mut cmd = Command::new(&self.unmount_program);
        cmd.arg(target);
        cmd
    }
}

#[async_trait]
impl MountExecutor for CommandExecutor {
    async fn mount(&self, request: &MountRequest<'_>) -> Result<(), ExecError> {
        let cmd = self.mount_command(request);
        tracing::debug!(
            command = %CommandLine::mount(&self.mount_program, request),
            env = ?env_keys(request.env),
            "Running mount helper"
        );
        run(cmd, &self.mount_program).await
    }

    async fn unmount(&self, target: &Path) -> Result<(), ExecError> {
        let cmd = self.unmount_command(target);
        tracing::debug!(
            command = %CommandLine::unmount(&self.unmount_program, target),
            "Running unmount"
        );
        run(cmd, &self.unmount_program).await
    }
}

/// Program and arguments of a command, for logging.
///
/// The environment is left out: mount helper variables carry credentials.
struct CommandLine<'a> {
    program: &'a Path,
    args: Vec<String>,
}

impl<'a> CommandLine<'a> {
    fn mount(program: &'a Path, request: &MountRequest<'_>) -> Self {
        Self {
            program,
            args: vec![
                format!("-o{}", request.options),
                request.source.to_string(),
                request.target.display().to_string(),
            ],
        }
    }

    fn unmount(program: &'a Path, target: &Path) -> Self {
        Self {
            program,
            args: vec![target.display().to_string()],
        }
    }
}

impl fmt::Display for CommandLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Variable names of `KEY=VALUE` entries.
fn env_keys(env: &[String]) -> Vec<&str> {
    env.iter()
        .map(|entry| entry.split_once('=').map_or(entry.as_str(), |(key, _)| key))
        .collect()
}

async fn run(mut cmd: Command, program: &Path) -> Result<(), ExecError> {
    let status = cmd.status().await.map_err(|source| ExecError::Spawn {
        program: program.display().to_string(),
        source,
    })?;
    check_status(status, program)
}

fn check_status(status: ExitStatus, program: &Path) -> Result<(), ExecError> {
    if status.success() {
        return Ok(());
    }
    Err(ExecError::Failed {
        program: program.display().to_string(),
        status: status.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn request<'a>(target: &'a Path, env: &'a [String]) -> MountRequest<'a> {
        MountRequest {
            options: "auto,listcache",
            source: "s3://bucket/data",
            target,
            env,
        }
    }

    #[test]
    fn mount_command_arguments() {
        let executor = CommandExecutor::new("/sbin/mount.objectivefs", "umount");
        let target = Path::new("/var/lib/docker-volumes/objectivefs/data");
        let cmd = executor.mount_command(&request(target, &[]));
        let std_cmd = cmd.as_std();

        assert_eq!(std_cmd.get_program(), OsStr::new("/sbin/mount.objectivefs"));
        let args: Vec<_> = std_cmd.get_args().collect();
        assert_eq!(
            args,
            vec![
                OsStr::new("-oauto,listcache"),
                OsStr::new("s3://bucket/data"),
                target.as_os_str(),
            ]
        );
        assert_eq!(std_cmd.get_envs().count(), 0);
    }

    #[test]
    fn mount_command_environment() {
        let executor = CommandExecutor::new("/sbin/mount.objectivefs", "umount");
        let env = vec![
            "OBJECTIVEFS_PASSPHRASE=secret".to_string(),
            "EMPTY=".to_string(),
        ];
        let cmd = executor.mount_command(&request(Path::new("/m"), &env));
        let envs: Vec<_> = cmd.as_std().get_envs().collect();

        assert!(envs.contains(&(OsStr::new("OBJECTIVEFS_PASSPHRASE"), Some(OsStr::new("secret")))));
        assert!(envs.contains(&(OsStr::new("EMPTY"), Some(OsStr::new("")))));
    }

    #[test]
    fn logged_mount_command_hides_environment_values() {
        let program = Path::new("/sbin/mount.objectivefs");
        let env = vec![
            "OBJECTIVEFS_PASSPHRASE=hunter2".to_string(),
            "AWS_SECRET_ACCESS_KEY=abc/def".to_string(),
        ];
        let req = request(Path::new("/m"), &env);

        let line = CommandLine::mount(program, &req).to_string();
        assert_eq!(line, "/sbin/mount.objectivefs -oauto,listcache s3://bucket/data /m");

        let keys = env_keys(&env);
        assert_eq!(keys, vec!["OBJECTIVEFS_PASSPHRASE", "AWS_SECRET_ACCESS_KEY"]);
        let logged = format!("{line} {keys:?}");
        assert!(!logged.contains("hunter2"));
        assert!(!logged.contains("abc/def"));
    }

    #[test]
    fn unmount_command_arguments() {
        let executor = CommandExecutor::new("/sbin/mount.objectivefs", "umount");
        let cmd = executor.unmount_command(Path::new("/m/data"));
        let args: Vec<_> = cmd.as_std().get_args().collect();
        assert_eq!(cmd.as_std().get_program(), OsStr::new("umount"));
        assert_eq!(args, vec![OsStr::new("/m/data")]);
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let executor = CommandExecutor::new("/nonexistent/mount.helper", "/nonexistent/umount");
        let err = executor.unmount(Path::new("/m")).await.unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_program_reports_status() {
        let executor = CommandExecutor::new("false", "false");
        let err = executor.unmount(Path::new("/m")).await.unwrap_err();
        match err {
            ExecError::Failed { program, status } => {
                assert_eq!(program, "false");
                assert!(status.contains('1'));
            }
            other @ ExecError::Spawn { .. } => panic!("unexpected error: {other}"),
        }
    }
}
