//! Test doubles.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::executor::{ExecError, MountExecutor, MountRequest};

/// A recorded executor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// A mount helper call.
    Mount {
        /// Comma-joined mount options.
        options: String,
        /// Backing filesystem.
        source: String,
        /// Mountpoint.
        target: PathBuf,
        /// `KEY=VALUE` environment.
        env: Vec<String>,
    },
    /// An unmount call.
    Unmount {
        /// Mountpoint.
        target: PathBuf,
    },
}

#[derive(Debug, Default)]
struct State {
    invocations: Vec<Invocation>,
    mount_failure: Option<String>,
    unmount_failure: Option<String>,
    delay: Option<Duration>,
}

/// [`MountExecutor`] that records calls instead of running programs.
///
/// Clones share state, so a test can hand one clone to the driver and keep
/// another to inspect calls or inject failures.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    state: Arc<Mutex<State>>,
}

impl RecordingExecutor {
    /// Create an executor where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call, to widen race windows.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state.lock().delay = Some(delay);
        self
    }

    /// Make subsequent mounts fail with `reason`.
    pub fn fail_mounts(&self, reason: &str) {
        self.state.lock().mount_failure = Some(reason.to_string());
    }

    /// Make subsequent mounts succeed.
    pub fn succeed_mounts(&self) {
        self.state.lock().mount_failure = None;
    }

    /// Make subsequent unmounts fail with `reason`.
    pub fn fail_unmounts(&self, reason: &str) {
        self.state.lock().unmount_failure = Some(reason.to_string());
    }

    /// Make subsequent unmounts succeed.
    pub fn succeed_unmounts(&self) {
        self.state.lock().unmount_failure = None;
    }

    /// Every call so far, in order. Failed calls are included.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().invocations.clone()
    }

    /// Number of mount calls so far.
    #[must_use]
    pub fn mount_count(&self) -> usize {
        self.count(|i| matches!(i, Invocation::Mount { .. }))
    }

    /// Number of unmount calls so far.
    #[must_use]
    pub fn unmount_count(&self) -> usize {
        self.count(|i| matches!(i, Invocation::Unmount { .. }))
    }

    fn count(&self, pred: impl Fn(&Invocation) -> bool) -> usize {
        self.state.lock().invocations.iter().filter(|i| pred(i)).count()
    }

    // The lock is released before sleeping so the future stays `Send`.
    fn record(&self, invocation: Invocation) -> (Option<Duration>, Option<String>) {
        let mut state = self.state.lock();
        let failure = match invocation {
            Invocation::Mount { .. } => state.mount_failure.clone(),
            Invocation::Unmount { .. } => state.unmount_failure.clone(),
        };
        state.invocations.push(invocation);
        (state.delay, failure)
    }
}

#[async_trait]
impl MountExecutor for RecordingExecutor {
    async fn mount(&self, request: &MountRequest<'_>) -> Result<(), ExecError> {
        let (delay, failure) = self.record(Invocation::Mount {
            options: request.options.to_string(),
            source: request.source.to_string(),
            target: request.target.to_path_buf(),
            env: request.env.to_vec(),
        });
        finish("mount", delay, failure).await
    }

    async fn unmount(&self, target: &Path) -> Result<(), ExecError> {
        let (delay, failure) = self.record(Invocation::Unmount {
            target: target.to_path_buf(),
        });
        finish("umount", delay, failure).await
    }
}

async fn finish(
    program: &str,
    delay: Option<Duration>,
    failure: Option<String>,
) -> Result<(), ExecError> {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    match failure {
        Some(status) => Err(ExecError::Failed {
            program: program.to_string(),
            status,
        }),
        None => Ok(()),
    }
}
