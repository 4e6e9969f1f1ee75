//! Mirror Task - clone, filter review refs, push
//!
//! The task runs three strictly sequential steps against a single clone
//! directory. Each step must finish before the next starts, and the first
//! failure ends the run.

use std::fmt;
use tracing::{debug, info};

use crate::config::MirrorConfig;
use crate::error::{ErrorKind, MirrorError, Phase};
use crate::git::{clone_mirror_args, push_mirror_args, GitRunner};
use crate::packed_refs::remove_review_refs;
use crate::uri::inject_credential;

/// Where a mirror run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Cloning,
    FilteringRefs,
    Pushing,
    Done,
    Failed(ErrorKind),
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Idle => f.write_str("idle"),
            TaskState::Cloning => f.write_str("cloning"),
            TaskState::FilteringRefs => f.write_str("filtering refs"),
            TaskState::Pushing => f.write_str("pushing"),
            TaskState::Done => f.write_str("done"),
            TaskState::Failed(kind) => write!(f, "failed ({:?})", kind),
        }
    }
}

/// One mirror run over an immutable configuration.
pub struct MirrorTask<G> {
    config: MirrorConfig,
    git: G,
    state: TaskState,
}

impl<G: GitRunner> MirrorTask<G> {
    pub fn new(config: MirrorConfig, git: G) -> Self {
        Self {
            config,
            git,
            state: TaskState::Idle,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Run clone, ref filtering and push in order.
    ///
    /// `Ok(())` means the destination now mirrors the source.
    pub async fn run(&mut self) -> Result<(), MirrorError> {
        let result = self.run_steps().await;

        match &result {
            Ok(()) => {
                self.transition(TaskState::Done);
                info!(
                    "Mirrored {} to {}",
                    self.config.source.uri, self.config.destination.uri
                );
            }
            Err(e) => {
                // reported once, by the caller
                self.transition(TaskState::Failed(e.kind()));
                debug!("Mirror failed: {}", e);
            }
        }

        result
    }

    async fn run_steps(&mut self) -> Result<(), MirrorError> {
        let git_path = self.git.resolve()?;
        debug!("Using git at {}", git_path.display());

        self.transition(TaskState::Cloning);
        self.clone_mirror().await?;

        self.transition(TaskState::FilteringRefs);
        remove_review_refs(&self.config.source.clone_directory).await?;

        self.transition(TaskState::Pushing);
        self.push_mirror().await
    }

    async fn clone_mirror(&self) -> Result<(), MirrorError> {
        let source = &self.config.source;
        info!(
            "Cloning {} into {}",
            source.uri,
            source.clone_directory.display()
        );

        let url = inject_credential(&source.uri, source.token.as_deref())?;
        let args = clone_mirror_args(source.verify_tls, &url, &source.clone_directory);

        let exit_code = self
            .git
            .exec(args)
            .await
            .map_err(|e| MirrorError::Invocation {
                phase: Phase::Clone,
                source: e,
            })?;

        if exit_code != 0 {
            return Err(MirrorError::CloneFailed { exit_code });
        }
        Ok(())
    }

    async fn push_mirror(&self) -> Result<(), MirrorError> {
        let destination = &self.config.destination;
        info!("Pushing mirror to {}", destination.uri);

        let url = inject_credential(&destination.uri, Some(&destination.token))?;
        let args = push_mirror_args(
            destination.verify_tls,
            &url,
            &self.config.source.clone_directory,
        );

        let exit_code = self
            .git
            .exec(args)
            .await
            .map_err(|e| MirrorError::Invocation {
                phase: Phase::Push,
                source: e,
            })?;

        if exit_code != 0 {
            return Err(MirrorError::PushFailed { exit_code });
        }
        Ok(())
    }

    fn transition(&mut self, next: TaskState) {
        debug!("Mirror task: {} -> {}", self.state, next);
        self.state = next;
    }
}
