//! git-mirror - Mirror a Git Repository Between Hosts
//!
//! git-mirror clones a source repository as a bare mirror, drops pull and merge
//! request refs that destinations usually reject, and pushes the result to a
//! destination repository. It is built to run as a single build-pipeline step.
//!
//! ## Modules
//!
//! - [`config`]: Task inputs and the validated [`MirrorConfig`]
//! - [`uri`]: URI validation, clone directory naming, credential injection
//! - [`git`]: The git process seam and argument builders
//! - [`packed_refs`]: Review ref removal from `packed-refs`
//! - [`task`]: The clone → filter → push state machine
//! - [`host`]: Reporting results to the pipeline host
//! - [`health`]: Preflight diagnostics

pub mod config;
pub mod error;
pub mod git;
pub mod health;
pub mod host;
pub mod packed_refs;
pub mod task;
pub mod uri;

pub use config::{MirrorConfig, MirrorSettings};
pub use error::{ErrorKind, InvalidUriError, MirrorError};
pub use git::{GitRunner, SystemGit};
pub use health::HealthCheck;
pub use host::HostReporter;
pub use task::{MirrorTask, TaskState};
