//! Common test utilities and helpers for git-mirror tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use git_mirror::config::{DestinationConfig, SourceConfig};
use git_mirror::{GitRunner, MirrorConfig, MirrorError};

pub const SHA: &str = "3f786850e387550fdab836ed7e6dc881de23001b";

/// Working area for one test run
pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn clone_directory(&self) -> PathBuf {
        self.path().join("vsts-mirror-git-repository.git")
    }

    /// Config mirroring between two https remotes, cloning into the temp dir
    pub fn config(&self) -> MirrorConfig {
        MirrorConfig {
            source: SourceConfig {
                uri: "https://github.com/swellaby/vsts-mirror-git-repository".to_string(),
                token: Some("source-pat".to_string()),
                clone_directory: self.clone_directory(),
                verify_tls: true,
            },
            destination: DestinationConfig {
                uri: "https://dev.azure.com/swellaby/_git/vsts-mirror-git-repository".to_string(),
                token: "destination-pat".to_string(),
                verify_tls: true,
            },
            git_executable: "git".to_string(),
        }
    }

    pub fn create_config_file(&self, content: &str) -> PathBuf {
        let config_path = self.path().join("config.yml");
        std::fs::write(&config_path, content).expect("Failed to write test config");
        config_path
    }
}

/// Packed-refs content as `git clone --mirror` leaves it for a GitHub source
pub fn github_packed_refs() -> String {
    format!(
        "# pack-refs with: peeled fully-peeled sorted \n\
         {SHA} refs/heads/master\n\
         {SHA} refs/pull/12/head\n\
         {SHA} refs/pull/12/merge\n\
         {SHA} refs/tags/v1.0.0\n"
    )
}

/// Fake git that records every invocation.
///
/// A successful clone writes [`github_packed_refs`] into the target directory,
/// the way a real mirror clone would.
#[derive(Clone)]
pub struct RecordingGit {
    pub available: bool,
    pub clone_exit: i32,
    pub push_exit: i32,
    pub calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl RecordingGit {
    pub fn new(clone_exit: i32, push_exit: i32) -> Self {
        Self {
            available: true,
            clone_exit,
            push_exit,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn missing() -> Self {
        Self {
            available: false,
            ..Self::new(0, 0)
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Subcommand of each recorded call, in order
    pub fn subcommands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|args| {
                args.iter()
                    .find(|a| *a == "clone" || *a == "push")
                    .cloned()
            })
            .collect()
    }
}

#[async_trait]
impl GitRunner for RecordingGit {
    fn resolve(&self) -> Result<PathBuf, MirrorError> {
        if self.available {
            Ok(PathBuf::from("/usr/bin/git"))
        } else {
            Err(MirrorError::ToolNotFound {
                tool: "git".to_string(),
            })
        }
    }

    async fn exec(&self, args: Vec<String>) -> std::io::Result<i32> {
        self.calls.lock().unwrap().push(args.clone());

        if args.iter().any(|a| a == "clone") {
            if self.clone_exit == 0 {
                let target = PathBuf::from(args.last().expect("clone target"));
                std::fs::create_dir_all(&target)?;
                std::fs::write(target.join("packed-refs"), github_packed_refs())?;
            }
            Ok(self.clone_exit)
        } else {
            Ok(self.push_exit)
        }
    }
}

/// Whether a usable git binary is on PATH
pub fn git_available() -> bool {
    git_mirror::git::git_version("git").is_some()
}
