use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::error::MirrorError;

/// Runs the git executable on behalf of the mirror task.
///
/// The task only looks at exit codes; output goes straight to the caller's
/// stdout/stderr for diagnostics.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Locate the executable, failing when it cannot be found.
    fn resolve(&self) -> Result<PathBuf, MirrorError>;

    /// Run git with `args` to completion and return its exit code.
    async fn exec(&self, args: Vec<String>) -> std::io::Result<i32>;
}

/// [`GitRunner`] backed by a real git binary.
///
/// The first successful [`GitRunner::resolve`] pins the executable; every later
/// `exec` spawns that exact path.
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: String,
    resolved: OnceLock<PathBuf>,
}

impl SystemGit {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            resolved: OnceLock::new(),
        }
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl GitRunner for SystemGit {
    fn resolve(&self) -> Result<PathBuf, MirrorError> {
        if let Some(path) = self.resolved.get() {
            return Ok(path.clone());
        }

        let path = find_executable(&self.program).ok_or_else(|| MirrorError::ToolNotFound {
            tool: self.program.clone(),
        })?;
        Ok(self.resolved.get_or_init(|| path).clone())
    }

    async fn exec(&self, args: Vec<String>) -> std::io::Result<i32> {
        let program = self.resolve().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string())
        })?;

        // Arguments carry authenticated URLs; the token is visible here at debug level.
        debug!("[command]{} {}", program.display(), args.join(" "));

        let status = AsyncCommand::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        // Killed by a signal: no code, report as a failure.
        Ok(status.code().unwrap_or(-1))
    }
}

/// Resolve `program` the way a shell would: paths are checked directly, bare
/// names are searched for on `PATH`.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        executable_names(program)
            .into_iter()
            .map(|name| dir.join(name))
            .find(|path| is_executable(path))
    })
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string(), format!("{}.exe", program)]
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn ssl_verify_config(verify_tls: bool) -> String {
    format!("http.sslVerify={}", verify_tls)
}

/// `git -c http.sslVerify=<flag> clone --mirror <url> <dir>`
pub fn clone_mirror_args(verify_tls: bool, url: &str, clone_directory: &Path) -> Vec<String> {
    vec![
        "-c".to_string(),
        ssl_verify_config(verify_tls),
        "clone".to_string(),
        "--mirror".to_string(),
        url.to_string(),
        clone_directory.display().to_string(),
    ]
}

/// `git -c http.sslVerify=<flag> -C <dir> push --mirror <url>`
pub fn push_mirror_args(verify_tls: bool, url: &str, clone_directory: &Path) -> Vec<String> {
    vec![
        "-c".to_string(),
        ssl_verify_config(verify_tls),
        "-C".to_string(),
        clone_directory.display().to_string(),
        "push".to_string(),
        "--mirror".to_string(),
        url.to_string(),
    ]
}

/// `git --version` output, if git can be run at all.
pub fn git_version(program: &str) -> Option<String> {
    let output = std::process::Command::new(program)
        .arg("--version")
        .output()
        .ok()?;

    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
