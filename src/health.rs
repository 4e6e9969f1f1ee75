//! Preflight checks for a mirror run
//!
//! This module verifies git and the task inputs without touching any
//! repository, so a misconfigured pipeline can be diagnosed cheaply.

use crate::config::MirrorSettings;
use crate::git::{find_executable, git_version};
use crate::uri::validate_uri;

/// Result of system health checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Git installation status
    pub git: CheckResult,
    /// Source repository URI
    pub source: CheckResult,
    /// Destination repository URI and token
    pub destination: CheckResult,
    /// Clone directory availability (warning only)
    pub clone_dir: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all health checks on the inputs a mirror run would see
    pub fn run(settings: &MirrorSettings) -> Self {
        let settings = &settings.clone().normalized();
        let git_program = settings.git_executable.as_deref().unwrap_or("git");

        Self {
            git: Self::check_git(git_program),
            source: Self::check_source(settings),
            destination: Self::check_destination(settings),
            clone_dir: Self::check_clone_dir(settings),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.git.passed && self.source.passed && self.destination.passed
        // clone directory is advisory only
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<(&'static str, &CheckResult)> {
        self.all_checks()
            .into_iter()
            .filter(|(_, r)| r.is_warning)
            .collect()
    }

    /// Check git installation
    fn check_git(program: &str) -> CheckResult {
        match find_executable(program) {
            None => CheckResult::error_with_details(
                format!("{} not found", program),
                "Install git: https://git-scm.com/downloads",
            ),
            Some(path) => match git_version(program) {
                Some(version) => CheckResult::ok_with_details(
                    "Git installed",
                    format!("{} ({})", version, path.display()),
                ),
                None => CheckResult::error_with_details("Git command failed", path.display().to_string()),
            },
        }
    }

    /// Check the source URI
    fn check_source(settings: &MirrorSettings) -> CheckResult {
        match validate_uri(settings.source_git_repository_uri.as_deref()) {
            Ok(_) if settings.source_git_repository_personal_access_token.is_some() => {
                CheckResult::ok("Source URI valid (token provided)")
            }
            Ok(_) => CheckResult::ok("Source URI valid"),
            Err(e) => CheckResult::error_with_details("Source URI invalid", e.to_string()),
        }
    }

    /// Check the destination URI and token
    fn check_destination(settings: &MirrorSettings) -> CheckResult {
        if let Err(e) = validate_uri(settings.destination_git_repository_uri.as_deref()) {
            return CheckResult::error_with_details("Destination URI invalid", e.to_string());
        }

        if settings.destination_git_repository_personal_access_token.is_some() {
            CheckResult::ok("Destination URI valid (token provided)")
        } else {
            CheckResult::error("Destination personal access token missing")
        }
    }

    /// Warn when the clone target already exists; `git clone` refuses non-empty targets
    fn check_clone_dir(settings: &MirrorSettings) -> CheckResult {
        let path = match settings.clone_directory() {
            Ok(path) => path,
            Err(_) => {
                return CheckResult::warning_with_details(
                    "Clone directory unknown",
                    "Set a valid source URI or a clone directory name",
                )
            }
        };

        if path.exists() {
            CheckResult::warning_with_details(
                "Clone directory already exists",
                format!("git clone --mirror will fail. Remove: {}", path.display()),
            )
        } else {
            CheckResult::ok_with_details("Clone directory available", path.display().to_string())
        }
    }

    /// Get all checks as a slice for iteration
    pub fn all_checks(&self) -> [(&'static str, &CheckResult); 4] {
        [
            ("Git", &self.git),
            ("Source", &self.source),
            ("Destination", &self.destination),
            ("Clone Directory", &self.clone_dir),
        ]
    }
}
