//! Result reporting to the invoking host.
//!
//! Pipeline hosts treat silence as success and expect a single failure signal
//! otherwise. The task itself returns a `Result`; this module is the only place
//! that knows how a given host wants to hear about it.

use std::fmt::Write as _;
use std::io::{self, Write};

/// Environment variable Azure Pipelines sets on every agent job.
pub const AZURE_PIPELINES_MARKER: &str = "TF_BUILD";

/// How failures are signalled to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostReporter {
    /// Plain error text on stderr.
    Console,
    /// Azure Pipelines `##vso` logging commands on stdout.
    AzurePipelines,
}

impl HostReporter {
    /// Pick the reporter for the current environment.
    pub fn detect() -> Self {
        match std::env::var(AZURE_PIPELINES_MARKER) {
            Ok(value) if value.eq_ignore_ascii_case("true") => Self::AzurePipelines,
            _ => Self::Console,
        }
    }

    /// Lines to emit for a failure with the given message.
    pub fn failure_lines(&self, message: &str) -> Vec<String> {
        match self {
            Self::Console => vec![format!("Error: {}", message)],
            Self::AzurePipelines => {
                let data = escape_data(message);
                vec![
                    format!("##vso[task.issue type=error;]{}", data),
                    format!("##vso[task.complete result=Failed;]{}", data),
                ]
            }
        }
    }

    /// Report the outcome of a run. Success is reported by saying nothing.
    ///
    /// Returns the process exit code the binary should use.
    pub fn report(&self, result: &anyhow::Result<()>) -> i32 {
        let Err(err) = result else {
            return 0;
        };

        let message = error_chain(err);
        let lines = self.failure_lines(&message);

        // Writes to a closed pipe are not worth failing over
        match self {
            Self::Console => {
                let mut stderr = io::stderr().lock();
                for line in lines {
                    let _ = writeln!(stderr, "{}", line);
                }
            }
            Self::AzurePipelines => {
                let mut stdout = io::stdout().lock();
                for line in lines {
                    let _ = writeln!(stdout, "{}", line);
                }
            }
        }

        1
    }
}

/// `outer: inner: root` rendering of an error and its sources.
///
/// Causes already spelled out by the previous message are not repeated.
pub fn error_chain(err: &anyhow::Error) -> String {
    let mut message = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if message.ends_with(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        let _ = write!(message, "{}", text);
    }
    message
}

/// Escape message data for an Azure Pipelines logging command.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirrorError;
    use serial_test::serial;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("100% done\r\nnext"), "100%AZP25 done%0D%0Anext");
        assert_eq!(escape_data("plain"), "plain");
    }

    #[test]
    fn test_azure_failure_lines() {
        let lines = HostReporter::AzurePipelines.failure_lines("clone failed\nsee log");
        assert_eq!(
            lines,
            vec![
                "##vso[task.issue type=error;]clone failed%0Asee log".to_string(),
                "##vso[task.complete result=Failed;]clone failed%0Asee log".to_string(),
            ]
        );
    }

    #[test]
    fn test_console_failure_lines() {
        let lines = HostReporter::Console.failure_lines("push failed");
        assert_eq!(lines, vec!["Error: push failed".to_string()]);
    }

    #[test]
    fn test_report_exit_codes() {
        assert_eq!(HostReporter::Console.report(&Ok(())), 0);

        let failure: anyhow::Result<()> = Err(MirrorError::PushFailed { exit_code: 1 }.into());
        assert_eq!(HostReporter::Console.report(&failure), 1);
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = anyhow::Error::new(io).context("Failed to read config file");
        assert_eq!(error_chain(&err), "Failed to read config file: no such file");
    }

    #[test]
    fn test_error_chain_skips_repeated_source() {
        let err: anyhow::Error = MirrorError::Invocation {
            phase: crate::error::Phase::Push,
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert_eq!(error_chain(&err), "failed to start git push: denied");
    }

    #[test]
    #[serial]
    fn test_detect() {
        std::env::set_var(AZURE_PIPELINES_MARKER, "True");
        assert_eq!(HostReporter::detect(), HostReporter::AzurePipelines);

        std::env::remove_var(AZURE_PIPELINES_MARKER);
        assert_eq!(HostReporter::detect(), HostReporter::Console);
    }
}
