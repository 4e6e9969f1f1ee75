use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::MirrorError;
use crate::uri::{derive_clone_directory, ensure_git_suffix, validate_uri};

/// Host input names, as the pipeline task definition declares them.
pub mod inputs {
    pub const SOURCE_URI: &str = "sourceGitRepositoryUri";
    pub const SOURCE_TOKEN: &str = "sourceGitRepositoryPersonalAccessToken";
    pub const SOURCE_CLONE_DIRECTORY: &str = "sourceGitRepositoryCloneDirectoryName";
    pub const SOURCE_VERIFY_SSL: &str = "sourceVerifySSLCertificate";
    pub const DESTINATION_URI: &str = "destinationGitRepositoryUri";
    pub const DESTINATION_TOKEN: &str = "destinationGitRepositoryPersonalAccessToken";
    pub const DESTINATION_VERIFY_SSL: &str = "destinationVerifySSLCertificate";
    pub const GIT_EXECUTABLE: &str = "gitExecutable";
}

/// Raw, possibly incomplete task inputs as read from a file, the environment
/// or the command line.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MirrorSettings {
    pub source_git_repository_uri: Option<String>,

    pub source_git_repository_personal_access_token: Option<String>,

    pub source_git_repository_clone_directory_name: Option<String>,

    #[serde(
        rename = "sourceVerifySSLCertificate",
        default,
        deserialize_with = "flag_text"
    )]
    pub source_verify_ssl_certificate: Option<String>,

    pub destination_git_repository_uri: Option<String>,

    pub destination_git_repository_personal_access_token: Option<String>,

    #[serde(
        rename = "destinationVerifySSLCertificate",
        default,
        deserialize_with = "flag_text"
    )]
    pub destination_verify_ssl_certificate: Option<String>,

    pub git_executable: Option<String>,
}

/// Boolean inputs arrive as text from flags and the environment; YAML may also
/// carry a native bool.
fn flag_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(value) => value.to_string(),
        Flag::Text(value) => value,
    }))
}

/// Source side of a mirror run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub uri: String,
    pub token: Option<String>,
    /// Local bare clone; always ends in `.git`.
    pub clone_directory: PathBuf,
    pub verify_tls: bool,
}

/// Destination side of a mirror run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationConfig {
    pub uri: String,
    pub token: String,
    pub verify_tls: bool,
}

/// Validated, immutable configuration for one mirror run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub git_executable: String,
}

impl MirrorSettings {
    /// Load settings from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load from `path`, or from the default location when it exists.
    ///
    /// Having no file at all is fine: inputs may come entirely from flags or the
    /// environment.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Self::default_config_path()?;
                if default_path.exists() {
                    tracing::debug!("Loading configuration from {:?}", default_path);
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("git-mirror").join("config.yml"))
    }

    /// Overlay `other` on top of `self`; values present in `other` win.
    pub fn merge(self, other: MirrorSettings) -> Self {
        Self {
            source_git_repository_uri: other.source_git_repository_uri.or(self.source_git_repository_uri),
            source_git_repository_personal_access_token: other
                .source_git_repository_personal_access_token
                .or(self.source_git_repository_personal_access_token),
            source_git_repository_clone_directory_name: other
                .source_git_repository_clone_directory_name
                .or(self.source_git_repository_clone_directory_name),
            source_verify_ssl_certificate: other
                .source_verify_ssl_certificate
                .or(self.source_verify_ssl_certificate),
            destination_git_repository_uri: other
                .destination_git_repository_uri
                .or(self.destination_git_repository_uri),
            destination_git_repository_personal_access_token: other
                .destination_git_repository_personal_access_token
                .or(self.destination_git_repository_personal_access_token),
            destination_verify_ssl_certificate: other
                .destination_verify_ssl_certificate
                .or(self.destination_verify_ssl_certificate),
            git_executable: other.git_executable.or(self.git_executable),
        }
    }

    /// Same settings with every value trimmed and blank values dropped.
    pub fn normalized(self) -> Self {
        Self {
            source_git_repository_uri: input(self.source_git_repository_uri),
            source_git_repository_personal_access_token: input(
                self.source_git_repository_personal_access_token,
            ),
            source_git_repository_clone_directory_name: input(
                self.source_git_repository_clone_directory_name,
            ),
            source_verify_ssl_certificate: input(self.source_verify_ssl_certificate),
            destination_git_repository_uri: input(self.destination_git_repository_uri),
            destination_git_repository_personal_access_token: input(
                self.destination_git_repository_personal_access_token,
            ),
            destination_verify_ssl_certificate: input(self.destination_verify_ssl_certificate),
            git_executable: input(self.git_executable),
        }
    }

    /// Where the source gets cloned: the override with a `.git` suffix, or the
    /// last segment of the source URI.
    ///
    /// Expects normalized settings with a source URI present.
    pub fn clone_directory(&self) -> Result<PathBuf, MirrorError> {
        match &self.source_git_repository_clone_directory_name {
            Some(name) => Ok(expand_path(&ensure_git_suffix(name))),
            None => {
                let uri = self
                    .source_git_repository_uri
                    .as_deref()
                    .ok_or(MirrorError::MissingInput(inputs::SOURCE_URI))?;
                Ok(PathBuf::from(derive_clone_directory(uri)?))
            }
        }
    }
}

/// Trimmed value, with blank strings treated as not provided.
fn input(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, name: &'static str) -> Result<String, MirrorError> {
    input(value).ok_or(MirrorError::MissingInput(name))
}

/// Boolean input; absent means `false`.
fn flag(value: Option<String>, name: &'static str) -> Result<bool, MirrorError> {
    let Some(value) = input(value) else {
        return Ok(false);
    };

    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Ok(true),
        "false" | "no" | "n" | "off" | "0" => Ok(false),
        _ => Err(MirrorError::InvalidInput { name, value }),
    }
}

/// Expand `~` and environment variables, then normalize the path.
fn expand_path(raw: &str) -> PathBuf {
    let expanded = shellexpand::full(raw)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    path_clean::clean(expanded)
}

impl MirrorConfig {
    /// Validate settings and derive everything the task needs.
    pub fn from_settings(settings: MirrorSettings) -> Result<Self, MirrorError> {
        let settings = settings.normalized();

        let source_uri = required(settings.source_git_repository_uri.clone(), inputs::SOURCE_URI)?;
        validate_uri(Some(&source_uri))?;
        let clone_directory = settings.clone_directory()?;

        let destination_uri =
            required(settings.destination_git_repository_uri, inputs::DESTINATION_URI)?;
        validate_uri(Some(&destination_uri))?;

        let destination_token = required(
            settings.destination_git_repository_personal_access_token,
            inputs::DESTINATION_TOKEN,
        )?;

        Ok(Self {
            source: SourceConfig {
                uri: source_uri,
                token: settings.source_git_repository_personal_access_token,
                clone_directory,
                verify_tls: flag(
                    settings.source_verify_ssl_certificate,
                    inputs::SOURCE_VERIFY_SSL,
                )?,
            },
            destination: DestinationConfig {
                uri: destination_uri,
                token: destination_token,
                verify_tls: flag(
                    settings.destination_verify_ssl_certificate,
                    inputs::DESTINATION_VERIFY_SSL,
                )?,
            },
            git_executable: settings.git_executable.unwrap_or_else(|| "git".to_string()),
        })
    }
}
