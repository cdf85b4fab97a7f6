//! Agent configuration and credentials.
//!
//! Tunables live in an optional `.devagent.toml` at the repository root.
//! Secrets never go there: they come from the environment, optionally seeded
//! from `vars.env` / `.env` files next to the repository.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::repo_id::RepoId;
use crate::io::git::VersionControl;
use crate::io::process::ProcessLimits;

pub const CONFIG_FILE_NAME: &str = ".devagent.toml";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Env files loaded from the repository root, in order. Existing variables win.
pub const ENV_FILES: [&str; 2] = ["vars.env", ".env"];

/// Fatal setup problems, raised before any operation runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: set {0} in the environment or vars.env")]
    MissingCredential(&'static str),
    #[error("cannot determine the GitHub repository from remote `{0}`")]
    UnresolvableRepository(String),
    #[error("cannot read remote.origin.url: {0:#}")]
    RemoteUnavailable(anyhow::Error),
    #[error("read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Agent configuration (TOML). Missing fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Chat model identifier sent with every request.
    pub model: String,
    pub openai_base_url: String,
    pub github_api_url: String,
    /// Timeout for each git subprocess.
    pub git_timeout_secs: u64,
    /// Bytes of git output kept in memory per command.
    pub git_output_limit_bytes: usize,
    /// Timeout for each HTTP request.
    pub http_timeout_secs: u64,
    /// Diffs, logs and TODO lists are cut to this many bytes before prompting.
    pub prompt_input_limit_bytes: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            git_timeout_secs: 120,
            git_output_limit_bytes: 4_000_000,
            http_timeout_secs: 120,
            prompt_input_limit_bytes: 60_000,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.model.trim().is_empty() {
            return invalid("model must be non-empty");
        }
        if self.openai_base_url.trim().is_empty() {
            return invalid("openai_base_url must be non-empty");
        }
        if self.github_api_url.trim().is_empty() {
            return invalid("github_api_url must be non-empty");
        }
        if self.git_timeout_secs == 0 {
            return invalid("git_timeout_secs must be > 0");
        }
        if self.git_output_limit_bytes == 0 {
            return invalid("git_output_limit_bytes must be > 0");
        }
        if self.http_timeout_secs == 0 {
            return invalid("http_timeout_secs must be > 0");
        }
        if self.prompt_input_limit_bytes == 0 {
            return invalid("prompt_input_limit_bytes must be > 0");
        }
        Ok(())
    }

    pub fn git_limits(&self) -> ProcessLimits {
        ProcessLimits {
            timeout: Duration::from_secs(self.git_timeout_secs),
            output_limit_bytes: self.git_output_limit_bytes,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AgentConfig::default()`.
pub fn load_config(path: &Path) -> Result<AgentConfig, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        let cfg = AgentConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let cfg: AgentConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// The two API secrets. `Debug` never prints them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub github_token: String,
    pub openai_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read both secrets through `lookup`; blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingCredential(name))
        };
        Ok(Self {
            github_token: read(GITHUB_TOKEN_VAR)?,
            openai_api_key: read(OPENAI_API_KEY_VAR)?,
        })
    }

    /// Seed the environment from env files in `root`, then read both secrets.
    pub fn from_env(root: &Path) -> Result<Self, ConfigError> {
        for name in ENV_FILES {
            let path = root.join(name);
            if path.exists() {
                match dotenvy::from_path(&path) {
                    Ok(()) => debug!(path = %path.display(), "loaded env file"),
                    Err(err) => {
                        return Err(ConfigError::Invalid(format!(
                            "cannot load {}: {err}",
                            path.display()
                        )));
                    }
                }
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// Everything the dispatcher needs from process start, resolved once.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: AgentConfig,
    pub credentials: Credentials,
    pub repo: RepoId,
}

impl Settings {
    pub fn new(
        config: AgentConfig,
        credentials: Credentials,
        vcs: &dyn VersionControl,
    ) -> Result<Self, ConfigError> {
        let repo = Self::resolve_repo(vcs)?;
        debug!(repo = %repo, model = %config.model, "settings resolved");
        Ok(Self {
            config,
            credentials,
            repo,
        })
    }

    /// Resolve the repository identifier from the origin remote.
    pub fn resolve_repo(vcs: &dyn VersionControl) -> Result<RepoId, ConfigError> {
        let url = vcs.remote_url().map_err(ConfigError::RemoteUnavailable)?;
        RepoId::from_remote_url(&url).ok_or(ConfigError::UnresolvableRepository(url))
    }
}
