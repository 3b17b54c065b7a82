use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::cache::DEFAULT_TTL;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(PathBuf),

  #[error(
    "no configuration file found; create ./squadboard.yaml or ~/.config/squadboard/config.yaml"
  )]
  Missing,

  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("jira.domain is empty")]
  EmptyDomain,

  #[error("jira.domain must be a host name, not a URL: {0}")]
  DomainIsUrl(String),

  #[error("jira.email is not a valid email address: {0}")]
  InvalidEmail(String),

  #[error("Jira API token not found; set SQUADBOARD_JIRA_TOKEN or JIRA_API_TOKEN")]
  MissingToken,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub jira: JiraConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Restrict board discovery to these projects (empty = all boards)
  #[serde(default)]
  pub project_keys: Vec<String>,
  #[serde(default)]
  pub environment: Environment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
  /// Host only, e.g. `acme.atlassian.net`
  pub domain: String,
  pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
  DEFAULT_TTL.as_secs()
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: default_ttl_secs(),
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

/// Controls how much error detail reaches the user.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  Development,
  Production,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./squadboard.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/squadboard/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
    let path = match explicit_path {
      Some(p) if p.exists() => p.to_path_buf(),
      Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
      None => Self::find_config_file().ok_or(ConfigError::Missing)?,
    };

    let mut config = Self::load_from_path(&path)?;
    if let Ok(keys) = std::env::var("JIRA_PROJECT_KEYS") {
      config.project_keys = parse_project_keys(&keys);
    }
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("squadboard.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("squadboard").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Get the Jira API token from environment variables.
  ///
  /// Checks SQUADBOARD_JIRA_TOKEN first, then JIRA_API_TOKEN as fallback.
  pub fn api_token() -> Result<String, ConfigError> {
    std::env::var("SQUADBOARD_JIRA_TOKEN")
      .or_else(|_| std::env::var("JIRA_API_TOKEN"))
      .map_err(|_| ConfigError::MissingToken)
  }

  /// Startup checks on the values needed to reach Jira.
  pub fn validate(&self, token: &str) -> Result<(), ConfigError> {
    let domain = self.jira.domain.trim();
    if domain.is_empty() {
      return Err(ConfigError::EmptyDomain);
    }
    if domain.contains("://") {
      return Err(ConfigError::DomainIsUrl(domain.to_string()));
    }
    if !is_valid_email(&self.jira.email) {
      return Err(ConfigError::InvalidEmail(self.jira.email.clone()));
    }
    if token.trim().is_empty() {
      return Err(ConfigError::MissingToken);
    }
    Ok(())
  }

  /// The project filter, or `None` when every board should be listed.
  pub fn project_filter(&self) -> Option<&[String]> {
    if self.project_keys.is_empty() {
      None
    } else {
      Some(&self.project_keys)
    }
  }
}

/// Comma-separated project keys; blanks are dropped.
pub fn parse_project_keys(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|k| !k.is_empty())
    .map(String::from)
    .collect()
}

/// `local@host.tld` with no whitespace and a single `@`.
fn is_valid_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, host)) = email.split_once('@') else {
    return false;
  };
  if local.is_empty() || host.contains('@') {
    return false;
  }
  host
    .match_indices('.')
    .any(|(i, _)| i > 0 && i + 1 < host.len())
}
