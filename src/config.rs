//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keyring service under which forge credentials are stored.
const KEYRING_SERVICE: &str = "branch-freezer";

/// Forge API connectivity settings.
///
/// Secrets are loaded at runtime via OS keychain or environment variables,
/// not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ForgeConfig {
    /// Base URL of the forge REST API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Personal access token used for API calls (populated at runtime).
    #[serde(skip)]
    pub access_token: String,
    /// Shared webhook secret (populated at runtime). Empty disables the check.
    #[serde(skip)]
    pub webhook_secret: String,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            access_token: String::new(),
            webhook_secret: String::new(),
        }
    }
}

fn default_api_base() -> String {
    "https://gitee.com/api/v5".into()
}

/// Label names the bot reads and writes on pull requests.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LabelConfig {
    /// Label blocking a PR from merge while its target branch is frozen.
    #[serde(default = "default_freeze_label")]
    pub freeze: String,
    /// Label marking a PR as exempt from the active freeze.
    #[serde(default = "default_mergeable_label")]
    pub mergeable: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            freeze: default_freeze_label(),
            mergeable: default_mergeable_label(),
        }
    }
}

fn default_freeze_label() -> String {
    "branch-frozen".into()
}

fn default_mergeable_label() -> String {
    "frozen-mergeable".into()
}

/// Location of the freeze policy document inside a repository.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FreezeFileConfig {
    /// Organization owning the repository that holds the policy document.
    pub org: String,
    /// Repository holding the policy document.
    pub repo: String,
    /// Branch to read the document from.
    #[serde(default = "default_freeze_branch")]
    pub branch: String,
    /// Path of the document within the repository.
    pub file_path: String,
}

fn default_freeze_branch() -> String {
    "master".into()
}

impl FreezeFileConfig {
    fn validate(&self) -> Result<()> {
        if self.org.is_empty() {
            return Err(AppError::Config(
                "the org configuration item can't be set empty".into(),
            ));
        }
        if self.repo.is_empty() {
            return Err(AppError::Config(
                "the repo configuration item can't be set empty".into(),
            ));
        }
        if self.file_path.is_empty() {
            return Err(AppError::Config(
                "the file_path configuration item can't be set empty".into(),
            ));
        }
        Ok(())
    }
}

/// Per-repository bot configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RepoConfig {
    /// Repositories this item applies to, as `org` or `org/repo`.
    pub repos: Vec<String>,
    /// Repositories (`org/repo`) excluded even when their org is listed.
    #[serde(default)]
    pub excluded_repos: Vec<String>,
    /// Where to find the freeze policy document.
    pub freeze_file: FreezeFileConfig,
}

impl RepoConfig {
    /// How specifically this item names `org/repo`.
    ///
    /// `Some(2)` for an exact repo entry, `Some(1)` for an org-wide entry,
    /// `None` when the item does not apply.
    fn match_rank(&self, org: &str, repo: &str) -> Option<u8> {
        let full = format!("{org}/{repo}");
        if self.excluded_repos.iter().any(|r| *r == full) {
            return None;
        }
        if self.repos.iter().any(|r| *r == full) {
            Some(2)
        } else if self.repos.iter().any(|r| r == org) {
            Some(1)
        } else {
            None
        }
    }

    fn validate(&self) -> Result<()> {
        if self.repos.is_empty() {
            return Err(AppError::Config("repos must not be empty".into()));
        }
        self.freeze_file.validate()
    }
}

fn default_http_port() -> u16 {
    8888
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Port the webhook listener binds to.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Forge API settings.
    #[serde(default)]
    pub forge: ForgeConfig,
    /// Label names used for freeze bookkeeping.
    #[serde(default)]
    pub labels: LabelConfig,
    /// Per-repository configuration items.
    #[serde(default)]
    pub config_items: Vec<RepoConfig>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load forge credentials from OS keychain with env-var fallback.
    ///
    /// The access token is required. The webhook secret is optional; when it
    /// is missing, inbound webhooks are accepted without a token check.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no access token can be found.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.forge.access_token =
            load_credential("forge_access_token", "FORGE_ACCESS_TOKEN").await?;
        match load_credential("webhook_secret", "FORGE_WEBHOOK_SECRET").await {
            Ok(secret) => self.forge.webhook_secret = secret,
            Err(err) => {
                warn!(%err, "no webhook secret configured; webhook token check disabled");
            }
        }
        Ok(())
    }

    /// Resolve the configuration item governing `org/repo`.
    ///
    /// An item naming the repository exactly wins over an org-wide item;
    /// among equally specific items the first one wins.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no item applies to the repository.
    pub fn config_for(&self, org: &str, repo: &str) -> Result<&RepoConfig> {
        let mut best: Option<(u8, &RepoConfig)> = None;
        for item in &self.config_items {
            if let Some(rank) = item.match_rank(org, repo) {
                let better = match best {
                    Some((current, _)) => rank > current,
                    None => true,
                };
                if better {
                    best = Some((rank, item));
                }
            }
        }
        best.map(|(_, item)| item)
            .ok_or_else(|| AppError::NotFound(format!("no config for this repo: {org}/{repo}")))
    }

    fn validate(&self) -> Result<()> {
        if self.labels.freeze.is_empty() || self.labels.mergeable.is_empty() {
            return Err(AppError::Config("label names must not be empty".into()));
        }
        if self.labels.freeze == self.labels.mergeable {
            return Err(AppError::Config(
                "freeze and mergeable labels must differ".into(),
            ));
        }
        for item in &self.config_items {
            item.validate()?;
        }
        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    env::var(env_key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::Config(format!(
                "credential {keyring_key} not found in keychain or {env_key} env var"
            ))
        })
}
