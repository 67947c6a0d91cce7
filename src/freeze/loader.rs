//! Freeze policy document loader.
//!
//! Fetches the YAML policy document through the [`ForgeClient`] and decodes
//! it into a [`FreezeRegistry`]. The registry is fetched on every call and
//! never cached.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::config::FreezeFileConfig;
use crate::forge::{ForgeClient, RepoContent};
use crate::models::freeze::FreezeRegistry;
use crate::{AppError, Result};

/// Loads freeze registries from the forge.
pub struct RegistryLoader;

impl RegistryLoader {
    /// Fetch and decode the policy document described by `file`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forge` if the fetch fails and `AppError::Registry`
    /// if the content cannot be decoded.
    pub async fn load(forge: &dyn ForgeClient, file: &FreezeFileConfig) -> Result<FreezeRegistry> {
        let content = forge
            .get_path_content(&file.org, &file.repo, &file.file_path, &file.branch)
            .await?;
        let registry = Self::decode(&content)?;
        debug!(
            org = %file.org,
            repo = %file.repo,
            path = %file.file_path,
            records = registry.freeze_items.len(),
            "loaded freeze registry"
        );
        Ok(registry)
    }

    /// Decode forge file content into a registry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Registry` on invalid base64, UTF-8, or YAML.
    pub fn decode(content: &RepoContent) -> Result<FreezeRegistry> {
        let raw = match content.encoding.as_deref() {
            Some(enc) if enc.eq_ignore_ascii_case("base64") => {
                // The contents API wraps base64 at 60 columns.
                let compact: String = content
                    .content
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                let bytes = STANDARD
                    .decode(compact)
                    .map_err(|err| AppError::Registry(format!("invalid base64: {err}")))?;
                String::from_utf8(bytes)
                    .map_err(|err| AppError::Registry(format!("invalid utf-8: {err}")))?
            }
            _ => content.content.clone(),
        };

        if raw.trim().is_empty() {
            return Ok(FreezeRegistry::default());
        }

        Ok(serde_yaml::from_str(&raw)?)
    }
}
