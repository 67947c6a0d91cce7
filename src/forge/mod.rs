//! Code-hosting forge abstraction.
//!
//! The [`ForgeClient`] trait decouples freeze evaluation from the forge's
//! REST API. Every side effect the bot has (label edits, comments) and its
//! only read (the policy document) go through this trait.

pub mod gitee;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

use crate::Result;

/// Boxed future returned by [`ForgeClient`] methods.
pub type ForgeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Identifies a pull request on the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRef {
    /// Owning organization.
    pub org: String,
    /// Repository name.
    pub repo: String,
    /// PR number.
    pub number: u64,
}

impl PrRef {
    /// Build a reference from its parts.
    pub fn new(org: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
            number,
        }
    }
}

impl Display for PrRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.org, self.repo, self.number)
    }
}

/// File content as returned by the forge contents API.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RepoContent {
    /// Encoded file body.
    #[serde(default)]
    pub content: String,
    /// Encoding of [`Self::content`]; `base64` on Gitee.
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Forge operations used by the bot.
///
/// Label additions and removals must tolerate redundant calls: adding a
/// label already present or removing one already absent succeeds.
pub trait ForgeClient: Send + Sync {
    /// Fetch a file from `org/repo` at `git_ref`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forge`](crate::AppError::Forge) if the request fails.
    fn get_path_content<'a>(
        &'a self,
        org: &'a str,
        repo: &'a str,
        path: &'a str,
        git_ref: &'a str,
    ) -> ForgeFuture<'a, RepoContent>;

    /// Add `label` to a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forge`](crate::AppError::Forge) if the request fails.
    fn add_label<'a>(&'a self, pr: &'a PrRef, label: &'a str) -> ForgeFuture<'a, ()>;

    /// Remove `label` from a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forge`](crate::AppError::Forge) if the request fails.
    fn remove_label<'a>(&'a self, pr: &'a PrRef, label: &'a str) -> ForgeFuture<'a, ()>;

    /// Remove several labels from a pull request in one call.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forge`](crate::AppError::Forge) if the request fails.
    fn remove_labels<'a>(&'a self, pr: &'a PrRef, labels: &'a [String]) -> ForgeFuture<'a, ()>;

    /// Post a comment on a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forge`](crate::AppError::Forge) if the request fails.
    fn create_comment<'a>(&'a self, pr: &'a PrRef, body: &'a str) -> ForgeFuture<'a, ()>;
}
