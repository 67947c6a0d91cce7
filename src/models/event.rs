//! Inbound forge webhook payloads.
//!
//! Only the fields the bot reads are modelled; everything else in the
//! payload is ignored during deserialization.

use serde::Deserialize;

/// Repository the event originated from.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Owning organization or user.
    pub namespace: String,
    /// Repository name.
    pub path: String,
}

/// Branch reference on a pull request.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BranchRef {
    /// Branch name.
    #[serde(rename = "ref")]
    pub ref_name: String,
}

/// A label attached to a pull request.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LabelInfo {
    /// Label name.
    pub name: String,
}

/// Pull request snapshot carried by webhook events.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PullRequestInfo {
    /// PR number within the repository.
    pub number: u64,
    /// `open`, `closed`, or `merged`.
    #[serde(default)]
    pub state: String,
    /// Labels at the time the event was emitted.
    #[serde(default)]
    pub labels: Vec<LabelInfo>,
    /// Target branch.
    pub base: BranchRef,
}

impl PullRequestInfo {
    /// Whether the PR is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }

    /// Label names as borrowed strings.
    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.name.as_str())
    }
}

/// Lifecycle transitions the bot reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestAction {
    /// PR was opened.
    Opened,
    /// PR was updated (new commits, retargeted, edited).
    Updated,
}

/// `Merge Request Hook` payload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PullRequestEvent {
    /// Raw action string (`open`, `update`, `close`, `merge`, ...).
    pub action: String,
    /// The pull request.
    pub pull_request: PullRequestInfo,
    /// The repository.
    pub repository: RepositoryInfo,
}

impl PullRequestEvent {
    /// Map the raw action onto a lifecycle transition the bot handles.
    #[must_use]
    pub fn lifecycle_action(&self) -> Option<PullRequestAction> {
        match self.action.as_str() {
            "open" => Some(PullRequestAction::Opened),
            "update" => Some(PullRequestAction::Updated),
            _ => None,
        }
    }
}

/// Comment author.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    /// Login name.
    pub login: String,
}

/// A comment body and its author.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CommentInfo {
    /// Raw comment text.
    #[serde(default)]
    pub body: String,
    /// Author.
    pub user: UserInfo,
}

/// `Note Hook` payload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NoteEvent {
    /// What was commented on (`PullRequest`, `Issue`, `Commit`).
    #[serde(default)]
    pub noteable_type: String,
    /// The comment.
    pub comment: CommentInfo,
    /// Present when the comment is on a pull request.
    #[serde(default)]
    pub pull_request: Option<PullRequestInfo>,
    /// The repository.
    pub repository: RepositoryInfo,
}

impl NoteEvent {
    /// The commented pull request when it is still open.
    #[must_use]
    pub fn open_pull_request(&self) -> Option<&PullRequestInfo> {
        if self.noteable_type != "PullRequest" {
            return None;
        }
        self.pull_request.as_ref().filter(|pr| pr.is_open())
    }
}
