//! Freeze policy, label state, and decision models.

use serde::Deserialize;

use crate::config::LabelConfig;

/// Freeze policy document as stored in the content repository.
///
/// Loaded fresh for every evaluation and never cached, so decisions always
/// reflect the currently stored policy.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct FreezeRegistry {
    /// Per-repository freeze records, in document order.
    #[serde(default)]
    pub freeze_items: Vec<FreezeRecord>,
}

impl FreezeRegistry {
    /// Find the record governing `org/repo`.
    ///
    /// Duplicate keys are not validated; the first matching record wins.
    #[must_use]
    pub fn record_for(&self, org: &str, repo: &str) -> Option<&FreezeRecord> {
        let key = format!("{org}/{repo}");
        self.freeze_items.iter().find(|item| item.repo == key)
    }
}

/// Freeze settings for a single repository.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct FreezeRecord {
    /// Repository key in `org/repo` form.
    pub repo: String,
    /// Branches currently frozen.
    #[serde(default, rename = "frozen_branchs", alias = "frozen_branches")]
    pub frozen_branches: Vec<String>,
    /// Logins allowed to grant or revoke the freeze exemption.
    #[serde(default)]
    pub owners: Vec<String>,
}

impl FreezeRecord {
    /// Whether `branch` is in the frozen set.
    #[must_use]
    pub fn is_frozen(&self, branch: &str) -> bool {
        self.frozen_branches.iter().any(|b| b == branch)
    }

    /// Whether `login` is an owner. Logins compare case-insensitively.
    #[must_use]
    pub fn is_owner(&self, login: &str) -> bool {
        self.owners.iter().any(|o| o.eq_ignore_ascii_case(login))
    }
}

/// The two freeze-relevant facts about a PR's current labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelState {
    /// The freeze (merge-blocking) label is present.
    pub has_freeze: bool,
    /// The exemption label is present.
    pub has_mergeable: bool,
}

impl LabelState {
    /// Derive label state from a PR's label names.
    #[must_use]
    pub fn from_labels<'a, I>(labels: I, config: &LabelConfig) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        labels.into_iter().fold(Self::default(), |mut state, name| {
            if name == config.freeze {
                state.has_freeze = true;
            } else if name == config.mergeable {
                state.has_mergeable = true;
            }
            state
        })
    }
}

/// Which of the two freeze labels a PR carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelCombo {
    /// Neither label.
    Neither,
    /// Only the freeze label.
    FreezeOnly,
    /// Only the exemption label.
    MergeableOnly,
    /// Both labels.
    Both,
}

/// Freeze classification of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeStatus {
    /// Target branch is frozen; PR carries the given labels.
    Frozen(LabelCombo),
    /// Target branch is not frozen; PR carries the given labels.
    NotFrozen(LabelCombo),
    /// Unrecognized state. Resolves to a logged no-op.
    Unknown,
}

/// Label mutation required to bring a PR in line with the freeze policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreezeAction {
    /// Nothing to change.
    None,
    /// Remove the freeze label.
    RemoveFreezeLabel,
    /// Remove the exemption label.
    RemoveMergeableLabel,
    /// Remove both labels in one call.
    RemoveBothLabels,
    /// Add the freeze label and post a notice naming the owners.
    AddFreezeLabelAndNotify {
        /// Owners who may grant an exemption.
        owners: Vec<String>,
    },
}

/// Slash commands recognized in PR comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/check-freeze`: re-evaluate the PR's freeze labels.
    CheckFreeze,
    /// `/branch-freeze`: block the PR for the freeze window.
    BranchFreeze,
    /// `/branch-freeze cancel`: exempt the PR from the freeze.
    BranchFreezeCancel,
}

impl Command {
    /// Literal command text as typed by users.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckFreeze => "/check-freeze",
            Self::BranchFreeze => "/branch-freeze",
            Self::BranchFreezeCancel => "/branch-freeze cancel",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
