//! Authorization gate for freeze slash commands.
//!
//! `/branch-freeze` and `/branch-freeze cancel` only make sense on a PR whose
//! target branch is frozen, and only freeze owners may use them. The gate
//! checks both, in that order, and answers rejected commands with a comment
//! addressed to the commenter. Policy rejections are expected outcomes and
//! never surface as errors.

use tracing::{error, info, info_span, warn, Instrument};

use super::loader::RegistryLoader;
use crate::config::{FreezeFileConfig, LabelConfig};
use crate::forge::{ForgeClient, PrRef};
use crate::models::freeze::{Command, LabelState};
use crate::Result;

/// Outcome of validating a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The command may mutate labels.
    Authorized,
    /// The PR's target branch is not frozen.
    BranchNotFrozen,
    /// The commenter is not a freeze owner.
    PermissionDenied,
    /// The policy document could not be loaded.
    RegistryUnavailable,
}

/// Which freeze label an edit touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// The merge-blocking label.
    Freeze,
    /// The exemption label.
    Mergeable,
}

impl LabelKind {
    fn name(self, labels: &LabelConfig) -> &str {
        match self {
            Self::Freeze => &labels.freeze,
            Self::Mergeable => &labels.mergeable,
        }
    }
}

/// A single label mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelEdit {
    /// Add the label.
    Add(LabelKind),
    /// Remove the label.
    Remove(LabelKind),
}

/// A slash command issued on a pull request.
#[derive(Debug, Clone)]
pub struct CommandRequest<'a> {
    /// The commented PR.
    pub pr: &'a PrRef,
    /// The PR's target branch.
    pub base_branch: &'a str,
    /// Login of the commenter.
    pub commenter: &'a str,
    /// The PR's freeze labels when the comment was made.
    pub labels: LabelState,
}

/// Comment sent when a command targets a branch that is not frozen.
#[must_use]
pub fn invalid_command_comment(commenter: &str) -> String {
    format!("@{commenter} Invalid command: The target branch of this PR is not frozen.")
}

/// Comment sent when a non-owner uses a freeze command.
#[must_use]
pub fn no_permission_comment(commenter: &str, command: Command) -> String {
    format!("@{commenter} you do not have permission to use the `{command}` command.")
}

/// Label edits `command` performs, given the PR's current labels.
///
/// `/branch-freeze` drops any exemption, then blocks. `/branch-freeze cancel`
/// grants the exemption, then unblocks. `/check-freeze` edits nothing here.
#[must_use]
pub fn command_edits(command: Command, labels: LabelState) -> Vec<LabelEdit> {
    let mut edits = Vec::with_capacity(2);
    match command {
        Command::BranchFreeze => {
            if labels.has_mergeable {
                edits.push(LabelEdit::Remove(LabelKind::Mergeable));
            }
            if !labels.has_freeze {
                edits.push(LabelEdit::Add(LabelKind::Freeze));
            }
        }
        Command::BranchFreezeCancel => {
            if !labels.has_mergeable {
                edits.push(LabelEdit::Add(LabelKind::Mergeable));
            }
            if labels.has_freeze {
                edits.push(LabelEdit::Remove(LabelKind::Freeze));
            }
        }
        Command::CheckFreeze => {}
    }
    edits
}

/// Validate `command` against the freeze policy and the commenter.
///
/// Rejections post a comment; a failure to post it is logged and the
/// rejection still stands.
pub async fn authorize(
    forge: &dyn ForgeClient,
    file: &FreezeFileConfig,
    request: &CommandRequest<'_>,
    command: Command,
) -> GateDecision {
    let registry = match RegistryLoader::load(forge, file).await {
        Ok(registry) => registry,
        Err(err) => {
            error!(%err, "failed to load freeze registry; ignoring command");
            return GateDecision::RegistryUnavailable;
        }
    };

    let pr = request.pr;
    let record = registry.record_for(&pr.org, &pr.repo);
    let commenter = request.commenter.to_lowercase();

    if !record.is_some_and(|r| r.is_frozen(request.base_branch)) {
        info!(%commenter, "command rejected: target branch not frozen");
        if let Err(err) = forge
            .create_comment(pr, &invalid_command_comment(&commenter))
            .await
        {
            error!(%err, "failed to post invalid command comment");
        }
        return GateDecision::BranchNotFrozen;
    }

    if !record.is_some_and(|r| r.is_owner(&commenter)) {
        warn!(%commenter, "command rejected: commenter is not a freeze owner");
        if let Err(err) = forge
            .create_comment(pr, &no_permission_comment(&commenter, command))
            .await
        {
            error!(%err, "failed to post no permission comment");
        }
        return GateDecision::PermissionDenied;
    }

    GateDecision::Authorized
}

/// Apply `edits` in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the forge error of the failing edit.
pub async fn apply_edits(
    forge: &dyn ForgeClient,
    labels: &LabelConfig,
    pr: &PrRef,
    edits: &[LabelEdit],
) -> Result<()> {
    for edit in edits {
        match *edit {
            LabelEdit::Add(kind) => forge.add_label(pr, kind.name(labels)).await?,
            LabelEdit::Remove(kind) => forge.remove_label(pr, kind.name(labels)).await?,
        }
    }
    Ok(())
}

/// Run a `/branch-freeze` or `/branch-freeze cancel` command end to end.
///
/// # Errors
///
/// Returns an error only when an authorized label edit fails.
pub async fn run_command(
    forge: &dyn ForgeClient,
    file: &FreezeFileConfig,
    labels: &LabelConfig,
    request: &CommandRequest<'_>,
    command: Command,
) -> Result<()> {
    let span = info_span!(
        "freeze_command",
        pr = %request.pr,
        command = %command,
        commenter = request.commenter
    );

    async move {
        let decision = authorize(forge, file, request, command).await;
        if decision != GateDecision::Authorized {
            return Ok(());
        }

        let edits = command_edits(command, request.labels);
        info!(?edits, "applying command");
        apply_edits(forge, labels, request.pr, &edits).await
    }
    .instrument(span)
    .await
}
