//! Freeze action resolution and application.
//!
//! [`resolve`] is the single decision table mapping a [`FreezeStatus`] to the
//! label correction that converges the PR onto the policy-correct state.
//! [`apply_action`] performs that correction against the forge, and
//! [`check_freeze`] runs the whole load → classify → resolve → apply flow.

use tracing::{info, info_span, warn, Instrument};

use super::classifier::classify_labels;
use super::loader::RegistryLoader;
use crate::config::{FreezeFileConfig, LabelConfig};
use crate::forge::{ForgeClient, PrRef};
use crate::models::freeze::{FreezeAction, FreezeStatus, LabelCombo, LabelState};
use crate::Result;

/// Comment posted when a PR is newly blocked by a freeze.
const FREEZE_NOTICE_PREFIX: &str = "The target branch of this PR has been frozen. \
     If you want to merge, please invite the following peoples: @";
const FREEZE_NOTICE_SUFFIX: &str = " use the `/branch-freeze cancel` command to indicate \
     that the PR can be merged during the freezing period.";

/// Map a freeze status to the label correction it requires.
///
/// Every action is safe to re-run, and applying it yields a status that
/// resolves to [`FreezeAction::None`].
#[must_use]
#[allow(clippy::match_same_arms)] // One arm per cell keeps the table readable.
pub fn resolve(status: FreezeStatus, owners: &[String]) -> FreezeAction {
    use FreezeStatus::{Frozen, NotFrozen, Unknown};
    use LabelCombo::{Both, FreezeOnly, MergeableOnly, Neither};

    match status {
        Frozen(FreezeOnly) => FreezeAction::None,
        // Exemption already granted; the missing freeze label is not forced back.
        Frozen(MergeableOnly) => FreezeAction::None,
        Frozen(Neither) => FreezeAction::AddFreezeLabelAndNotify {
            owners: owners.to_vec(),
        },
        Frozen(Both) => FreezeAction::RemoveFreezeLabel,

        NotFrozen(Neither) => FreezeAction::None,
        NotFrozen(MergeableOnly) => FreezeAction::RemoveMergeableLabel,
        NotFrozen(FreezeOnly) => FreezeAction::RemoveFreezeLabel,
        NotFrozen(Both) => FreezeAction::RemoveBothLabels,

        Unknown => {
            warn!("unknown freeze status; leaving labels untouched");
            FreezeAction::None
        }
    }
}

/// Notice listing the owners who can exempt the PR.
#[must_use]
pub fn freeze_notice(owners: &[String]) -> String {
    format!(
        "{FREEZE_NOTICE_PREFIX}{}{FREEZE_NOTICE_SUFFIX}",
        owners.join(" , @")
    )
}

/// Perform `action` on `pr`.
///
/// # Errors
///
/// Returns the first forge error; later steps of the action are skipped.
pub async fn apply_action(
    forge: &dyn ForgeClient,
    labels: &LabelConfig,
    pr: &PrRef,
    action: &FreezeAction,
) -> Result<()> {
    match action {
        FreezeAction::None => Ok(()),
        FreezeAction::RemoveFreezeLabel => forge.remove_label(pr, &labels.freeze).await,
        FreezeAction::RemoveMergeableLabel => forge.remove_label(pr, &labels.mergeable).await,
        FreezeAction::RemoveBothLabels => {
            let both = [labels.freeze.clone(), labels.mergeable.clone()];
            forge.remove_labels(pr, &both).await
        }
        FreezeAction::AddFreezeLabelAndNotify { owners } => {
            forge.add_label(pr, &labels.freeze).await?;
            forge.create_comment(pr, &freeze_notice(owners)).await
        }
    }
}

/// Re-evaluate `pr` against the current freeze policy and fix its labels.
///
/// # Errors
///
/// Returns an error if the policy cannot be loaded or a forge call fails.
pub async fn check_freeze<'a, I>(
    forge: &dyn ForgeClient,
    file: &FreezeFileConfig,
    labels: &LabelConfig,
    pr: &PrRef,
    base_branch: &str,
    current_labels: I,
) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let state = LabelState::from_labels(current_labels, labels);
    let span = info_span!("check_freeze", %pr, base_branch);

    async move {
        let registry = RegistryLoader::load(forge, file).await?;
        let record = registry.record_for(&pr.org, &pr.repo);
        let is_frozen = record.is_some_and(|r| r.is_frozen(base_branch));
        let owners = record.map(|r| r.owners.as_slice()).unwrap_or_default();

        let status = classify_labels(is_frozen, state);
        let action = resolve(status, owners);
        info!(?status, ?action, "resolved freeze action");

        apply_action(forge, labels, pr, &action).await
    }
    .instrument(span)
    .await
}
