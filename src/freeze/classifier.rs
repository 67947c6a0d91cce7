//! Freeze status classification.

use crate::models::freeze::{FreezeStatus, LabelCombo, LabelState};

/// Classify a PR from whether its target branch is frozen and which of the
/// two freeze labels it carries.
///
/// Pure and total: every input maps to a `Frozen` or `NotFrozen` variant.
#[must_use]
pub fn classify(is_frozen: bool, has_freeze: bool, has_mergeable: bool) -> FreezeStatus {
    let combo = match (has_freeze, has_mergeable) {
        (false, false) => LabelCombo::Neither,
        (true, false) => LabelCombo::FreezeOnly,
        (false, true) => LabelCombo::MergeableOnly,
        (true, true) => LabelCombo::Both,
    };

    if is_frozen {
        FreezeStatus::Frozen(combo)
    } else {
        FreezeStatus::NotFrozen(combo)
    }
}

/// [`classify`] for a derived [`LabelState`].
#[must_use]
pub fn classify_labels(is_frozen: bool, labels: LabelState) -> FreezeStatus {
    classify(is_frozen, labels.has_freeze, labels.has_mergeable)
}
