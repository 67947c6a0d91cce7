//! Unit tests for the freeze decision table.
//!
//! Covers every (frozen, freeze label, mergeable label) cell, and checks
//! that applying the resolved action converges: re-classifying the
//! corrected labels resolves to no further action.

use branch_freezer::freeze::classifier::classify;
use branch_freezer::freeze::resolver::{freeze_notice, resolve};
use branch_freezer::models::freeze::{FreezeAction, FreezeStatus, LabelState};

fn owners(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_owned()).collect()
}

/// The label state after `action` has been applied to `labels`.
fn apply(labels: LabelState, action: &FreezeAction) -> LabelState {
    match action {
        FreezeAction::None => labels,
        FreezeAction::RemoveFreezeLabel => LabelState {
            has_freeze: false,
            ..labels
        },
        FreezeAction::RemoveMergeableLabel => LabelState {
            has_mergeable: false,
            ..labels
        },
        FreezeAction::RemoveBothLabels => LabelState::default(),
        FreezeAction::AddFreezeLabelAndNotify { .. } => LabelState {
            has_freeze: true,
            ..labels
        },
    }
}

const CELLS: [(bool, bool, bool); 8] = [
    (true, true, false),
    (true, false, true),
    (true, false, false),
    (true, true, true),
    (false, false, false),
    (false, false, true),
    (false, true, false),
    (false, true, true),
];

// ─── Decision table ──────────────────────────────────────────────────

#[test]
fn frozen_cells() {
    let o = owners(&["alice", "bob"]);
    assert_eq!(resolve(classify(true, true, false), &o), FreezeAction::None);
    assert_eq!(resolve(classify(true, false, true), &o), FreezeAction::None);
    assert_eq!(
        resolve(classify(true, false, false), &o),
        FreezeAction::AddFreezeLabelAndNotify { owners: o.clone() }
    );
    assert_eq!(
        resolve(classify(true, true, true), &o),
        FreezeAction::RemoveFreezeLabel
    );
}

#[test]
fn not_frozen_cells() {
    let o = owners(&["alice"]);
    assert_eq!(resolve(classify(false, false, false), &o), FreezeAction::None);
    assert_eq!(
        resolve(classify(false, false, true), &o),
        FreezeAction::RemoveMergeableLabel
    );
    assert_eq!(
        resolve(classify(false, true, false), &o),
        FreezeAction::RemoveFreezeLabel
    );
    assert_eq!(
        resolve(classify(false, true, true), &o),
        FreezeAction::RemoveBothLabels
    );
}

#[test]
fn unknown_status_is_a_no_op() {
    assert_eq!(
        resolve(FreezeStatus::Unknown, &owners(&["alice"])),
        FreezeAction::None
    );
}

// ─── Convergence ─────────────────────────────────────────────────────

#[test]
fn resolved_action_converges_in_one_step() {
    let o = owners(&["alice"]);
    for (frozen, has_freeze, has_mergeable) in CELLS {
        let before = LabelState {
            has_freeze,
            has_mergeable,
        };
        let action = resolve(classify(frozen, has_freeze, has_mergeable), &o);
        let after = apply(before, &action);
        let again = resolve(classify(frozen, after.has_freeze, after.has_mergeable), &o);
        assert_eq!(
            again,
            FreezeAction::None,
            "cell ({frozen}, {has_freeze}, {has_mergeable}) did not converge"
        );
    }
}

#[test]
fn frozen_pr_with_both_labels_keeps_exemption() {
    let before = LabelState {
        has_freeze: true,
        has_mergeable: true,
    };
    let after = apply(before, &resolve(classify(true, true, true), &[]));
    assert!(after.has_mergeable);
    assert!(!after.has_freeze);
}

// ─── Notice text ─────────────────────────────────────────────────────

#[test]
fn notice_lists_owners_with_separator() {
    let notice = freeze_notice(&owners(&["alice", "bob"]));
    assert!(notice.contains("@alice , @bob"));
    assert!(notice.contains("`/branch-freeze cancel`"));
    assert!(notice.starts_with("The target branch of this PR has been frozen."));
}

#[test]
fn notice_with_single_owner() {
    let notice = freeze_notice(&owners(&["carol"]));
    assert!(notice.contains("peoples: @carol use the"));
}
