//! Unit tests for freeze command label transitions and reply texts.

use branch_freezer::freeze::gate::{
    command_edits, invalid_command_comment, no_permission_comment, LabelEdit, LabelKind,
};
use branch_freezer::models::freeze::{Command, LabelState};

fn state(has_freeze: bool, has_mergeable: bool) -> LabelState {
    LabelState {
        has_freeze,
        has_mergeable,
    }
}

#[test]
fn freeze_adds_freeze_label_when_absent() {
    assert_eq!(
        command_edits(Command::BranchFreeze, state(false, false)),
        vec![LabelEdit::Add(LabelKind::Freeze)]
    );
}

#[test]
fn freeze_removes_exemption_before_adding_freeze_label() {
    assert_eq!(
        command_edits(Command::BranchFreeze, state(false, true)),
        vec![
            LabelEdit::Remove(LabelKind::Mergeable),
            LabelEdit::Add(LabelKind::Freeze),
        ]
    );
}

#[test]
fn freeze_is_idempotent_on_blocked_pr() {
    assert!(command_edits(Command::BranchFreeze, state(true, false)).is_empty());
}

#[test]
fn cancel_adds_exemption_before_removing_freeze_label() {
    assert_eq!(
        command_edits(Command::BranchFreezeCancel, state(true, false)),
        vec![
            LabelEdit::Add(LabelKind::Mergeable),
            LabelEdit::Remove(LabelKind::Freeze),
        ]
    );
}

#[test]
fn cancel_is_idempotent_on_exempted_pr() {
    assert!(command_edits(Command::BranchFreezeCancel, state(false, true)).is_empty());
}

#[test]
fn check_command_has_no_edits() {
    assert!(command_edits(Command::CheckFreeze, state(true, true)).is_empty());
}

#[test]
fn invalid_command_text() {
    assert_eq!(
        invalid_command_comment("alice"),
        "@alice Invalid command: The target branch of this PR is not frozen."
    );
}

#[test]
fn no_permission_text_names_command() {
    assert_eq!(
        no_permission_comment("mallory", Command::BranchFreeze),
        "@mallory you do not have permission to use the `/branch-freeze` command."
    );
    assert_eq!(
        no_permission_comment("mallory", Command::BranchFreezeCancel),
        "@mallory you do not have permission to use the `/branch-freeze cancel` command."
    );
}
