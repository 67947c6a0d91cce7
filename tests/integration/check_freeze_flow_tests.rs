//! Integration tests for the load → classify → resolve → apply flow.

use branch_freezer::freeze::resolver::{check_freeze, freeze_notice};
use branch_freezer::AppError;

use super::test_helpers::{
    freeze_file, labels, pr, ForgeCall, RecordingForge, FREEZE, MERGEABLE, POLICY,
};

async fn run(forge: &RecordingForge, base: &str, current: &[&str]) -> branch_freezer::Result<()> {
    check_freeze(
        forge,
        &freeze_file(),
        &labels(),
        &pr(1),
        base,
        current.iter().copied(),
    )
    .await
}

#[tokio::test]
async fn policy_is_fetched_from_configured_location() {
    let forge = RecordingForge::with_policy(POLICY);
    run(&forge, "release-1", &[FREEZE]).await.unwrap();

    assert_eq!(
        forge.calls()[0],
        ForgeCall::GetContent {
            org: "infra".into(),
            repo: "community".into(),
            path: "sig/freeze.yaml".into(),
            git_ref: "master".into(),
        }
    );
}

#[tokio::test]
async fn frozen_unlabelled_pr_is_blocked_and_owners_notified() {
    let forge = RecordingForge::with_policy(POLICY);
    run(&forge, "release-1", &["kind/bug"]).await.unwrap();

    let notice = freeze_notice(&["alice".to_owned(), "bob".to_owned()]);
    assert!(notice.contains("@alice , @bob"));
    assert_eq!(
        forge.writes(),
        vec![
            ForgeCall::AddLabel(1, FREEZE.into()),
            ForgeCall::Comment(1, notice),
        ]
    );
}

#[tokio::test]
async fn frozen_pr_with_both_labels_only_loses_freeze_label() {
    let forge = RecordingForge::with_policy(POLICY);
    run(&forge, "release-1", &[FREEZE, MERGEABLE]).await.unwrap();

    assert_eq!(forge.writes(), vec![ForgeCall::RemoveLabel(1, FREEZE.into())]);
}

#[tokio::test]
async fn frozen_blocked_pr_is_left_alone() {
    let forge = RecordingForge::with_policy(POLICY);
    run(&forge, "release-1", &[FREEZE]).await.unwrap();
    assert!(forge.writes().is_empty());
}

#[tokio::test]
async fn frozen_exempted_pr_is_left_alone() {
    let forge = RecordingForge::with_policy(POLICY);
    run(&forge, "release-1", &[MERGEABLE]).await.unwrap();
    assert!(forge.writes().is_empty());
}

#[tokio::test]
async fn unfrozen_branch_drops_both_stale_labels() {
    let forge = RecordingForge::with_policy(POLICY);
    run(&forge, "master", &[FREEZE, MERGEABLE]).await.unwrap();

    assert_eq!(
        forge.writes(),
        vec![ForgeCall::RemoveLabels(
            1,
            vec![FREEZE.to_owned(), MERGEABLE.to_owned()]
        )]
    );
}

#[tokio::test]
async fn unfrozen_branch_drops_stale_exemption() {
    let forge = RecordingForge::with_policy(POLICY);
    run(&forge, "master", &[MERGEABLE]).await.unwrap();
    assert_eq!(
        forge.writes(),
        vec![ForgeCall::RemoveLabel(1, MERGEABLE.into())]
    );
}

#[tokio::test]
async fn repo_missing_from_policy_counts_as_not_frozen() {
    let forge = RecordingForge::with_policy("freeze_items: []\n");
    run(&forge, "release-1", &[FREEZE]).await.unwrap();
    assert_eq!(forge.writes(), vec![ForgeCall::RemoveLabel(1, FREEZE.into())]);
}

#[tokio::test]
async fn other_repos_frozen_branch_does_not_apply() {
    // o/other freezes master, o/r does not.
    let forge = RecordingForge::with_policy(POLICY);
    run(&forge, "master", &[]).await.unwrap();
    assert!(forge.writes().is_empty());
}

#[tokio::test]
async fn registry_fetch_failure_aborts_without_writes() {
    let forge = RecordingForge::unreachable();
    let result = run(&forge, "release-1", &[]).await;

    assert!(matches!(result, Err(AppError::Forge(_))));
    assert!(forge.writes().is_empty());
}

#[tokio::test]
async fn undecodable_policy_is_a_registry_error() {
    let forge = RecordingForge::with_policy("freeze_items: [");
    let result = run(&forge, "release-1", &[]).await;

    assert!(matches!(result, Err(AppError::Registry(_))));
    assert!(forge.writes().is_empty());
}

#[tokio::test]
async fn failed_label_add_skips_notice() {
    let forge = RecordingForge {
        fail_add_label: true,
        ..RecordingForge::with_policy(POLICY)
    };
    let result = run(&forge, "release-1", &[]).await;

    assert!(matches!(result, Err(AppError::Forge(_))));
    assert!(forge.comments().is_empty());
}

#[tokio::test]
async fn policy_is_reloaded_on_every_check() {
    let forge = RecordingForge::with_policy(POLICY);
    run(&forge, "release-1", &[FREEZE]).await.unwrap();
    run(&forge, "release-1", &[FREEZE]).await.unwrap();

    let fetches = forge
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ForgeCall::GetContent { .. }))
        .count();
    assert_eq!(fetches, 2);
}
