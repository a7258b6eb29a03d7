mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use yamlsync_core::{Change, CommitId, TenantId};
use yamlsync_engine::QuarantineCache;

#[tokio::test(start_paused = true)]
async fn quota_rejected_commit_is_skipped_until_the_ttl_passes() {
    let first = workflow_path(1);
    let second = workflow_path(2);
    let handler = Arc::new(RecordingHandler::new().over_quota(&first));
    let engine = builder(&handler).build().expect("engine");

    let err = engine
        .process_change_set(
            &ctx(),
            vec![Change::add(first.as_str(), "name: one", TENANT).with_commit("c1")],
            true,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.batch().and_then(|b| b.message_for(&first)),
        Some("Usage limits exceeded: workflow limit reached")
    );

    let skipped = engine
        .process_change_set(
            &ctx(),
            vec![Change::add(second.as_str(), "name: two", TENANT).with_commit("c1")],
            true,
        )
        .await
        .expect("quarantined change is not a failure");
    assert!(skipped.is_empty());
    assert_eq!(handler.call_paths(), [first.clone()]);

    tokio::time::advance(Duration::from_secs(30 * 60 + 1)).await;

    let applied = engine
        .process_change_set(
            &ctx(),
            vec![Change::add(second.as_str(), "name: two", TENANT).with_commit("c1")],
            true,
        )
        .await
        .expect("applied after expiry");
    assert_eq!(applied.len(), 1);
    assert_eq!(handler.call_paths(), [first, second]);
}

#[tokio::test(start_paused = true)]
async fn later_units_of_the_same_commit_are_skipped_within_a_batch() {
    let pipeline = "Setup/Applications/app1/Pipelines/release.yaml";
    let handler = Arc::new(RecordingHandler::new().over_quota(WF));
    let engine = builder(&handler).build().expect("engine");

    let err = engine
        .process_change_set(
            &ctx(),
            vec![
                Change::add(WF, "name: wf1", TENANT).with_commit("c1"),
                Change::add(pipeline, "name: release", TENANT).with_commit("c1"),
            ],
            true,
        )
        .await
        .unwrap_err();

    let failure = err.batch().expect("batch failure");
    assert_eq!(failure.failures.len(), 1);
    assert!(failure.message_for(pipeline).is_none());
    assert!(failure.units.is_empty());
    assert_eq!(handler.call_paths(), [WF]);
}

#[tokio::test(start_paused = true)]
async fn changes_without_a_commit_are_never_quarantined() {
    let handler = Arc::new(RecordingHandler::new().over_quota(WF));
    let engine = builder(&handler).build().expect("engine");

    for _ in 0..2 {
        let _ = engine
            .process_change_set(&ctx(), vec![Change::add(WF, "name: wf1", TENANT)], false)
            .await;
    }

    assert_eq!(handler.calls().len(), 2);
    assert!(engine.quarantine().is_empty());
}

#[tokio::test(start_paused = true)]
async fn engines_sharing_a_cache_share_quarantine() {
    let shared = Arc::new(QuarantineCache::new(Duration::from_secs(60)));
    shared.mark_exceeded(&CommitId::from("c9"), &TenantId::from(TENANT));

    let handler = Arc::new(RecordingHandler::new());
    let engine = builder(&handler)
        .quarantine(Arc::clone(&shared))
        .build()
        .expect("engine");

    let applied = engine
        .process_change_set(
            &ctx(),
            vec![Change::add(APP, "name: app1", TENANT).with_commit("c9")],
            true,
        )
        .await
        .expect("skipped");
    assert!(applied.is_empty());
    assert!(handler.calls().is_empty());

    let other_tenant = yamlsync_engine::ApplyContext::new("acc-2");
    let applied = engine
        .process_change_set(
            &other_tenant,
            vec![Change::add(APP, "name: app1", "acc-2").with_commit("c9")],
            true,
        )
        .await
        .expect("applied for other tenant");
    assert_eq!(applied.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_entries_are_swept_by_later_change_sets() {
    let shared = Arc::new(QuarantineCache::new(Duration::from_secs(30 * 60)));
    let tenant = TenantId::from(TENANT);
    for n in 0..100 {
        shared.mark_exceeded(&CommitId::from(format!("c{n}")), &tenant);
    }

    let handler = Arc::new(RecordingHandler::new());
    let engine = builder(&handler)
        .quarantine(Arc::clone(&shared))
        .build()
        .expect("engine");

    engine
        .process_change_set(&ctx(), vec![Change::add(APP, "name: app1", TENANT)], false)
        .await
        .expect("applied");
    assert_eq!(engine.quarantine().len(), 100);

    tokio::time::advance(Duration::from_secs(3 * 60 * 60)).await;

    engine
        .process_change_set(&ctx(), vec![Change::add(APP, "name: app1", TENANT)], false)
        .await
        .expect("applied");
    assert!(engine.quarantine().is_empty());
}
