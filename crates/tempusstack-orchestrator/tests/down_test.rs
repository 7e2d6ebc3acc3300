//! スタック撤去のテスト

mod common;

use common::{managed_names, orchestrator};
use std::sync::Arc;
use tempusstack_container::test_support::FakeRuntime;
use tempusstack_core::{ServiceSpec, StackSpec};

#[tokio::test]
async fn test_down_is_idempotent() {
    let runtime = Arc::new(FakeRuntime::new());
    let orchestrator = orchestrator(&runtime);

    let first = orchestrator.down(false).await;
    let second = orchestrator.down(false).await;

    assert!(first.nothing_found());
    assert!(second.nothing_found());
    assert!(runtime.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_single_service_scenario() {
    let runtime = Arc::new(FakeRuntime::new());
    let orchestrator = orchestrator(&runtime);
    let stack = StackSpec::new().with_service(ServiceSpec::docker("db", "alpine"));

    let started = orchestrator.up(&stack, false).await.unwrap();
    assert_eq!(started.len(), 1);
    assert_eq!(managed_names(&runtime), vec!["tempusstack_db"]);

    let report = orchestrator.down(false).await;
    assert_eq!(report.found, 1);
    assert_eq!(report.removed, 1);
    assert!(report.is_clean());
    assert!(managed_names(&runtime).is_empty());
}

#[tokio::test]
async fn test_down_stops_running_and_removes_stopped() {
    let runtime = Arc::new(FakeRuntime::new());
    let running = runtime.add_container("tempusstack_web", "nginx", true);
    let stopped = runtime.add_container("tempusstack_job", "busybox", false);
    runtime.add_container("someone_else", "nginx", true);

    let report = orchestrator(&runtime).down(false).await;

    assert_eq!(report.found, 2);
    assert_eq!(report.removed, 2);
    assert_eq!(runtime.count_calls(&format!("stop:{}", running)), 1);
    assert_eq!(runtime.count_calls(&format!("stop:{}", stopped)), 0);
    assert_eq!(runtime.container_names(), vec!["someone_else"]);
}

#[tokio::test]
async fn test_down_continues_after_individual_failure() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.add_container("tempusstack_a", "busybox", true);
    runtime.add_container("tempusstack_b", "busybox", true);
    runtime.fail_stop("tempusstack_a");

    let report = orchestrator(&runtime).down(false).await;

    assert_eq!(report.found, 2);
    assert_eq!(report.removed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].0, "tempusstack_a");
    assert!(runtime.container("tempusstack_b").is_none());
    // 停止できなかった a は残り続ける
    assert_eq!(report.stragglers, 1);
}

#[tokio::test]
async fn test_down_reports_stragglers() {
    let runtime = Arc::new(FakeRuntime::new());
    let stuck = runtime.add_container("tempusstack_a", "busybox", true);
    runtime.add_container("tempusstack_b", "busybox", true);
    runtime.survive_removal("tempusstack_a");

    let report = orchestrator(&runtime).down(false).await;

    assert_eq!(report.found, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.stragglers, 1);
    assert!(!report.is_clean());
    assert!(runtime.container("tempusstack_b").is_none());
    assert_eq!(runtime.container("tempusstack_a").unwrap().id, stuck);
}

#[tokio::test]
async fn test_down_polls_until_budget_exhausted() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.add_container("tempusstack_zombie", "busybox", false);
    runtime.survive_removal("tempusstack_zombie");

    let report = orchestrator(&runtime).down(false).await;

    assert_eq!(report.stragglers, 1);
    // 最初の一覧取得 + ポーリング3回
    assert_eq!(runtime.count_calls("list"), 4);
}

#[tokio::test]
async fn test_down_never_fails_when_runtime_unreachable() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.add_container("tempusstack_db", "postgres:15", true);
    runtime.set_unreachable(true);

    let report = orchestrator(&runtime).down(false).await;

    assert_eq!(report.found, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn test_down_is_not_clean_when_confirmation_polls_fail() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.add_container("tempusstack_a", "busybox", true);
    runtime.survive_removal("tempusstack_a");
    // 最初の一覧取得だけ成功し、確認のポーリングは全て失敗する
    runtime.fail_list_after(1);

    let report = orchestrator(&runtime).down(false).await;

    assert_eq!(report.found, 1);
    assert_eq!(report.removed, 1);
    assert_eq!(report.stragglers, 1);
    assert!(!report.is_clean());
    assert!(
        report
            .errors
            .iter()
            .any(|(target, message)| target == "*" && message.contains("could not confirm removal"))
    );
    assert_eq!(managed_names(&runtime), vec!["tempusstack_a"]);
}
