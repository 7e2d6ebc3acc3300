//! テスト共通ヘルパー

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tempusstack_container::PullPolicy;
use tempusstack_container::test_support::FakeRuntime;
use tempusstack_orchestrator::{LifecycleController, OrchestratorSettings, StackOrchestrator};

/// 待ち時間を詰めた設定
pub fn fast_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        pull: PullPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(1),
        },
        stop_grace: Duration::from_secs(1),
        poll_attempts: 3,
        poll_interval: Duration::from_millis(1),
        ..Default::default()
    }
}

pub fn orchestrator(runtime: &Arc<FakeRuntime>) -> StackOrchestrator {
    StackOrchestrator::new(runtime.clone(), fast_settings())
}

pub fn controller(runtime: &Arc<FakeRuntime>) -> LifecycleController {
    LifecycleController::new(orchestrator(runtime))
}

/// 管理対象として見えているコンテナ名
pub fn managed_names(runtime: &FakeRuntime) -> Vec<String> {
    runtime
        .container_names()
        .into_iter()
        .filter(|n| n.starts_with("tempusstack_"))
        .collect()
}
