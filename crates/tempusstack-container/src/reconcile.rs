//! 管理対象コンテナの発見と撤去

use crate::error::Result;
use crate::naming::is_managed;
use crate::runtime::{ContainerSummary, RuntimeClient};
use std::time::Duration;
use tracing::debug;

/// 撤去の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    /// 途中で既に消えていた
    AlreadyGone,
}

/// 名前の接頭辞で管理対象コンテナを列挙（停止中も含む）
pub async fn list_managed(runtime: &dyn RuntimeClient) -> Result<Vec<ContainerSummary>> {
    let containers = runtime.list_containers().await?;
    Ok(containers
        .into_iter()
        .filter(|c| c.names.iter().any(|n| is_managed(n)))
        .collect())
}

/// 実行中なら停止してから削除する
///
/// 既に消えている（404）・既に停止済み（304）は失敗扱いにしない。
pub async fn stop_and_remove(
    runtime: &dyn RuntimeClient,
    id: &str,
    grace: Duration,
) -> Result<RemovalOutcome> {
    let details = match runtime.inspect_container(id).await {
        Ok(details) => details,
        Err(e) if e.is_not_found() => return Ok(RemovalOutcome::AlreadyGone),
        Err(e) => return Err(e),
    };

    if details.running {
        match runtime.stop_container(id, grace).await {
            Ok(()) => debug!(container = %id, "Container stopped"),
            Err(e) if e.is_not_found() => return Ok(RemovalOutcome::AlreadyGone),
            Err(e) if e.is_not_modified() => debug!(container = %id, "Container already stopped"),
            Err(e) => return Err(e),
        }
    }

    match runtime.remove_container(id, false).await {
        Ok(()) => Ok(RemovalOutcome::Removed),
        Err(e) if e.is_not_found() => Ok(RemovalOutcome::AlreadyGone),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRuntime;

    const GRACE: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_list_managed_filters_by_prefix() {
        let runtime = FakeRuntime::new();
        runtime.add_container("tempusstack_db", "postgres:15", true);
        runtime.add_container("tempusstack_cache", "redis:7", false);
        runtime.add_container("unrelated", "nginx", true);

        let managed = list_managed(&runtime).await.unwrap();
        let names: Vec<_> = managed.iter().filter_map(|c| c.primary_name()).collect();
        assert_eq!(names, vec!["tempusstack_db", "tempusstack_cache"]);
    }

    #[tokio::test]
    async fn test_stop_and_remove_running() {
        let runtime = FakeRuntime::new();
        let id = runtime.add_container("tempusstack_db", "postgres:15", true);

        let outcome = stop_and_remove(&runtime, &id, GRACE).await.unwrap();
        assert_eq!(outcome, RemovalOutcome::Removed);
        assert!(runtime.container("tempusstack_db").is_none());
        assert_eq!(runtime.count_calls("stop:"), 1);
    }

    #[tokio::test]
    async fn test_stopped_container_skips_stop() {
        let runtime = FakeRuntime::new();
        let id = runtime.add_container("tempusstack_db", "postgres:15", false);

        stop_and_remove(&runtime, &id, GRACE).await.unwrap();
        assert_eq!(runtime.count_calls("stop:"), 0);
        assert_eq!(runtime.count_calls("remove:"), 1);
    }

    #[tokio::test]
    async fn test_missing_container_is_already_gone() {
        let runtime = FakeRuntime::new();

        let outcome = stop_and_remove(&runtime, "nope", GRACE).await.unwrap();
        assert_eq!(outcome, RemovalOutcome::AlreadyGone);
    }

    #[tokio::test]
    async fn test_unreachable_runtime_propagates() {
        let runtime = FakeRuntime::new();
        let id = runtime.add_container("tempusstack_db", "postgres:15", true);
        runtime.set_unreachable(true);

        assert!(stop_and_remove(&runtime, &id, GRACE).await.is_err());
    }
}
