//! サービス種別ごとの起動戦略
//!
//! ハンドラーは `tempusstack_<name>` のコンテナを一つだけ実行状態にして、そのIDを返す。
//! 同名のコンテナが既に実行中ならそれを再利用し、停止中なら強制削除してから作り直す。

mod docker;
mod mock;
mod registry;

pub use docker::DockerHandler;
pub use mock::{MOCK_DEFAULT_PORT, MOCK_IMAGE, MOCK_RESPONSES_PATH, MockHandler, load_responses};
pub use registry::HandlerRegistry;

use crate::error::HandlerError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tempusstack_container::{ContainerSpec, LABEL_SERVICE, LABEL_TYPE, RuntimeClient};
use tempusstack_core::ServiceSpec;

#[async_trait]
pub trait ServiceHandler: Send + Sync {
    /// 登録名（`docker`, `mock` など）
    fn service_type(&self) -> &str;

    /// サービスを実行状態にしてコンテナIDを返す
    async fn run(
        &self,
        runtime: &dyn RuntimeClient,
        name: &str,
        spec: &ServiceSpec,
        verbose: bool,
    ) -> Result<String, HandlerError>;
}

/// 同名の既存コンテナを確認する
///
/// 実行中なら `Some(id)`。停止中なら強制削除して `None`。存在しなければ `None`。
pub(crate) async fn reuse_or_clear(
    runtime: &dyn RuntimeClient,
    container_name: &str,
    verbose: bool,
) -> Result<Option<String>, HandlerError> {
    let details = match runtime.inspect_container(container_name).await {
        Ok(details) => details,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if details.running {
        progress!(verbose, container = %container_name, "Container already running, reusing it");
        return Ok(Some(details.id));
    }

    progress!(verbose, container = %container_name, "Removing stopped container to recreate it");
    match runtime.remove_container(&details.id, true).await {
        Ok(()) => Ok(None),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// 作成して起動する
pub(crate) async fn create_and_start(
    runtime: &dyn RuntimeClient,
    spec: &ContainerSpec,
    verbose: bool,
) -> Result<String, HandlerError> {
    let id = runtime.create_container(spec).await?;
    progress!(verbose, container = %spec.name, id = %id, "Container created");

    runtime.start_container(&id).await?;
    progress!(verbose, container = %spec.name, "Container started");

    Ok(id)
}

/// 作成するコンテナに付ける所有ラベル
pub(crate) fn ownership_labels(service: &str, service_type: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(LABEL_SERVICE.to_string(), service.to_string());
    labels.insert(LABEL_TYPE.to_string(), service_type.to_string());
    labels
}
