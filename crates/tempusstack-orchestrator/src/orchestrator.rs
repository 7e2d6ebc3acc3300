//! スタック全体の起動と撤去

use crate::error::{OrchestratorError, Result};
use crate::handler::HandlerRegistry;
use crate::settings::OrchestratorSettings;
use std::sync::Arc;
use tempusstack_container::{
    ContainerError, ManagedContainerRef, RemovalOutcome, RuntimeClient, list_managed, service_name_of,
    stop_and_remove,
};
use tempusstack_core::{ServiceSpec, StackSpec};
use tracing::{error, info, instrument, warn};

/// `down` の結果。`down` 自体は失敗しない
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownReport {
    /// 見つかった管理対象コンテナ数
    pub found: usize,
    pub removed: usize,
    pub failed: usize,
    /// 確認ポーリング後も残っていた数
    pub stragglers: usize,
    /// `(container, message)`
    pub errors: Vec<(String, String)>,
}

impl DownReport {
    pub fn nothing_found(&self) -> bool {
        self.found == 0 && self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.stragglers == 0 && self.errors.is_empty()
    }
}

pub struct StackOrchestrator {
    runtime: Arc<dyn RuntimeClient>,
    registry: HandlerRegistry,
    settings: OrchestratorSettings,
}

impl StackOrchestrator {
    /// 組み込みハンドラーで構成する
    pub fn new(runtime: Arc<dyn RuntimeClient>, settings: OrchestratorSettings) -> Self {
        let registry = HandlerRegistry::with_builtins(settings.pull);
        Self::with_registry(runtime, registry, settings)
    }

    pub fn with_registry(
        runtime: Arc<dyn RuntimeClient>,
        registry: HandlerRegistry,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            runtime,
            registry,
            settings,
        }
    }

    pub fn runtime(&self) -> &dyn RuntimeClient {
        self.runtime.as_ref()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// 宣言順にサービスを起動する
    ///
    /// 最初の失敗で残りは試さない。失敗時は管理対象を全て撤去してから
    /// `StackStart` を返す（今回起動したものに限らない）。
    #[instrument(skip(self, stack), fields(services = stack.len()))]
    pub async fn up(&self, stack: &StackSpec, verbose: bool) -> Result<Vec<ManagedContainerRef>> {
        let mut started = Vec::with_capacity(stack.len());
        let mut failure = None;

        for spec in stack.services() {
            match self.start_service(spec, verbose).await {
                Ok(container) => {
                    info!(
                        service = %container.service,
                        container = %container.short_id(),
                        "Service started"
                    );
                    started.push(container);
                }
                Err(e) => {
                    error!(service = %spec.name, error = %e, "Service failed to start");
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(cause) = failure {
            warn!("One or more services failed to start, cleaning up");
            let report = self.down(verbose).await;
            if !report.is_clean() {
                warn!(
                    failed = report.failed,
                    stragglers = report.stragglers,
                    "Cleanup after failed start was incomplete"
                );
            }
            return Err(OrchestratorError::StackStart {
                source: Box::new(cause),
            });
        }

        Ok(started)
    }

    async fn start_service(&self, spec: &ServiceSpec, verbose: bool) -> Result<ManagedContainerRef> {
        // ランタイムに触れる前に解決する
        let handler = self.registry.resolve(&spec.service_type)?;
        progress!(verbose, service = %spec.name, service_type = %spec.service_type, "Starting service");

        let id = handler
            .run(self.runtime.as_ref(), &spec.name, spec, verbose)
            .await
            .map_err(|source| OrchestratorError::ServiceStart {
                service: spec.name.clone(),
                source,
            })?;

        Ok(ManagedContainerRef::new(&spec.name, id))
    }

    /// 管理対象コンテナを全て停止・削除する
    ///
    /// 個々の失敗は記録して続行する。最後に一覧が空になるまで一定間隔で確認する。
    #[instrument(skip(self))]
    pub async fn down(&self, verbose: bool) -> DownReport {
        let mut report = DownReport::default();

        let containers = match list_managed(self.runtime.as_ref()).await {
            Ok(containers) => containers,
            Err(e) => {
                warn!(error = %e, "Failed to list managed containers");
                report.errors.push(("*".to_string(), e.to_string()));
                return report;
            }
        };

        if containers.is_empty() {
            info!("No tempusstack containers found");
            return report;
        }
        report.found = containers.len();

        for container in &containers {
            let name = container.primary_name().unwrap_or(&container.id).to_string();
            let service = service_name_of(&name).unwrap_or(&name);

            match stop_and_remove(self.runtime.as_ref(), &container.id, self.settings.stop_grace)
                .await
            {
                Ok(RemovalOutcome::Removed) => {
                    progress!(verbose, service = %service, container = %name, "Container removed");
                    report.removed += 1;
                }
                Ok(RemovalOutcome::AlreadyGone) => {
                    progress!(verbose, service = %service, container = %name, "Container already gone");
                    report.removed += 1;
                }
                Err(e) => {
                    warn!(service = %service, container = %name, error = %e, "Failed to remove container");
                    report.failed += 1;
                    report.errors.push((name.clone(), e.to_string()));
                }
            }
        }

        let (remaining, poll_error) = self.wait_until_gone(report.found).await;
        report.stragglers = remaining;
        if let Some(e) = poll_error {
            // 確認できなかった分は残っているものとして扱う
            report
                .errors
                .push(("*".to_string(), format!("could not confirm removal: {}", e)));
        }
        if report.stragglers > 0 {
            warn!(
                count = report.stragglers,
                "Managed containers still present after cleanup"
            );
        }

        report
    }

    /// 管理対象が無くなるまで待ち、残った数を返す
    ///
    /// 一覧取得に失敗した回は直前に分かっていた数を残数とみなす。
    /// 最後の確認が失敗で終わった場合はそのエラーも返す。
    async fn wait_until_gone(&self, last_known: usize) -> (usize, Option<ContainerError>) {
        let attempts = self.settings.poll_attempts.max(1);
        let mut remaining = last_known;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match list_managed(self.runtime.as_ref()).await {
                Ok(containers) if containers.is_empty() => return (0, None),
                Ok(containers) => {
                    remaining = containers.len();
                    last_error = None;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Failed to poll managed containers");
                    last_error = Some(e);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }

        (remaining, last_error)
    }
}

impl std::fmt::Debug for StackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackOrchestrator")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
