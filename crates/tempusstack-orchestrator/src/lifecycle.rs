//! セッション全体の管理
//!
//! アタッチ時は `up` の後に割り込みを待ち、`down` を一度だけ実行する。
//! 割り込みはキャンセルトークンとして伝わり、二度目以降は無視される。

use crate::error::{OrchestratorError, Result};
use crate::logs::{relay_logs, write_buffered_logs};
use crate::orchestrator::{DownReport, StackOrchestrator};
use futures_util::stream::{Stream, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempusstack_container::{
    ContainerDetails, LogOptions, ManagedContainerRef, container_name, list_managed,
    service_name_of, short_id,
};
use tempusstack_core::StackSpec;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// 一度だけ開くゲート
///
/// 最初の `interrupt` だけがトークンを発火させる。
#[derive(Debug, Default)]
pub struct InterruptGate {
    fired: AtomicBool,
    token: CancellationToken,
}

impl InterruptGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最初の呼び出しなら `true`
    pub fn interrupt(&self) -> bool {
        let first = !self.fired.swap(true, Ordering::SeqCst);
        if first {
            self.token.cancel();
        }
        first
    }

    pub fn is_interrupted(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub async fn interrupted(&self) {
        self.token.cancelled().await
    }
}

/// シグナルをゲートに流し込み、無視した回数を返す
pub async fn forward_interrupts<S>(gate: Arc<InterruptGate>, signals: S) -> usize
where
    S: Stream<Item = ()>,
{
    let mut signals = std::pin::pin!(signals);
    let mut ignored = 0;

    while signals.next().await.is_some() {
        if gate.interrupt() {
            info!("Interrupt received, tearing down the stack");
        } else {
            ignored += 1;
            warn!("Teardown already in progress, ignoring interrupt");
        }
    }

    ignored
}

/// Ctrl+C を受けるたびに一つ流れるストリーム
pub fn ctrl_c_signals() -> impl Stream<Item = ()> {
    futures_util::stream::unfold((), |()| async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Some(((), ())),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                None
            }
        }
    })
}

/// `up` セッションの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// デタッチ。コンテナは動いたまま
    Detached(Vec<ManagedContainerRef>),
    /// 割り込みを受けて撤去済み
    TornDown {
        started: Vec<ManagedContainerRef>,
        report: DownReport,
    },
}

/// `status` の一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedContainer {
    pub service: String,
    pub container_name: String,
    pub short_id: String,
    pub state: String,
    pub ports: Vec<String>,
}

pub struct LifecycleController {
    orchestrator: StackOrchestrator,
    gate: Arc<InterruptGate>,
}

impl LifecycleController {
    pub fn new(orchestrator: StackOrchestrator) -> Self {
        Self {
            orchestrator,
            gate: Arc::new(InterruptGate::new()),
        }
    }

    pub fn orchestrator(&self) -> &StackOrchestrator {
        &self.orchestrator
    }

    /// シグナル転送に渡すゲート
    pub fn gate(&self) -> Arc<InterruptGate> {
        Arc::clone(&self.gate)
    }

    /// スタックを起動する
    ///
    /// デタッチならすぐ返る。アタッチなら割り込みまで待ち、`down` を一度だけ実行して返る。
    pub async fn up(&self, stack: &StackSpec, detached: bool, verbose: bool) -> Result<SessionOutcome> {
        self.up_with(stack, detached, verbose, |_| {}).await
    }

    /// `up` と同じ。起動完了時（待機に入る前）に `on_ready` を呼ぶ
    pub async fn up_with<F>(
        &self,
        stack: &StackSpec,
        detached: bool,
        verbose: bool,
        on_ready: F,
    ) -> Result<SessionOutcome>
    where
        F: FnOnce(&[ManagedContainerRef]) + Send,
    {
        let started = self.orchestrator.up(stack, verbose).await?;
        on_ready(&started);

        if detached {
            info!(services = started.len(), "Stack started in the background");
            return Ok(SessionOutcome::Detached(started));
        }

        info!(services = started.len(), "Stack running, waiting for interrupt");
        self.gate.interrupted().await;

        // ここから先は割り込まれない
        let report = self.orchestrator.down(verbose).await;
        Ok(SessionOutcome::TornDown { started, report })
    }

    /// `up_with` にシグナル源を添えたもの
    ///
    /// アタッチ時は起動が全て成功してから `signals` をゲートにつなぐ。
    /// 起動中の割り込みはここでは拾わない（プロセス既定の動作に任せる）。
    /// デタッチ時や起動失敗時は `signals` を一度もポーリングしない。
    pub async fn session<S, F>(
        &self,
        stack: &StackSpec,
        detached: bool,
        verbose: bool,
        signals: S,
        on_ready: F,
    ) -> Result<SessionOutcome>
    where
        S: Stream<Item = ()> + Send + 'static,
        F: FnOnce(&[ManagedContainerRef]) + Send,
    {
        let gate = self.gate();
        self.up_with(stack, detached, verbose, move |started| {
            on_ready(started);
            if !detached {
                tokio::spawn(forward_interrupts(gate, signals));
            }
        })
        .await
    }

    pub async fn down(&self, verbose: bool) -> DownReport {
        self.orchestrator.down(verbose).await
    }

    /// 管理対象コンテナの一覧
    pub async fn status(&self) -> Result<Vec<ManagedContainer>> {
        let containers = list_managed(self.orchestrator.runtime()).await?;

        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let name = c.primary_name()?.to_string();
                let service = service_name_of(&name)?.to_string();
                Some(ManagedContainer {
                    service,
                    short_id: short_id(&c.id).to_string(),
                    container_name: name,
                    state: c.state,
                    ports: c.ports,
                })
            })
            .collect())
    }

    /// サービスのログを書き出す
    ///
    /// フォロー時は上流が終わるかゲートが発火するまで転送する。
    #[instrument(skip(self, options, sink))]
    pub async fn logs<W>(&self, service: &str, options: &LogOptions, sink: &mut W) -> Result<usize>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let details = self.resolve_service(service).await?;
        let mut stream = self
            .orchestrator
            .runtime()
            .logs(&details.id, options)
            .await?;

        if options.follow {
            relay_logs(&mut stream, sink, &self.gate.token()).await
        } else {
            write_buffered_logs(&mut stream, sink).await
        }
    }

    /// サービスのコンテナを再起動する。ランタイムのエラーはそのまま返す
    pub async fn restart(&self, service: &str, verbose: bool) -> Result<ManagedContainerRef> {
        let details = self.resolve_service(service).await?;

        progress!(verbose, service = %service, "Restarting container");
        self.orchestrator
            .runtime()
            .restart_container(&details.id)
            .await?;

        Ok(ManagedContainerRef::new(service, details.id))
    }

    /// サービス名から既存コンテナを引く。調べられなければ `ServiceNotFound`
    async fn resolve_service(&self, service: &str) -> Result<ContainerDetails> {
        let name = container_name(service);
        self.orchestrator
            .runtime()
            .inspect_container(&name)
            .await
            .map_err(|e| {
                debug!(container = %name, error = %e, "Cannot inspect service container");
                OrchestratorError::ServiceNotFound {
                    service: service.to_string(),
                }
            })
    }
}

impl std::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("orchestrator", &self.orchestrator)
            .field("interrupted", &self.gate.is_interrupted())
            .finish()
    }
}
