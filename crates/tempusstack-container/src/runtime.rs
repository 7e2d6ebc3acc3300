use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;

/// フォローモードのログ転送に使うチャネル容量
///
/// 受信側が詰まると送信側タスクが待たされ、上流の読み取りも止まる。
pub const LOG_CHANNEL_CAPACITY: usize = 64;

/// コンテナランタイムへの最小限の操作セット
///
/// オーケストレーターとハンドラーはこのトレイト越しにのみランタイムに触れる。
/// プロセス起動時に一度だけ生成し、明示的に引き回す。
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// 停止中を含む全コンテナ
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>>;

    async fn inspect_container(&self, id_or_name: &str) -> Result<ContainerDetails>;

    /// イメージを取得する（完了まで待つ）
    async fn pull_image(&self, image: &str) -> Result<()>;

    /// コンテナを作成し、ランタイムが割り当てたIDを返す
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;

    async fn start_container(&self, id: &str) -> Result<()>;

    /// `grace` の猶予後に強制停止される
    async fn stop_container(&self, id: &str, grace: Duration) -> Result<()>;

    async fn remove_container(&self, id: &str, force: bool) -> Result<()>;

    async fn restart_container(&self, id: &str) -> Result<()>;

    /// ログを有界チャネル経由で受け取る
    ///
    /// 上流が終わるとチャネルが閉じる。受信側を drop すると上流も閉じられる。
    async fn logs(&self, id: &str, options: &LogOptions) -> Result<LogStream>;
}

/// コンテナ作成パラメータ（ランタイム非依存）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// `KEY=VALUE` 形式
    pub env: Vec<String>,
    /// ホストとコンテナで同じ番号のTCPポート
    pub port: Option<u16>,
    pub cmd: Option<Vec<String>>,
    pub working_dir: Option<String>,
    /// `host:container[:mode]` 形式
    pub binds: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    /// Docker API 形式（先頭に `/` が付く）
    pub names: Vec<String>,
    pub state: String,
    /// `host:container` 形式
    pub ports: Vec<String>,
}

impl ContainerSummary {
    /// 先頭の `/` を除いた最初の名前
    pub fn primary_name(&self) -> Option<&str> {
        self.names.first().map(|n| n.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDetails {
    pub id: String,
    pub name: String,
    pub running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    StdOut,
    StdErr,
    Console,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogChunk {
    pub source: LogSource,
    pub message: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub follow: bool,
    /// 末尾N行。`None` なら全件
    pub tail: Option<usize>,
}

pub type LogStream = mpsc::Receiver<Result<LogChunk>>;
