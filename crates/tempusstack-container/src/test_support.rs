//! テスト用のインメモリランタイム
//!
//! 呼び出しを `"<op>:<target>"` 形式で記録し、失敗を注入できる。

use crate::error::{ContainerError, Result};
use crate::runtime::{
    ContainerDetails, ContainerSpec, ContainerSummary, LOG_CHANNEL_CAPACITY, LogChunk,
    LogOptions, LogSource, LogStream, RuntimeClient,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// 状態を変える操作の接頭辞
const MUTATING_OPS: &[&str] = &["pull:", "create:", "start:", "stop:", "remove:", "restart:"];

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub running: bool,
    pub spec: Option<ContainerSpec>,
}

#[derive(Default)]
struct FakeState {
    containers: Vec<FakeContainer>,
    next_id: u64,
    calls: Vec<String>,
    /// 残り失敗回数
    pull_failures: HashMap<String, u32>,
    create_failures: HashSet<String>,
    start_failures: HashSet<String>,
    stop_failures: HashSet<String>,
    /// remove しても消えないコンテナ名
    survivors: HashSet<String>,
    logs: HashMap<String, Vec<String>>,
    unreachable: bool,
    /// この回数を超えた一覧取得は失敗する
    list_budget: Option<usize>,
    list_count: usize,
}

impl FakeState {
    fn record(&mut self, call: String) -> Result<()> {
        self.calls.push(call);
        if self.unreachable {
            return Err(ContainerError::DockerConnectionFailed(
                "Connection refused".to_string(),
            ));
        }
        Ok(())
    }

    fn position(&self, target: &str) -> Option<usize> {
        let target = target.trim_start_matches('/');
        self.containers
            .iter()
            .position(|c| c.id == target || c.name == target)
    }

    fn find(&self, target: &str) -> Result<&FakeContainer> {
        self.position(target)
            .map(|i| &self.containers[i])
            .ok_or_else(|| not_found(target))
    }

    fn find_mut(&mut self, target: &str) -> Result<&mut FakeContainer> {
        match self.position(target) {
            Some(i) => Ok(&mut self.containers[i]),
            None => Err(not_found(target)),
        }
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:012x}{}", self.next_id, "0".repeat(52))
    }
}

fn not_found(target: &str) -> ContainerError {
    ContainerError::ContainerNotFound {
        container: target.to_string(),
    }
}

#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存コンテナを登録し、そのIDを返す
    pub fn add_container(&self, name: &str, image: &str, running: bool) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate_id();
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: name.to_string(),
            image: image.to_string(),
            running,
            spec: None,
        });
        id
    }

    /// 次の `times` 回の pull を失敗させる
    pub fn fail_pull(&self, image: &str, times: u32) {
        self.state
            .lock()
            .unwrap()
            .pull_failures
            .insert(image.to_string(), times);
    }

    /// このイメージからの create を失敗させる
    pub fn fail_create(&self, image: &str) {
        self.state
            .lock()
            .unwrap()
            .create_failures
            .insert(image.to_string());
    }

    /// このコンテナ名の start を失敗させる
    pub fn fail_start(&self, container_name: &str) {
        self.state
            .lock()
            .unwrap()
            .start_failures
            .insert(container_name.to_string());
    }

    /// このコンテナ名の stop を失敗させる
    pub fn fail_stop(&self, container_name: &str) {
        self.state
            .lock()
            .unwrap()
            .stop_failures
            .insert(container_name.to_string());
    }

    /// remove が成功しても実際には消えないようにする
    pub fn survive_removal(&self, container_name: &str) {
        self.state
            .lock()
            .unwrap()
            .survivors
            .insert(container_name.to_string());
    }

    pub fn set_logs(&self, container_name: &str, lines: &[&str]) {
        self.state.lock().unwrap().logs.insert(
            container_name.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
    }

    /// 最初の `successes` 回以降の一覧取得を失敗させる
    pub fn fail_list_after(&self, successes: usize) {
        self.state.lock().unwrap().list_budget = Some(successes);
    }

    /// 全ての操作を接続エラーにする
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// 状態を変える呼び出しだけ
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| MUTATING_OPS.iter().any(|op| c.starts_with(op)))
            .collect()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.state
            .lock()
            .unwrap()
            .containers
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .containers
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }
}

#[async_trait]
impl RuntimeClient for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let mut state = self.state.lock().unwrap();
        state.record("list".to_string())?;

        state.list_count += 1;
        if state.list_budget.is_some_and(|budget| state.list_count > budget) {
            return Err(ContainerError::DockerApiError(
                "list request timed out".to_string(),
            ));
        }

        Ok(state
            .containers
            .iter()
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                names: vec![format!("/{}", c.name)],
                state: if c.running { "running" } else { "exited" }.to_string(),
                ports: c
                    .spec
                    .as_ref()
                    .and_then(|s| s.port)
                    .filter(|_| c.running)
                    .map(|p| vec![format!("{}:{}", p, p)])
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn inspect_container(&self, id_or_name: &str) -> Result<ContainerDetails> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("inspect:{}", id_or_name))?;

        let c = state.find(id_or_name)?;
        Ok(ContainerDetails {
            id: c.id.clone(),
            name: c.name.clone(),
            running: c.running,
        })
    }

    async fn pull_image(&self, image: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("pull:{}", image))?;

        match state.pull_failures.get_mut(image) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(ContainerError::DockerApiError(format!(
                    "pull access denied for {}",
                    image
                )))
            }
            _ => Ok(()),
        }
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("create:{}", spec.name))?;

        if state.create_failures.contains(&spec.image) {
            return Err(ContainerError::ImageNotFound {
                image: spec.image.clone(),
            });
        }
        if state.position(&spec.name).is_some() {
            return Err(ContainerError::Conflict {
                container: spec.name.clone(),
                message: "name already in use".to_string(),
            });
        }

        let id = state.allocate_id();
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: spec.name.clone(),
            image: spec.image.clone(),
            running: false,
            spec: Some(spec.clone()),
        });
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("start:{}", id))?;

        let name = state.find(id)?.name.clone();
        if state.start_failures.contains(&name) {
            return Err(ContainerError::DockerApiError(
                "port is already allocated".to_string(),
            ));
        }

        let c = state.find_mut(id)?;
        if c.running {
            return Err(ContainerError::ContainerNotModified {
                container: id.to_string(),
            });
        }
        c.running = true;
        Ok(())
    }

    async fn stop_container(&self, id: &str, _grace: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("stop:{}", id))?;

        let name = state.find(id)?.name.clone();
        if state.stop_failures.contains(&name) {
            return Err(ContainerError::DockerApiError(
                "cannot stop container: permission denied".to_string(),
            ));
        }

        let c = state.find_mut(id)?;
        if !c.running {
            return Err(ContainerError::ContainerNotModified {
                container: id.to_string(),
            });
        }
        c.running = false;
        Ok(())
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("remove:{}", id))?;

        let index = state.position(id).ok_or_else(|| not_found(id))?;
        let c = &state.containers[index];
        if c.running && !force {
            return Err(ContainerError::Conflict {
                container: id.to_string(),
                message: "cannot remove a running container".to_string(),
            });
        }
        if state.survivors.contains(&c.name) {
            return Ok(());
        }
        state.containers.remove(index);
        Ok(())
    }

    async fn restart_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record(format!("restart:{}", id))?;

        state.find_mut(id)?.running = true;
        Ok(())
    }

    async fn logs(&self, id: &str, options: &LogOptions) -> Result<LogStream> {
        let lines = {
            let mut state = self.state.lock().unwrap();
            state.record(format!("logs:{}", id))?;

            let name = state.find(id)?.name.clone();
            let all = state.logs.get(&name).cloned().unwrap_or_default();
            let skip = options
                .tail
                .map(|n| all.len().saturating_sub(n))
                .unwrap_or(0);
            all.into_iter().skip(skip).collect::<Vec<_>>()
        };

        let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            for line in lines {
                let chunk = LogChunk {
                    source: LogSource::StdOut,
                    message: format!("{}\n", line).into_bytes(),
                };
                if tx.send(Ok(chunk)).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}
