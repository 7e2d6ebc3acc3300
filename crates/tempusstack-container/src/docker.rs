//! bollard による RuntimeClient 実装

use crate::converter::{published_ports, split_image_reference, to_create_body};
use crate::error::{ContainerError, Result};
use crate::runtime::{
    ContainerDetails, ContainerSpec, ContainerSummary, LOG_CHANNEL_CAPACITY, LogChunk,
    LogOptions, LogSource, LogStream, RuntimeClient,
};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, CreateImageOptionsBuilder, ListContainersOptionsBuilder,
    RemoveContainerOptionsBuilder, StopContainerOptionsBuilder,
};
use futures_util::stream::{Stream, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// ローカルの Docker デーモンに接続するランタイム
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// ローカル既定の接続先に接続し、ping で疎通を確認する
    pub async fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;

        docker
            .ping()
            .await
            .map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;

        debug!("Connected to Docker daemon");
        Ok(Self { docker })
    }

    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }
}

impl From<LogOutput> for LogChunk {
    fn from(output: LogOutput) -> Self {
        let (source, message) = match output {
            LogOutput::StdOut { message } => (LogSource::StdOut, message),
            LogOutput::StdErr { message } => (LogSource::StdErr, message),
            LogOutput::Console { message } => (LogSource::Console, message),
            LogOutput::StdIn { message } => (LogSource::Console, message),
        };
        LogChunk {
            source,
            message: message.to_vec(),
        }
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let options = ListContainersOptionsBuilder::new().all(true).build();
        let containers = self.docker.list_containers(Some(options)).await?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                state: c
                    .state
                    .as_ref()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                ports: c
                    .ports
                    .as_deref()
                    .map(published_ports)
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn inspect_container(&self, id_or_name: &str) -> Result<ContainerDetails> {
        let info = self
            .docker
            .inspect_container(
                id_or_name,
                None::<bollard::query_parameters::InspectContainerOptions>,
            )
            .await
            .map_err(|e| ContainerError::from_docker(e, id_or_name))?;

        Ok(ContainerDetails {
            id: info.id.unwrap_or_else(|| id_or_name.to_string()),
            name: info
                .name
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_default(),
            running: info.state.as_ref().and_then(|s| s.running).unwrap_or(false),
        })
    }

    #[instrument(skip(self))]
    async fn pull_image(&self, image: &str) -> Result<()> {
        let (from_image, tag) = split_image_reference(image);
        let options = CreateImageOptionsBuilder::new()
            .from_image(from_image)
            .tag(tag)
            .build();

        let mut stream =
            self.docker
                .create_image(Some(options), None, None::<bollard::auth::DockerCredentials>);

        while let Some(info) = stream.next().await {
            match info {
                Ok(bollard::models::CreateImageInfo {
                    status: Some(status),
                    ..
                }) => {
                    debug!(image = %image, status = %status, "Pull progress");
                }
                Ok(_) => {}
                Err(e) => return Err(ContainerError::from_docker(e, image).for_image(image)),
            }
        }

        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let options = CreateContainerOptionsBuilder::new().name(&spec.name).build();
        let body = to_create_body(spec);

        let response = self
            .docker
            .create_container(Some(options), body)
            .await
            // 作成時の 404 はイメージが無いことを意味する
            .map_err(|e| ContainerError::from_docker(e, &spec.name).for_image(&spec.image))?;

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<bollard::query_parameters::StartContainerOptions>)
            .await
            .map_err(|e| ContainerError::from_docker(e, id))
    }

    async fn stop_container(&self, id: &str, grace: Duration) -> Result<()> {
        let options = StopContainerOptionsBuilder::new()
            .t(grace.as_secs().try_into().unwrap_or(10))
            .build();

        self.docker
            .stop_container(id, Some(options))
            .await
            .map_err(|e| ContainerError::from_docker(e, id))
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        let options = RemoveContainerOptionsBuilder::new().force(force).build();

        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| ContainerError::from_docker(e, id))
    }

    async fn restart_container(&self, id: &str) -> Result<()> {
        self.docker
            .restart_container(id, None::<bollard::query_parameters::RestartContainerOptions>)
            .await
            .map_err(|e| ContainerError::from_docker(e, id))
    }

    async fn logs(&self, id: &str, options: &LogOptions) -> Result<LogStream> {
        let query = bollard::query_parameters::LogsOptions {
            follow: options.follow,
            stdout: true,
            stderr: true,
            tail: options
                .tail
                .map(|n| n.to_string())
                .unwrap_or_else(|| "all".to_string()),
            ..Default::default()
        };

        let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        let docker = self.docker.clone();
        let id = id.to_string();

        // 上流ストリームは転送タスクが所有する
        tokio::spawn(async move {
            let stream = docker.logs(&id, Some(query));
            pump_logs(stream, tx, &id).await;
        });

        Ok(rx)
    }
}

/// 上流のログをチャネルへ流す
///
/// 上流が終わるか、受信側が閉じられた時点で上流を drop して戻る。
/// 出力の無いコンテナを待っている間も受信側の close を監視する。
pub(crate) async fn pump_logs<S>(
    stream: S,
    tx: mpsc::Sender<Result<LogChunk>>,
    id: &str,
) where
    S: Stream<Item = std::result::Result<LogOutput, bollard::errors::Error>>,
{
    let mut stream = std::pin::pin!(stream);

    loop {
        let item = tokio::select! {
            _ = tx.closed() => {
                debug!(container = %id, "Log receiver closed");
                break;
            }
            item = stream.next() => item,
        };
        let Some(item) = item else {
            debug!(container = %id, "Log stream ended");
            break;
        };

        let chunk = item
            .map(LogChunk::from)
            .map_err(|e| ContainerError::from_docker(e, id));
        let failed = chunk.is_err();

        if tx.send(chunk).await.is_err() || failed {
            break;
        }
    }
}
