use super::{ServiceHandler, create_and_start, ownership_labels, reuse_or_clear};
use crate::error::HandlerError;
use async_trait::async_trait;
use tempusstack_container::{
    ContainerSpec, PullPolicy, RetryingPuller, RuntimeClient, container_name,
};
use tempusstack_core::{DEFAULT_SERVICE_TYPE, ServiceSpec};
use tracing::instrument;

/// イメージを指定して起動する汎用サービス
#[derive(Debug, Clone, Default)]
pub struct DockerHandler {
    puller: RetryingPuller,
}

impl DockerHandler {
    pub fn new(pull: PullPolicy) -> Self {
        Self {
            puller: RetryingPuller::new(pull),
        }
    }
}

#[async_trait]
impl ServiceHandler for DockerHandler {
    fn service_type(&self) -> &str {
        DEFAULT_SERVICE_TYPE
    }

    #[instrument(skip(self, runtime, spec, verbose), fields(service = %name))]
    async fn run(
        &self,
        runtime: &dyn RuntimeClient,
        name: &str,
        spec: &ServiceSpec,
        verbose: bool,
    ) -> Result<String, HandlerError> {
        let image = spec
            .image
            .as_deref()
            .ok_or_else(|| HandlerError::MissingImage {
                service: name.to_string(),
            })?;
        let container = container_name(name);

        if let Some(id) = reuse_or_clear(runtime, &container, verbose).await? {
            return Ok(id);
        }

        progress!(verbose, image = %image, "Pulling image");
        self.puller.pull(runtime, image).await?;

        let create = ContainerSpec {
            name: container,
            image: image.to_string(),
            env: spec.env_pairs(),
            port: spec.port,
            labels: ownership_labels(name, self.service_type()),
            ..Default::default()
        };

        create_and_start(runtime, &create, verbose).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempusstack_container::ContainerError;
    use tempusstack_container::test_support::FakeRuntime;

    fn handler() -> DockerHandler {
        DockerHandler::new(PullPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn test_run_creates_and_starts() {
        let runtime = FakeRuntime::new();
        let spec = ServiceSpec::docker("db", "postgres:15")
            .with_port(5432)
            .with_env("POSTGRES_PASSWORD", "x");

        let id = handler().run(&runtime, "db", &spec, false).await.unwrap();

        let container = runtime.container("tempusstack_db").unwrap();
        assert_eq!(container.id, id);
        assert!(container.running);

        let created = container.spec.unwrap();
        assert_eq!(created.image, "postgres:15");
        assert_eq!(created.port, Some(5432));
        assert_eq!(created.env, vec!["POSTGRES_PASSWORD=x".to_string()]);
        assert_eq!(
            created.labels.get("tempusstack.type"),
            Some(&"docker".to_string())
        );
        assert_eq!(
            runtime.mutating_calls(),
            vec![
                "pull:postgres:15".to_string(),
                "create:tempusstack_db".to_string(),
                format!("start:{}", id),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_reuses_running_container() {
        let runtime = FakeRuntime::new();
        let existing = runtime.add_container("tempusstack_db", "postgres:15", true);
        let spec = ServiceSpec::docker("db", "postgres:15");

        let id = handler().run(&runtime, "db", &spec, false).await.unwrap();

        assert_eq!(id, existing);
        assert_eq!(runtime.container_names(), vec!["tempusstack_db"]);
        assert_eq!(runtime.count_calls("create:"), 0);
    }

    #[tokio::test]
    async fn test_run_recreates_stopped_container() {
        let runtime = FakeRuntime::new();
        let stale = runtime.add_container("tempusstack_db", "postgres:15", false);
        let spec = ServiceSpec::docker("db", "postgres:15");

        let id = handler().run(&runtime, "db", &spec, false).await.unwrap();

        assert_ne!(id, stale);
        let container = runtime.container("tempusstack_db").unwrap();
        assert_eq!(container.id, id);
        assert!(container.running);
    }

    #[tokio::test]
    async fn test_missing_image_fails_before_runtime() {
        let runtime = FakeRuntime::new();
        let spec = ServiceSpec::new("db", "docker");

        let err = handler().run(&runtime, "db", &spec, false).await.unwrap_err();
        assert!(matches!(err, HandlerError::MissingImage { .. }));
        assert!(runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pull_failure_stops_before_create() {
        let runtime = FakeRuntime::new();
        runtime.fail_pull("ghost:1", u32::MAX);
        let spec = ServiceSpec::docker("ghost", "ghost:1");

        let err = handler()
            .run(&runtime, "ghost", &spec, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Container(ContainerError::ImagePullFailed { attempts: 2, .. })
        ));
        assert_eq!(runtime.count_calls("create:"), 0);
    }
}
