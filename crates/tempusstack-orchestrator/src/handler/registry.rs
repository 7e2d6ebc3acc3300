use super::{DockerHandler, MockHandler, ServiceHandler};
use crate::error::{OrchestratorError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tempusstack_container::PullPolicy;

/// サービス種別名からハンドラーを引く
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ServiceHandler>>,
}

impl HandlerRegistry {
    /// 空のレジストリ
    pub fn new() -> Self {
        Self::default()
    }

    /// 組み込みの `docker` と `mock` を登録済みのレジストリ
    pub fn with_builtins(pull: PullPolicy) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DockerHandler::new(pull)));
        registry.register(Arc::new(MockHandler::new(pull)));
        registry
    }

    /// 同じ種別名が既にあれば置き換え、古いものを返す
    pub fn register(&mut self, handler: Arc<dyn ServiceHandler>) -> Option<Arc<dyn ServiceHandler>> {
        self.handlers
            .insert(handler.service_type().to_string(), handler)
    }

    pub fn resolve(&self, service_type: &str) -> Result<Arc<dyn ServiceHandler>> {
        self.handlers
            .get(service_type)
            .cloned()
            .ok_or_else(|| OrchestratorError::HandlerNotFound {
                service_type: service_type.to_string(),
                available: self.types().join(", "),
            })
    }

    /// 登録済みの種別名（ソート済み）
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("types", &self.types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use async_trait::async_trait;
    use tempusstack_container::RuntimeClient;
    use tempusstack_core::ServiceSpec;

    struct EchoHandler;

    #[async_trait]
    impl ServiceHandler for EchoHandler {
        fn service_type(&self) -> &str {
            "echo"
        }

        async fn run(
            &self,
            _runtime: &dyn RuntimeClient,
            name: &str,
            _spec: &ServiceSpec,
            _verbose: bool,
        ) -> std::result::Result<String, HandlerError> {
            Ok(format!("echo-{}", name))
        }
    }

    #[test]
    fn test_builtins_resolve() {
        let registry = HandlerRegistry::with_builtins(PullPolicy::default());
        assert_eq!(registry.types(), vec!["docker", "mock"]);
        assert_eq!(registry.resolve("docker").unwrap().service_type(), "docker");
        assert_eq!(registry.resolve("mock").unwrap().service_type(), "mock");
    }

    #[test]
    fn test_unknown_type_fails_closed() {
        let registry = HandlerRegistry::with_builtins(PullPolicy::default());
        let err = registry.resolve("kubernetes").err().unwrap();
        assert!(matches!(
            err,
            OrchestratorError::HandlerNotFound { ref service_type, .. } if service_type == "kubernetes"
        ));
        assert!(err.to_string().contains("available: docker, mock"));
    }

    #[test]
    fn test_register_custom_handler() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.register(Arc::new(EchoHandler)).is_none());
        assert!(registry.register(Arc::new(EchoHandler)).is_some());
        assert_eq!(registry.types(), vec!["echo"]);
    }
}
