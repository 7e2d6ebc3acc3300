use super::{ServiceHandler, create_and_start, ownership_labels, reuse_or_clear};
use crate::error::HandlerError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use tempusstack_container::{
    ContainerSpec, PullPolicy, RetryingPuller, RuntimeClient, container_name,
};
use tempusstack_core::ServiceSpec;
use tracing::instrument;

pub const MOCK_IMAGE: &str = "node:18-alpine";
pub const MOCK_DEFAULT_PORT: u16 = 3001;
/// コンテナ内でのレスポンス定義の置き場所
pub const MOCK_RESPONSES_PATH: &str = "/data/responses.json";

/// レスポンス定義を読んで GET/OPTIONS に答える最小の HTTP サーバー
const RESPONDER_SCRIPT: &str = r#"
const http = require('http');
const fs = require('fs');
const port = Number(process.env.PORT || 3001);
const routes = JSON.parse(fs.readFileSync(process.env.RESPONSES_FILE, 'utf8'));
const cors = {
  'Access-Control-Allow-Origin': '*',
  'Access-Control-Allow-Methods': 'GET, OPTIONS',
  'Access-Control-Allow-Headers': '*'
};
http.createServer((req, res) => {
  if (req.method === 'OPTIONS') {
    res.writeHead(204, cors);
    return res.end();
  }
  const path = req.url.split('?')[0];
  const headers = Object.assign({ 'Content-Type': 'application/json' }, cors);
  if (req.method === 'GET' && Object.prototype.hasOwnProperty.call(routes, path)) {
    res.writeHead(200, headers);
    return res.end(JSON.stringify(routes[path]));
  }
  res.writeHead(404, headers);
  res.end(JSON.stringify({ error: 'not found', available: Object.keys(routes) }));
}).listen(port, () => console.log(`mock responder listening on ${port}`));
"#;

/// レスポンス定義ファイルを読み、パスをキーとする JSON オブジェクトであることを確かめる
pub fn load_responses(path: &Path) -> Result<Map<String, Value>, HandlerError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        HandlerError::InvalidMock(format!("cannot read '{}': {}", path.display(), e))
    })?;

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(routes)) => Ok(routes),
        Ok(_) => Err(HandlerError::InvalidMock(format!(
            "'{}' must contain a JSON object keyed by request path",
            path.display()
        ))),
        Err(e) => Err(HandlerError::InvalidMock(format!(
            "'{}' is not valid JSON: {}",
            path.display(),
            e
        ))),
    }
}

/// レスポンス定義ファイルから静的な HTTP レスポンダーを立てる
#[derive(Debug, Clone, Default)]
pub struct MockHandler {
    puller: RetryingPuller,
}

impl MockHandler {
    pub fn new(pull: PullPolicy) -> Self {
        Self {
            puller: RetryingPuller::new(pull),
        }
    }
}

#[async_trait]
impl ServiceHandler for MockHandler {
    fn service_type(&self) -> &str {
        "mock"
    }

    #[instrument(skip(self, runtime, spec, verbose), fields(service = %name))]
    async fn run(
        &self,
        runtime: &dyn RuntimeClient,
        name: &str,
        spec: &ServiceSpec,
        verbose: bool,
    ) -> Result<String, HandlerError> {
        // ランタイムに触れる前に定義を検証する
        let file = spec.file.as_deref().ok_or_else(|| {
            HandlerError::InvalidMock(format!("mock service '{}' has no 'file'", name))
        })?;
        let routes = load_responses(file)?;
        let host_file = std::fs::canonicalize(file).map_err(|e| {
            HandlerError::InvalidMock(format!("cannot resolve '{}': {}", file.display(), e))
        })?;
        progress!(verbose, routes = routes.len(), file = %host_file.display(), "Mock responses loaded");

        let port = spec.port.unwrap_or(MOCK_DEFAULT_PORT);
        let container = container_name(name);

        if let Some(id) = reuse_or_clear(runtime, &container, verbose).await? {
            return Ok(id);
        }

        progress!(verbose, image = MOCK_IMAGE, "Pulling image");
        self.puller.pull(runtime, MOCK_IMAGE).await?;

        let create = ContainerSpec {
            name: container,
            image: MOCK_IMAGE.to_string(),
            env: vec![
                format!("PORT={}", port),
                format!("RESPONSES_FILE={}", MOCK_RESPONSES_PATH),
            ],
            port: Some(port),
            cmd: Some(vec![
                "node".to_string(),
                "-e".to_string(),
                RESPONDER_SCRIPT.to_string(),
            ]),
            working_dir: Some("/data".to_string()),
            binds: vec![format!(
                "{}:{}:ro",
                host_file.display(),
                MOCK_RESPONSES_PATH
            )],
            labels: ownership_labels(name, self.service_type()),
        };

        create_and_start(runtime, &create, verbose).await
    }
}
