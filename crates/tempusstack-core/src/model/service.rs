//! サービス定義

use std::collections::BTreeMap;
use std::path::PathBuf;

/// `type` 省略時のサービス種別
pub const DEFAULT_SERVICE_TYPE: &str = "docker";

/// サービス定義
///
/// YAML形式：
/// ```yaml
/// services:
///   db:
///     image: postgres:15
///     port: 5432
///     env:
///       POSTGRES_PASSWORD: secret
///   api:
///     type: mock
///     file: mocks/api.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    /// ハンドラーの登録名 (docker, mock, ...)
    pub service_type: String,
    pub image: Option<String>,
    /// ホスト側とコンテナ側で同じ番号を使う単一のTCPポート
    pub port: Option<u16>,
    pub env: BTreeMap<String, String>,
    /// mock用のレスポンス定義ファイル（相対パスはロード時に解決済み）
    pub file: Option<PathBuf>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, service_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_type: service_type.into(),
            image: None,
            port: None,
            env: BTreeMap::new(),
            file: None,
        }
    }

    pub fn docker(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            ..Self::new(name, DEFAULT_SERVICE_TYPE)
        }
    }

    pub fn mock(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::new(name, "mock")
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// 環境変数を `KEY=VALUE` 形式に変換
    pub fn env_pairs(&self) -> Vec<String> {
        self.env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_defaults() {
        let spec = ServiceSpec::docker("db", "alpine");
        assert_eq!(spec.service_type, "docker");
        assert_eq!(spec.image.as_deref(), Some("alpine"));
        assert!(spec.port.is_none());
        assert!(spec.env.is_empty());
    }

    #[test]
    fn test_env_pairs() {
        let spec = ServiceSpec::docker("db", "postgres:15")
            .with_env("POSTGRES_USER", "app")
            .with_env("POSTGRES_DB", "main");

        assert_eq!(
            spec.env_pairs(),
            vec!["POSTGRES_DB=main".to_string(), "POSTGRES_USER=app".to_string()]
        );
    }
}
