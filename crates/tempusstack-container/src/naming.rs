//! 管理対象コンテナの命名規則
//!
//! `tempusstack_<service>` という名前だけが「自分のコンテナ」を見分ける手段。
//! ローカルに状態を持たないので、プロセスを再起動してもこの規則で再発見できる。

/// 管理対象コンテナ名の接頭辞
pub const CONTAINER_PREFIX: &str = "tempusstack_";

/// サービス名を記録するラベル（表示用。発見には使わない）
pub const LABEL_SERVICE: &str = "tempusstack.service";

/// サービス種別を記録するラベル
pub const LABEL_TYPE: &str = "tempusstack.type";

const SHORT_ID_LEN: usize = 12;

/// サービス名から正規のコンテナ名を生成
pub fn container_name(service: &str) -> String {
    format!("{}{}", CONTAINER_PREFIX, service)
}

/// コンテナ名からサービス名を取り出す
///
/// Docker API が返す先頭の `/` は無視する。管理対象でなければ `None`。
pub fn service_name_of(container_name: &str) -> Option<&str> {
    container_name
        .trim_start_matches('/')
        .strip_prefix(CONTAINER_PREFIX)
        .filter(|service| !service.is_empty())
}

pub fn is_managed(container_name: &str) -> bool {
    service_name_of(container_name).is_some()
}

/// 表示用の短いコンテナID
pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

/// ハンドラーが起動に成功したコンテナへの参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedContainerRef {
    pub id: String,
    pub service: String,
    pub container_name: String,
}

impl ManagedContainerRef {
    pub fn new(service: impl Into<String>, id: impl Into<String>) -> Self {
        let service = service.into();
        Self {
            id: id.into(),
            container_name: container_name(&service),
            service,
        }
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}
