use tempusstack_container::ContainerError;
use thiserror::Error;

/// ハンドラーがサービスを起動できなかった理由
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("service '{service}' has no image")]
    MissingImage { service: String },

    /// ランタイムに触れる前に検出した mock 定義の不備
    #[error("invalid mock definition: {0}")]
    InvalidMock(String),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("no handler registered for service type '{service_type}' (available: {available})")]
    HandlerNotFound {
        service_type: String,
        available: String,
    },

    #[error("service '{service}' failed to start: {source}")]
    ServiceStart {
        service: String,
        #[source]
        source: HandlerError,
    },

    /// 自動クリーンアップを試みた後に返される
    #[error("start of stack failed: {source}")]
    StackStart {
        #[source]
        source: Box<OrchestratorError>,
    },

    #[error("service '{service}' is not running or does not exist")]
    ServiceNotFound { service: String },

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("failed to write logs: {0}")]
    Io(#[from] std::io::Error),
}

impl OrchestratorError {
    /// StackStart の元になったエラー
    pub fn root_cause(&self) -> &OrchestratorError {
        match self {
            OrchestratorError::StackStart { source } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
