use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "cannot connect to Docker: {0}\n\nhint:\n  • make sure the Docker daemon is running\n  • check that `docker ps` works for the current user"
    )]
    DockerConnectionFailed(String),

    #[error("container '{container}' not found")]
    ContainerNotFound { container: String },

    /// 304: 既に要求された状態になっている（停止済みのコンテナへの stop など）
    #[error("container '{container}' is already in the requested state")]
    ContainerNotModified { container: String },

    #[error("container '{container}' conflict: {message}")]
    Conflict { container: String, message: String },

    #[error("image '{image}' not found\n\nhint:\n  • check the image name and tag")]
    ImageNotFound { image: String },

    #[error("failed to pull image '{image}' after {attempts} attempt(s): {message}")]
    ImagePullFailed {
        image: String,
        attempts: u32,
        message: String,
    },

    #[error("Docker API error: {0}")]
    DockerApiError(String),
}

impl ContainerError {
    /// 対象を添えて bollard のエラーをステータスコードで分類する
    pub fn from_docker(err: bollard::errors::Error, target: &str) -> Self {
        match &err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            } => ContainerError::ContainerNotFound {
                container: target.to_string(),
            },
            bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            } => ContainerError::ContainerNotModified {
                container: target.to_string(),
            },
            bollard::errors::Error::DockerResponseServerError {
                status_code: 409,
                message,
            } => ContainerError::Conflict {
                container: target.to_string(),
                message: message.clone(),
            },
            _ => ContainerError::from(err),
        }
    }

    /// イメージを対象とした要求の 404 を `ImageNotFound` に読み替える
    pub fn for_image(self, image: &str) -> Self {
        match self {
            ContainerError::ContainerNotFound { .. } => ContainerError::ImageNotFound {
                image: image.to_string(),
            },
            other => other,
        }
    }

    /// 404 相当（既に存在しない）
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::ContainerNotFound { .. })
    }

    /// 304 相当（既に停止済み・起動済み）
    pub fn is_not_modified(&self) -> bool {
        matches!(self, ContainerError::ContainerNotModified { .. })
    }
}

impl From<bollard::errors::Error> for ContainerError {
    fn from(err: bollard::errors::Error) -> Self {
        let err_str = err.to_string();
        if err_str.contains("Connection refused")
            || err_str.contains("No such file or directory")
            || err_str.contains("error trying to connect")
        {
            ContainerError::DockerConnectionFailed(err_str)
        } else {
            ContainerError::DockerApiError(err_str)
        }
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(status_code: u16) -> bollard::errors::Error {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_classify_not_found() {
        let err = ContainerError::from_docker(server_error(404), "tempusstack_db");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "container 'tempusstack_db' not found");
    }

    #[test]
    fn test_classify_not_modified() {
        let err = ContainerError::from_docker(server_error(304), "abc");
        assert!(err.is_not_modified());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_classify_conflict() {
        let err = ContainerError::from_docker(server_error(409), "abc");
        assert!(matches!(err, ContainerError::Conflict { ref message, .. } if message == "boom"));
    }

    #[test]
    fn test_image_request_404_is_image_not_found() {
        let err = ContainerError::from_docker(server_error(404), "ghost:1").for_image("ghost:1");
        assert!(matches!(err, ContainerError::ImageNotFound { ref image } if image == "ghost:1"));
        assert!(err.to_string().starts_with("image 'ghost:1' not found"));
    }

    #[test]
    fn test_for_image_keeps_other_errors() {
        let err = ContainerError::from_docker(server_error(409), "abc").for_image("nginx");
        assert!(matches!(err, ContainerError::Conflict { .. }));
    }

    #[test]
    fn test_classify_other_status() {
        let err = ContainerError::from_docker(server_error(500), "abc");
        assert!(matches!(err, ContainerError::DockerApiError(_)));
    }
}
