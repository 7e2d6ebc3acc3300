//! 再試行付きのイメージ取得

use crate::error::{ContainerError, Result};
use crate::runtime::RuntimeClient;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_PULL_ATTEMPTS: u32 = 3;
pub const DEFAULT_PULL_BACKOFF: Duration = Duration::from_secs(2);

/// 取得の再試行ポリシー（一定間隔）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for PullPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_PULL_ATTEMPTS,
            backoff: DEFAULT_PULL_BACKOFF,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryingPuller {
    policy: PullPolicy,
}

impl RetryingPuller {
    pub fn new(policy: PullPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PullPolicy {
        self.policy
    }

    /// イメージを取得する。全試行が失敗したら `ImagePullFailed`
    ///
    /// `max_attempts` が 0 でも一度は試す。
    pub async fn pull(&self, runtime: &dyn RuntimeClient, image: &str) -> Result<()> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match runtime.pull_image(image).await {
                Ok(()) => {
                    if attempt > 1 {
                        info!(image = %image, attempt, "Image pulled after retry");
                    }
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        image = %image,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Image pull failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        Err(ContainerError::ImagePullFailed {
            image: image.to_string(),
            attempts,
            message: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
