use std::time::Duration;
use tempusstack_container::PullPolicy;

pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_LOG_TAIL: usize = 100;

/// オーケストレーターの調整値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub pull: PullPolicy,
    /// stop 時の猶予。過ぎると強制停止
    pub stop_grace: Duration,
    /// down 後に管理対象が消えたか確認する回数
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    pub log_tail: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            pull: PullPolicy::default(),
            stop_grace: DEFAULT_STOP_GRACE,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_tail: DEFAULT_LOG_TAIL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = OrchestratorSettings::default();
        assert_eq!(settings.pull.max_attempts, 3);
        assert_eq!(settings.pull.backoff, Duration::from_secs(2));
        assert_eq!(settings.poll_attempts, 10);
        assert_eq!(settings.log_tail, 100);
    }
}
