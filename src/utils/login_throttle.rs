//! Admin login failure throttle.
//!
//! Best-effort and single-instance: state lives in this process only, so
//! several server instances each count separately. Failures are kept per
//! client address, pruned against the sliding window whenever the address
//! is checked, and cleared on a successful login.

use crate::error::{AppError, AppResult};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

#[derive(Debug, Clone)]
pub struct LoginThrottle {
    failures: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_attempts: usize,
    window: Duration,
}

impl LoginThrottle {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            failures: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    /// 超过失败上限时拒绝，与密码是否正确无关
    pub fn check(&self, key: &str) -> AppResult<()> {
        self.check_at(key, Instant::now())
    }

    pub fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Instant::now());
    }

    pub fn clear(&self, key: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(key);
        }
    }

    fn check_at(&self, key: &str, now: Instant) -> AppResult<()> {
        let mut failures = self
            .failures
            .lock()
            .map_err(|_| AppError::InternalError("login throttle poisoned".into()))?;

        let Some(entries) = failures.get_mut(key) else {
            return Ok(());
        };
        entries.retain(|at| now.duration_since(*at) < self.window);
        if entries.is_empty() {
            failures.remove(key);
            return Ok(());
        }

        if entries.len() >= self.max_attempts {
            // 最早一次失败离开窗口的时间
            let oldest = entries.iter().min().copied().unwrap_or(now);
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return Err(AppError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }
        Ok(())
    }

    fn record_failure_at(&self, key: &str, now: Instant) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.entry(key.to_string()).or_default().push(now);
        }
    }
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_after_max_failures() {
        let throttle = LoginThrottle::new(3, Duration::from_secs(60));
        let t = Instant::now();
        for i in 0..3 {
            assert!(throttle.check_at("1.2.3.4", t).is_ok());
            throttle.record_failure_at("1.2.3.4", t + Duration::from_secs(i));
        }
        match throttle.check_at("1.2.3.4", t + Duration::from_secs(10)) {
            Err(AppError::RateLimited { retry_after_secs }) => assert_eq!(retry_after_secs, 50),
            other => panic!("expected rate limit, got {other:?}"),
        }
        // 其它地址不受影响
        assert!(throttle.check_at("5.6.7.8", t).is_ok());
    }

    #[test]
    fn test_window_slides() {
        let throttle = LoginThrottle::new(2, Duration::from_secs(60));
        let t = Instant::now();
        throttle.record_failure_at("ip", t);
        throttle.record_failure_at("ip", t + Duration::from_secs(30));
        assert!(throttle.check_at("ip", t + Duration::from_secs(31)).is_err());
        // 第一次失败已滑出窗口
        assert!(throttle.check_at("ip", t + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn test_clear_on_success() {
        let throttle = LoginThrottle::new(1, Duration::from_secs(60));
        throttle.record_failure("ip");
        assert!(throttle.check("ip").is_err());
        throttle.clear("ip");
        assert!(throttle.check("ip").is_ok());
    }
}
