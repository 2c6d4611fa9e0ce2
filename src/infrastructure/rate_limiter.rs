//! 限流与熔断管理 - 基础设施层
//!
//! ## 职责
//!
//! 按模型名称维护失败次数与熔断状态，判断模型当前是否可用，并计算退避时间。
//! 不做任何 I/O，时间与随机抖动均由外部注入。
//!
//! ## 状态转换
//!
//! ```text
//! 可用 ──(失败次数 ≥ 3)──▶ 熔断 (reset_at = now + 300s × 失败次数)
//! 熔断 ──(now > reset_at，下一次查询时)──▶ 可用 (失败次数清零)
//! 任意 ──(成功)──▶ 可用 (失败次数清零)
//! ```
//!
//! 整个状态表由一把互斥锁保护，每次读改写都在锁内完成，
//! 并发任务对同一模型的更新不会丢失。锁内不跨越 await。

use crate::error::FailureKind;
use crate::infrastructure::clock::{Clock, JitterSource, RandomJitter, SystemClock};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, warn};

/// 触发熔断的失败次数
pub const BREAKER_THRESHOLD: u32 = 3;
/// 每次失败对应的冷却秒数
pub const COOLDOWN_SECS_PER_FAILURE: i64 = 300;
/// 指数退避的上限（秒）
pub const MAX_BACKOFF_SECS: u64 = 60;

/// 熔断记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerTrip {
    pub reset_at: DateTime<Utc>,
    pub reason: FailureKind,
}

/// 单个模型的熔断状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakerState {
    pub failure_count: u32,
    pub tripped: Option<BreakerTrip>,
}

/// 限流与熔断管理器
///
/// 进程内共享（`Arc`），由编排器在构造时注入
pub struct RateLimitManager {
    states: Mutex<HashMap<String, BreakerState>>,
    clock: Arc<dyn Clock>,
    jitter: Arc<dyn JitterSource>,
}

impl RateLimitManager {
    /// 使用系统时钟与随机抖动创建
    pub fn new() -> Self {
        Self::with_sources(Arc::new(SystemClock), Arc::new(RandomJitter))
    }

    /// 使用自定义时钟与抖动源创建
    pub fn with_sources(clock: Arc<dyn Clock>, jitter: Arc<dyn JitterSource>) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            clock,
            jitter,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, BreakerState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 模型是否可用
    ///
    /// 冷却时间已过时会顺带清除熔断并将失败次数归零
    pub fn is_available(&self, model_name: &str) -> bool {
        let mut states = self.lock();
        let Some(state) = states.get_mut(model_name) else {
            return true;
        };
        let Some(trip) = &state.tripped else {
            return true;
        };

        if self.clock.now() > trip.reset_at {
            state.tripped = None;
            state.failure_count = 0;
            info!("🔄 熔断已重置: {}", model_name);
            return true;
        }

        false
    }

    /// 记录一次失败，失败次数达到阈值时触发熔断
    pub fn record_failure(&self, model_name: &str, kind: FailureKind) {
        let mut states = self.lock();
        let state = states.entry(model_name.to_string()).or_default();
        state.failure_count += 1;

        if state.failure_count >= BREAKER_THRESHOLD {
            // 冷却时间随失败次数线性增长：3 次 15 分钟，4 次 20 分钟……
            let cooldown =
                chrono::Duration::seconds(COOLDOWN_SECS_PER_FAILURE * i64::from(state.failure_count));
            let reset_at = self.clock.now() + cooldown;
            state.tripped = Some(BreakerTrip {
                reset_at,
                reason: kind,
            });
            warn!(
                "⚠️ 触发熔断: {} (原因: {}, 失败 {} 次) - 冷却至 {}",
                model_name,
                kind,
                state.failure_count,
                reset_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    /// 记录一次成功，清零失败次数并关闭熔断
    pub fn record_success(&self, model_name: &str) {
        let mut states = self.lock();
        if let Some(state) = states.get_mut(model_name) {
            state.failure_count = 0;
            state.tripped = None;
        }
    }

    /// 指数退避时间：min(2^attempt, 60) 秒 × [0.5, 1.5] 抖动
    pub fn backoff_delay(&self, _model_name: &str, attempt: u32) -> Duration {
        let base = 2u64.saturating_pow(attempt).min(MAX_BACKOFF_SECS);
        Duration::from_secs_f64(base as f64 * self.jitter.factor())
    }

    /// 是否继续重试当前模型
    pub fn should_retry(&self, model_name: &str, attempt: u32, max_retries: u32) -> bool {
        attempt < max_retries && self.is_available(model_name)
    }

    // ========== 诊断 ==========

    pub fn failure_count(&self, model_name: &str) -> u32 {
        self.lock()
            .get(model_name)
            .map(|s| s.failure_count)
            .unwrap_or(0)
    }

    /// 当前熔断记录（不触发重置）
    pub fn breaker(&self, model_name: &str) -> Option<BreakerTrip> {
        self.lock().get(model_name).and_then(|s| s.tripped.clone())
    }

    /// 所有模型的失败次数之和
    pub fn total_failures(&self) -> u32 {
        self.lock().values().map(|s| s.failure_count).sum()
    }
}

impl Default for RateLimitManager {
    fn default() -> Self {
        Self::new()
    }
}
