//! 请求闸门 - 基础设施层
//!
//! 持有全局唯一的"后端请求配额"，只暴露"申请一次请求"的能力

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

use crate::error::BackendError;

/// 请求闸门
///
/// 职责：
/// - 限制全进程同时进行中的后端请求数量
/// - 保证任意两次请求的发出时间间隔不小于 `min_spacing`
/// - 不认识模型 / 论文
/// - 不处理重试
pub struct RequestGate {
    semaphore: Arc<Semaphore>,
    min_spacing: Duration,
    /// 下一次允许发出请求的时间
    next_slot: Mutex<Option<Instant>>,
}

/// 请求许可
///
/// 持有期间占用一个并发名额，drop 时自动归还
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl RequestGate {
    /// 创建新的请求闸门
    pub fn new(max_concurrent: usize, min_spacing: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            min_spacing,
            next_slot: Mutex::new(None),
        }
    }

    /// 申请一次请求
    ///
    /// 先在名额之外等待到下一个发送时间点，再占用并发名额并认领该时间点。
    /// 认领失败（时间点已被其他请求占用）时归还名额重新等待，
    /// 因此等待间隔的任务不会占着并发名额。
    pub async fn acquire(&self) -> Result<GatePermit, BackendError> {
        loop {
            if let Some(slot) = self.pending_slot() {
                debug!("⏳ 请求间隔等待 {:?}", slot - Instant::now());
                tokio::time::sleep_until(slot).await;
            }

            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| BackendError::GateClosed)?;

            if self.try_claim_slot() {
                return Ok(GatePermit { _permit: permit });
            }
        }
    }

    /// 尚未到达的下一个发送时间点
    fn pending_slot(&self) -> Option<Instant> {
        let next_slot = self.next_slot.lock().unwrap_or_else(|e| e.into_inner());
        (*next_slot).filter(|slot| *slot > Instant::now())
    }

    /// 当前时间已到达发送时间点时认领它，并预约下一个
    fn try_claim_slot(&self) -> bool {
        let mut next_slot = self.next_slot.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        if matches!(*next_slot, Some(slot) if slot > now) {
            return false;
        }
        *next_slot = Some(now + self.min_spacing);
        true
    }

    /// 当前可用的并发名额
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}
