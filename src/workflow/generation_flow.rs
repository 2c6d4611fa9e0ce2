//! 单模型生成流程 - 流程层
//!
//! 核心职责：定义"用一个模型生成一篇论文"的完整重试流程
//!
//! 流程顺序：
//! 1. 熔断检查（熔断中直接跳过）
//! 2. 申请请求闸门 → 调用后端
//! 3. 失败按类型决定等待时间与是否计入熔断器
//! 4. 响应长度校验

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::clients::{ChatBackend, ChatRequest};
use crate::error::{BackendError, FailureKind};
use crate::infrastructure::{RateLimitManager, RequestGate};
use crate::models::ModelDescriptor;
use crate::workflow::generation_ctx::GenerationJob;

/// 单个模型的生成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutcome {
    /// 生成成功
    Generated(String),
    /// 熔断中，未发出请求
    CircuitOpen,
    /// 响应过短，放弃该模型
    TooShort,
    /// 重试次数用尽或熔断被触发
    Exhausted,
    /// 无法识别的错误，放弃该模型
    Abandoned,
}

/// 单次尝试的请求参数
///
/// 重试时逐步提高温度、减少输出长度、放宽超时
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptParameters {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl AttemptParameters {
    pub fn for_attempt(model: &ModelDescriptor, attempt: u32) -> Self {
        let temperature = (0.7 + 0.1 * attempt as f32).min(1.0);
        let max_tokens = model.max_tokens.saturating_sub(attempt.saturating_mul(500)).max(2000);
        let timeout = Duration::from_secs(120 + 30 * u64::from(attempt));

        Self {
            temperature,
            max_tokens,
            timeout,
        }
    }
}

/// 单模型生成流程
///
/// - 决定何时重试、等多久、何时放弃
/// - 不持有模型列表，不关心回退顺序
/// - 不解析生成的内容
pub struct GenerationFlow {
    backend: Arc<dyn ChatBackend>,
    rate_limiter: Arc<RateLimitManager>,
    gate: Arc<RequestGate>,
    min_response_chars: usize,
}

impl GenerationFlow {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        rate_limiter: Arc<RateLimitManager>,
        gate: Arc<RequestGate>,
        min_response_chars: usize,
    ) -> Self {
        Self {
            backend,
            rate_limiter,
            gate,
            min_response_chars,
        }
    }

    pub async fn run(
        &self,
        model: &ModelDescriptor,
        prompt: &str,
        job: &mut GenerationJob,
    ) -> ModelOutcome {
        let name = model.name.as_str();

        if !self.rate_limiter.is_available(name) {
            warn!("{} ⚠️ {} 处于熔断状态，跳过", job, model.description);
            return ModelOutcome::CircuitOpen;
        }

        for attempt in 0..model.max_retries {
            let params = AttemptParameters::for_attempt(model, attempt);
            let request = ChatRequest {
                model: model.name.clone(),
                prompt: prompt.to_string(),
                max_tokens: params.max_tokens,
                temperature: params.temperature,
                timeout: params.timeout,
                attempt,
            };

            info!(
                "{} 🤖 请求 {} (第 {} 次尝试, tokens: {})",
                job,
                model.description,
                attempt + 1,
                params.max_tokens
            );

            let result = {
                let _permit = match self.gate.acquire().await {
                    Ok(permit) => permit,
                    // 信号量不会在运行期间关闭，保留该分支以免 panic
                    Err(e) => {
                        error!("{} ❌ 无法申请请求名额: {}", job, e);
                        return ModelOutcome::Abandoned;
                    }
                };
                self.backend.complete(&request).await
            };

            let err = match result {
                Ok(text) => return self.check_response(model, text, job),
                Err(err) => err,
            };

            let kind = err.kind();
            job.record_failure(name, attempt, kind);
            if kind.counts_toward_breaker() {
                self.rate_limiter.record_failure(name, kind);
            }

            let Some(delay) = self.retry_delay(model, attempt, &err, job) else {
                return ModelOutcome::Abandoned;
            };

            if !self
                .rate_limiter
                .should_retry(name, attempt + 1, model.max_retries)
            {
                warn!("{} ⚠️ 停止重试 {}", job, model.description);
                return ModelOutcome::Exhausted;
            }

            info!("{} ⏰ 等待 {:.1}s 后重试", job, delay.as_secs_f64());
            tokio::time::sleep(delay).await;

            // 等待期间其他任务可能已触发熔断
            if !self.rate_limiter.is_available(name) {
                warn!("{} ⚠️ {} 在等待期间进入熔断状态，停止重试", job, model.description);
                return ModelOutcome::CircuitOpen;
            }
        }

        ModelOutcome::Exhausted
    }

    fn check_response(
        &self,
        model: &ModelDescriptor,
        text: String,
        job: &GenerationJob,
    ) -> ModelOutcome {
        let length = text.trim().chars().count();
        if length > self.min_response_chars {
            info!("{} ✅ {} 生成成功 ({} 字符)", job, model.description, length);
            self.rate_limiter.record_success(&model.name);
            ModelOutcome::Generated(text)
        } else {
            warn!(
                "{} ⚠️ {} 响应过短 ({} 字符)",
                job, model.description, length
            );
            ModelOutcome::TooShort
        }
    }

    /// 失败后的等待时间，`None` 表示放弃该模型
    fn retry_delay(
        &self,
        model: &ModelDescriptor,
        attempt: u32,
        err: &BackendError,
        job: &GenerationJob,
    ) -> Option<Duration> {
        let step = u64::from(attempt) + 1;
        match err.kind() {
            FailureKind::RateLimited => {
                warn!(
                    "{} ⏰ {} 触发限流 (第 {} 次尝试)",
                    job,
                    model.description,
                    attempt + 1
                );
                Some(match err.retry_after() {
                    Some(secs) => Duration::from_secs(secs.min(60)),
                    None => self
                        .rate_limiter
                        .backoff_delay(&model.name, attempt)
                        .max(Duration::from_secs(model.base_delay_secs)),
                })
            }
            FailureKind::TransientConnection => {
                warn!(
                    "{} 🔌 {} 连接异常 (第 {} 次尝试): {}",
                    job,
                    model.description,
                    attempt + 1,
                    err
                );
                Some(Duration::from_secs((5 * step).min(30)))
            }
            FailureKind::ServerError => {
                warn!(
                    "{} 🚨 {} 服务端错误 (第 {} 次尝试): {}",
                    job,
                    model.description,
                    attempt + 1,
                    err
                );
                Some(Duration::from_secs((10 * step).min(60)))
            }
            FailureKind::Unknown => {
                error!("{} ❌ {} 未知错误: {}", job, model.description, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{FixedJitter, ManualClock};
    use crate::models::{default_catalog, PaperRequest};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按顺序返回预设结果的后端
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, BackendError>>>,
        requests: Mutex<Vec<(tokio::time::Instant, ChatRequest)>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<(tokio::time::Instant, ChatRequest)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn complete(&self, request: &ChatRequest) -> Result<String, BackendError> {
            self.requests
                .lock()
                .unwrap()
                .push((tokio::time::Instant::now(), request.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::Connection { message: "script exhausted".into() }))
        }
    }

    fn long_text() -> String {
        "Lorem ipsum dolor sit amet. ".repeat(30)
    }

    fn setup(backend: Arc<ScriptedBackend>) -> (GenerationFlow, Arc<RateLimitManager>) {
        let limiter = Arc::new(RateLimitManager::with_sources(
            Arc::new(ManualClock::default()),
            Arc::new(FixedJitter(1.0)),
        ));
        let gate = Arc::new(RequestGate::new(2, Duration::ZERO));
        let flow = GenerationFlow::new(backend, limiter.clone(), gate, 500);
        (flow, limiter)
    }

    fn job() -> GenerationJob {
        GenerationJob::new(
            &PaperRequest::new("Sparse attention for long documents", "research", "ieee"),
            "ctx".into(),
        )
    }

    fn model() -> ModelDescriptor {
        default_catalog().remove(0)
    }

    #[test]
    fn test_attempt_parameters() {
        let m = model();
        let p0 = AttemptParameters::for_attempt(&m, 0);
        assert!((p0.temperature - 0.7).abs() < 1e-6);
        assert_eq!(p0.max_tokens, 8000);
        assert_eq!(p0.timeout, Duration::from_secs(120));

        let p1 = AttemptParameters::for_attempt(&m, 1);
        assert!((p1.temperature - 0.8).abs() < 1e-6);
        assert_eq!(p1.max_tokens, 7500);
        assert_eq!(p1.timeout, Duration::from_secs(150));

        let p5 = AttemptParameters::for_attempt(&m, 5);
        assert!((p5.temperature - 1.0).abs() < 1e-6);
        assert_eq!(p5.max_tokens, 5500);

        let mut small = m.clone();
        small.max_tokens = 3000;
        assert_eq!(AttemptParameters::for_attempt(&small, 4).max_tokens, 2000);
    }

    #[test]
    fn test_attempt_parameters_with_huge_attempt() {
        let m = model();
        let p = AttemptParameters::for_attempt(&m, u32::MAX);
        assert_eq!(p.max_tokens, 2000);
        assert!((p.temperature - 1.0).abs() < 1e-6);
        assert_eq!(p.timeout, Duration::from_secs(120 + 30 * u64::from(u32::MAX)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_is_honoured() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::RateLimited { status: 429, retry_after: Some(7) }),
            Ok(long_text()),
        ]);
        let (flow, limiter) = setup(backend.clone());
        let mut job = job();

        let outcome = flow.run(&model(), "prompt", &mut job).await;

        assert_eq!(outcome, ModelOutcome::Generated(long_text()));
        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].0 - requests[0].0, Duration::from_secs(7));
        assert_eq!(requests[1].1.attempt, 1);
        assert_eq!(requests[1].1.max_tokens, 7500);
        assert_eq!(job.failure_count(), 1);
        // 成功后清零
        assert_eq!(limiter.failure_count(&model().name), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_is_capped() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::RateLimited { status: 429, retry_after: Some(600) }),
            Ok(long_text()),
        ]);
        let (flow, _) = setup(backend.clone());

        flow.run(&model(), "prompt", &mut job()).await;

        let requests = backend.requests();
        assert_eq!(requests[1].0 - requests[0].0, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_without_hint_uses_backoff() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::RateLimited { status: 429, retry_after: None }),
            Ok(long_text()),
        ]);
        let (flow, _) = setup(backend.clone());

        flow.run(&model(), "prompt", &mut job()).await;

        // 退避 1s 低于模型的 base_delay_secs = 2
        let requests = backend.requests();
        assert_eq!(requests[1].0 - requests[0].0, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_above_base_delay_is_kept() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::RateLimited { status: 429, retry_after: None }),
            Err(BackendError::RateLimited { status: 429, retry_after: None }),
            Err(BackendError::RateLimited { status: 429, retry_after: None }),
            Ok(long_text()),
        ]);
        let (flow, _) = setup(backend.clone());
        let mut m = model();
        m.base_delay_secs = 0;
        m.max_retries = 4;

        // 第三次限流已触发熔断，只验证前两次等待
        flow.run(&m, "prompt", &mut job()).await;

        let requests = backend.requests();
        assert_eq!(requests[1].0 - requests[0].0, Duration::from_secs(1));
        assert_eq!(requests[2].0 - requests[1].0, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_do_not_trip_breaker() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::Timeout { after_secs: 120 }),
            Err(BackendError::Timeout { after_secs: 150 }),
            Err(BackendError::Connection { message: "reset".into() }),
        ]);
        let (flow, limiter) = setup(backend.clone());
        let mut job = job();
        let start = tokio::time::Instant::now();

        let outcome = flow.run(&model(), "prompt", &mut job).await;

        assert_eq!(outcome, ModelOutcome::Exhausted);
        assert_eq!(backend.requests().len(), 3);
        assert_eq!(limiter.failure_count(&model().name), 0);
        assert!(limiter.is_available(&model().name));
        assert_eq!(job.failure_count(), 3);
        // 5s + 10s，最后一次失败后不再等待
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_trip_breaker() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::Server { status: 502 }),
            Err(BackendError::Server { status: 503 }),
            Err(BackendError::Server { status: 500 }),
        ]);
        let (flow, limiter) = setup(backend.clone());
        let start = tokio::time::Instant::now();

        let outcome = flow.run(&model(), "prompt", &mut job()).await;

        assert_eq!(outcome, ModelOutcome::Exhausted);
        assert_eq!(limiter.failure_count(&model().name), 3);
        assert!(!limiter.is_available(&model().name));
        assert_eq!(start.elapsed(), Duration::from_secs(30));

        // 熔断中不再发出请求
        let outcome = flow.run(&model(), "prompt", &mut job()).await;
        assert_eq!(outcome, ModelOutcome::CircuitOpen);
        assert_eq!(backend.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_tripped_during_wait_stops_retry() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::Server { status: 503 }),
            Err(BackendError::Server { status: 503 }),
            Err(BackendError::Server { status: 503 }),
        ]);
        let (flow, limiter) = setup(backend.clone());
        let m = model();
        let mut job = job();

        let (outcome, _) = tokio::join!(flow.run(&m, "prompt", &mut job), async {
            // 另一个任务在 10s 等待期间报告两次服务端错误
            tokio::time::sleep(Duration::from_secs(5)).await;
            limiter.record_failure(&m.name, FailureKind::ServerError);
            limiter.record_failure(&m.name, FailureKind::ServerError);
            assert!(!limiter.is_available(&m.name));
        });

        assert_eq!(outcome, ModelOutcome::CircuitOpen);
        assert_eq!(backend.requests().len(), 1);
        assert_eq!(job.failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_failure_abandons_model() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::Api { status: 404, message: "No endpoints found".into() }),
            Ok(long_text()),
        ]);
        let (flow, limiter) = setup(backend.clone());

        let outcome = flow.run(&model(), "prompt", &mut job()).await;

        assert_eq!(outcome, ModelOutcome::Abandoned);
        assert_eq!(backend.requests().len(), 1);
        assert_eq!(limiter.failure_count(&model().name), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_response_abandons_model() {
        let backend = ScriptedBackend::new(vec![Ok("too short".into()), Ok(long_text())]);
        let (flow, limiter) = setup(backend.clone());
        let mut job = job();

        let outcome = flow.run(&model(), "prompt", &mut job).await;

        assert_eq!(outcome, ModelOutcome::TooShort);
        assert_eq!(backend.requests().len(), 1);
        assert_eq!(limiter.failure_count(&model().name), 0);
        assert_eq!(job.failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_length_boundary() {
        let exactly = "a".repeat(500);
        let backend = ScriptedBackend::new(vec![Ok(format!("  {}  ", exactly))]);
        let (flow, _) = setup(backend);
        assert_eq!(
            flow.run(&model(), "prompt", &mut job()).await,
            ModelOutcome::TooShort
        );

        let backend = ScriptedBackend::new(vec![Ok("a".repeat(501))]);
        let (flow, _) = setup(backend);
        assert!(matches!(
            flow.run(&model(), "prompt", &mut job()).await,
            ModelOutcome::Generated(_)
        ));
    }
}
