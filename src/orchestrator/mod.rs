//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责论文级别与批量级别的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量论文生成器
//! - 并发运行多个生成任务（tokio::spawn）
//! - 共享同一个 `PaperGenerator`
//! - 写出 JSON 结果并汇总统计
//!
//! ### `paper_generator` - 单篇论文生成器
//! - 前置检查（API 密钥、主题校验）
//! - 获取研究背景（每篇一次）
//! - 按优先级遍历模型，委托 `GenerationFlow`
//! - 质量校验与兜底文档
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<PaperRequest>)
//!     ↓
//! paper_generator (处理 Vec<ModelDescriptor>)
//!     ↓
//! workflow::GenerationFlow (处理单个模型的重试)
//!     ↓
//! services (能力层：prompt / research / parser / formatter)
//!     ↓
//! infrastructure (基础设施：RateLimitManager / RequestGate)
//! ```

pub mod batch_processor;
pub mod paper_generator;

// 重新导出主要类型
pub use batch_processor::{BatchProcessor, BatchStats, JobOutcome};
pub use paper_generator::{fallback_document, PaperGenerator, FALLBACK_MODEL_LABEL};
