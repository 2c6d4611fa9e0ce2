//! # Paper Generator
//!
//! 一个调用多个 LLM 模型生成学术论文草稿的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有共享状态与稀缺资源，只暴露能力
//! - `RateLimitManager` - 按模型维护失败次数、熔断与退避
//! - `RequestGate` - 全局请求配额（最多 2 个进行中的请求）与请求间隔
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 外部 API 的调用与错误归类
//! - `LlmClient` - OpenRouter chat completions
//! - `ArxivClient` - arXiv Atom 检索
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `PromptBuilder` - 按模型能力拼装提示词
//! - `ResearchService` - 拼装 arXiv 研究背景
//! - `section_parser` - 把生成的文本切分为章节
//! - `formatter` - 渲染文档与格式标识
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"用一个模型生成一篇论文"的重试流程
//! - `GenerationJob` - 上下文封装（主题 + 研究背景 + 失败记录）
//! - `GenerationFlow` - 熔断检查 → 请求 → 按失败类型等待 / 放弃
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/paper_generator` - 单篇论文：模型回退、质量校验、兜底文档
//! - `orchestrator/batch_processor` - 批量论文：并发任务与结果输出
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{ModelDescriptor, PaperRequest, ParsedDocument};
pub use orchestrator::{BatchProcessor, PaperGenerator};
pub use workflow::{GenerationFlow, GenerationJob};
