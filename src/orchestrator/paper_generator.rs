//! 单篇论文生成器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一篇论文的完整生成过程，是论文级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **前置检查**：API 密钥、请求校验，失败时在任何后端调用之前返回错误
//! 2. **研究背景**：每篇论文只获取一次，所有模型共享
//! 3. **模型回退**：按优先级依次委托 `GenerationFlow`
//! 4. **质量校验**：必需章节缺失过多时换下一个模型
//! 5. **兜底文档**：所有模型都失败时返回固定内容，不返回错误

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::clients::{ArxivClient, ChatBackend, LiteratureSource, LlmClient};
use crate::config::{Config, API_KEY_ENV};
use crate::error::{AppResult, ConfigError};
use crate::infrastructure::{RateLimitManager, RequestGate};
use crate::models::model_descriptor::sort_by_priority;
use crate::models::{
    default_catalog, load_model_catalog, GenerationStatus, ModelDescriptor, PaperMetadata,
    PaperRequest, PaperSections, ParsedDocument, SectionKey,
};
use crate::services::{parse_sections, PromptBuilder, ResearchService};
use crate::utils::logging::truncate_text;
use crate::workflow::{GenerationFlow, GenerationJob, ModelOutcome};

/// 兜底文档使用的模型名称
pub const FALLBACK_MODEL_LABEL: &str = "Emergency Fallback";

/// 论文生成器
///
/// 可在多个任务间共享（`Arc<PaperGenerator>`），
/// 熔断状态与请求闸门随之共享
pub struct PaperGenerator {
    config: Config,
    models: Vec<ModelDescriptor>,
    research: ResearchService,
    prompts: PromptBuilder,
    flow: GenerationFlow,
    rate_limiter: Arc<RateLimitManager>,
}

impl PaperGenerator {
    /// 根据配置创建生成器
    ///
    /// 设置了 `MODELS_FILE` 时从 TOML 加载模型列表，否则使用内置列表
    pub async fn from_config(config: Config) -> AppResult<Self> {
        let models = match &config.models_file {
            Some(path) => {
                info!("📁 加载模型列表: {}", path);
                load_model_catalog(Path::new(path)).await?
            }
            None => default_catalog(),
        };

        let backend = Arc::new(LlmClient::new(&config)?);
        let literature = Arc::new(ArxivClient::new(&config)?);

        Ok(Self::with_components(
            config,
            models,
            backend,
            literature,
            Arc::new(RateLimitManager::new()),
        ))
    }

    /// 使用指定组件创建生成器
    pub fn with_components(
        config: Config,
        models: Vec<ModelDescriptor>,
        backend: Arc<dyn ChatBackend>,
        literature: Arc<dyn LiteratureSource>,
        rate_limiter: Arc<RateLimitManager>,
    ) -> Self {
        let gate = Arc::new(RequestGate::new(
            config.max_concurrent_requests,
            config.global_request_delay(),
        ));
        let flow = GenerationFlow::new(
            backend,
            rate_limiter.clone(),
            gate,
            config.min_response_chars,
        );
        let research = ResearchService::new(literature, config.arxiv_query_delay());

        Self {
            models: sort_by_priority(models),
            research,
            prompts: PromptBuilder::new(),
            flow,
            rate_limiter,
            config,
        }
    }

    /// 按优先级排列的模型列表
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimitManager> {
        &self.rate_limiter
    }

    /// 生成一篇论文
    ///
    /// 只有配置错误（缺少 API 密钥）与校验错误会返回 `Err`，
    /// 后端失败全部在内部消化，最坏情况返回兜底文档
    pub async fn generate(&self, request: &PaperRequest) -> AppResult<ParsedDocument> {
        if self.config.llm_api_key.is_none() {
            return Err(ConfigError::MissingApiKey {
                var_name: API_KEY_ENV.to_string(),
            }
            .into());
        }
        request.validate()?;

        info!("🚀 开始生成论文: {}", request.topic.trim());

        info!("📚 正在获取 arXiv 研究背景...");
        let context = self
            .research
            .fetch(request.topic.trim(), self.config.research_max_results)
            .await;
        if self.config.verbose_logging {
            debug!("研究背景: {}", truncate_text(&context, 300));
        }

        let mut job = GenerationJob::new(request, context);
        let total = self.models.len();

        for (index, model) in self.models.iter().enumerate() {
            info!(
                "{} 🔄 尝试模型 {}/{}: {}",
                job,
                index + 1,
                total,
                model.description
            );

            let prompt =
                self.prompts
                    .build(&job.topic, &job.paper_type, &job.research_context, model);

            if let ModelOutcome::Generated(text) = self.flow.run(model, &prompt, &mut job).await {
                let sections = parse_sections(&text);
                let missing = sections.missing_required();

                if missing.len() <= self.config.max_missing_sections {
                    info!(
                        "{} ✅ 质量检查通过 (缺失: {})",
                        job,
                        format_keys(&missing)
                    );
                    return Ok(self.success_document(&job, model, index, &text, sections, missing));
                }

                warn!(
                    "{} ⚠️ 质量检查未通过，缺失章节: {}",
                    job,
                    format_keys(&missing)
                );
            }

            if index + 1 < total {
                info!("{} ⏰ 等待后尝试下一个模型...", job);
                self.pause_between_models().await;
            }
        }

        error!("{} ❌ 所有模型均失败，返回兜底文档", job);
        Ok(fallback_document(&job))
    }

    async fn pause_between_models(&self) {
        let delay: Duration = self.config.inter_model_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn success_document(
        &self,
        job: &GenerationJob,
        model: &ModelDescriptor,
        index: usize,
        text: &str,
        sections: PaperSections,
        missing: Vec<SectionKey>,
    ) -> ParsedDocument {
        ParsedDocument {
            sections,
            metadata: PaperMetadata {
                topic: job.topic.clone(),
                paper_type: job.paper_type.clone(),
                paper_format: job.paper_format.clone(),
                model_used: model.description.clone(),
                model_name: Some(model.name.clone()),
                generation_time: now_iso(),
                word_count: text.split_whitespace().count(),
                char_count: text.chars().count(),
                missing_sections: missing,
                success_model_index: Some(index),
                total_attempts: job.failure_count() + 1,
                status: GenerationStatus::Success,
            },
        }
    }
}

/// 构建兜底文档
pub fn fallback_document(job: &GenerationJob) -> ParsedDocument {
    let topic = &job.topic;
    let sections = PaperSections {
        title: topic.clone(),
        abstract_text: format!(
            "This paper examines {}. Full generation was not possible due to technical limitations.",
            topic
        ),
        introduction: format!(
            "The study of {} represents an important area of research with significant implications.",
            topic
        ),
        related_work: String::new(),
        methodology: "This section would detail the research methodology in a complete generation."
            .to_string(),
        results: "Key findings and analysis would be presented here.".to_string(),
        conclusion: format!(
            "Further investigation of {} is recommended to advance understanding in this field.",
            topic
        ),
        references: "1. Smith, J. (2023). Research in the field.\n2. Johnson, A. (2023). Advanced studies.\n3. Brown, K. (2023). Current developments.".to_string(),
    };

    ParsedDocument {
        sections,
        metadata: PaperMetadata {
            topic: topic.clone(),
            paper_type: job.paper_type.clone(),
            paper_format: job.paper_format.clone(),
            model_used: FALLBACK_MODEL_LABEL.to_string(),
            model_name: None,
            generation_time: now_iso(),
            word_count: 0,
            char_count: 0,
            missing_sections: Vec::new(),
            success_model_index: None,
            total_attempts: job.failure_count() + 1,
            status: GenerationStatus::FailedGeneration,
        },
    }
}

fn now_iso() -> String {
    chrono::Local::now().to_rfc3339()
}

fn format_keys(keys: &[SectionKey]) -> String {
    if keys.is_empty() {
        return "无".to_string();
    }
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_document() {
        let request = PaperRequest::new("Quantum error correction codes", "review", "springer");
        let mut job = GenerationJob::new(&request, "ctx".into());
        job.record_failure("m", 0, crate::error::FailureKind::ServerError);

        let doc = fallback_document(&job);

        assert!(!doc.is_success());
        assert_eq!(doc.sections.title, "Quantum error correction codes");
        assert_eq!(
            doc.sections.abstract_text,
            "This paper examines Quantum error correction codes. Full generation was not possible due to technical limitations."
        );
        assert!(doc.sections.conclusion.contains("Quantum error correction codes"));
        assert!(doc.sections.references.starts_with("1. Smith, J. (2023)"));
        assert!(doc.sections.missing_required().is_empty());
        assert_eq!(doc.metadata.model_used, FALLBACK_MODEL_LABEL);
        assert_eq!(doc.metadata.word_count, 0);
        assert_eq!(doc.metadata.total_attempts, 2);
        assert_eq!(doc.metadata.paper_format, "springer");
    }

    #[test]
    fn test_format_keys() {
        assert_eq!(format_keys(&[]), "无");
        assert_eq!(
            format_keys(&[SectionKey::Results, SectionKey::Conclusion]),
            "results, conclusion"
        );
    }
}
