use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::section::SectionKey;

/// 主题最少字符数（去除首尾空白后）
pub const MIN_TOPIC_CHARS: usize = 10;

/// 论文生成请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRequest {
    pub topic: String,
    pub paper_type: String,
    pub paper_format: String,
}

impl PaperRequest {
    pub fn new(
        topic: impl Into<String>,
        paper_type: impl Into<String>,
        paper_format: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            paper_type: paper_type.into(),
            paper_format: paper_format.into(),
        }
    }

    /// 校验请求：主题非空且不少于 10 个字符
    pub fn validate(&self) -> Result<(), ValidationError> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        let actual = topic.chars().count();
        if actual < MIN_TOPIC_CHARS {
            return Err(ValidationError::TopicTooShort {
                min: MIN_TOPIC_CHARS,
                actual,
            });
        }
        Ok(())
    }
}

/// 论文各章节内容
///
/// 所有章节始终存在，缺失时为空字符串
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSections {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub introduction: String,
    pub related_work: String,
    pub methodology: String,
    pub results: String,
    pub conclusion: String,
    pub references: String,
}

impl PaperSections {
    pub fn get(&self, key: SectionKey) -> &str {
        match key {
            SectionKey::Title => &self.title,
            SectionKey::Abstract => &self.abstract_text,
            SectionKey::Introduction => &self.introduction,
            SectionKey::RelatedWork => &self.related_work,
            SectionKey::Methodology => &self.methodology,
            SectionKey::Results => &self.results,
            SectionKey::Conclusion => &self.conclusion,
            SectionKey::References => &self.references,
        }
    }

    pub fn set(&mut self, key: SectionKey, content: impl Into<String>) {
        let slot = match key {
            SectionKey::Title => &mut self.title,
            SectionKey::Abstract => &mut self.abstract_text,
            SectionKey::Introduction => &mut self.introduction,
            SectionKey::RelatedWork => &mut self.related_work,
            SectionKey::Methodology => &mut self.methodology,
            SectionKey::Results => &mut self.results,
            SectionKey::Conclusion => &mut self.conclusion,
            SectionKey::References => &mut self.references,
        };
        *slot = content.into();
    }

    /// 内容为空的必需章节
    pub fn missing_required(&self) -> Vec<SectionKey> {
        SectionKey::REQUIRED
            .into_iter()
            .filter(|key| self.get(*key).trim().is_empty())
            .collect()
    }

    /// 非空章节（用于日志）
    pub fn filled(&self) -> Vec<SectionKey> {
        SectionKey::ALL
            .into_iter()
            .filter(|key| !self.get(*key).is_empty())
            .collect()
    }
}

/// 生成状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Success,
    FailedGeneration,
}

/// 论文元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub topic: String,
    pub paper_type: String,
    pub paper_format: String,
    /// 模型的可读名称
    pub model_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    pub generation_time: String,
    pub word_count: usize,
    pub char_count: usize,
    #[serde(default)]
    pub missing_sections: Vec<SectionKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_model_index: Option<usize>,
    pub total_attempts: u32,
    pub status: GenerationStatus,
}

/// 解析后的论文文档
///
/// 序列化为扁平的 JSON 对象：各章节 + `_metadata`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    #[serde(flatten)]
    pub sections: PaperSections,
    #[serde(rename = "_metadata")]
    pub metadata: PaperMetadata,
}

impl ParsedDocument {
    pub fn is_success(&self) -> bool {
        self.metadata.status == GenerationStatus::Success
    }
}
