//! 提示词构建服务 - 业务能力层
//!
//! 只负责"为某个模型拼装提示词"能力，纯函数，不做 I/O

use crate::models::ModelDescriptor;

/// 轻量模板中研究背景的最大字符数
pub const LIGHTWEIGHT_CONTEXT_CHARS: usize = 1000;

/// 提示词构建器
///
/// 职责：
/// - 根据模型能力选择模板（轻量 / 完整）
/// - 同样的输入总是得到同样的输出
/// - 不关心模型调用与重试
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// 构建提示词
    ///
    /// 轻量模型使用六个章节的简化模板，研究背景只保留前 1000 个字符；
    /// 其他模型使用包含 Related Work 与 Discussion 的完整模板
    pub fn build(
        &self,
        topic: &str,
        paper_type: &str,
        research_context: &str,
        model: &ModelDescriptor,
    ) -> String {
        if model.lightweight {
            lightweight_prompt(topic, paper_type, research_context)
        } else {
            full_prompt(topic, paper_type, research_context)
        }
    }
}

fn lightweight_prompt(topic: &str, paper_type: &str, research_context: &str) -> String {
    let context: String = research_context
        .chars()
        .take(LIGHTWEIGHT_CONTEXT_CHARS)
        .collect();

    format!(
        r#"Write a complete {paper_type} paper on "{topic}". Use these exact sections:

**Abstract**
Write a 150-200 word summary of the research.

**Introduction**
Provide background and research objectives.

**Methodology**
Describe the research approach and methods.

**Results**
Present key findings and analysis.

**Conclusion**
Summarize findings and future work.

**References**
Include at least 8 academic references.

Research context: {context}

Write in formal academic style with technical details."#
    )
}

fn full_prompt(topic: &str, paper_type: &str, research_context: &str) -> String {
    format!(
        r#"You are a world-class academic researcher. Write a comprehensive {paper_type} paper on: "{topic}"

**STRUCTURE (use exact headers):**

**Abstract**
Write a detailed 200-300 word abstract summarizing research problem, methodology, findings, and implications.

**Introduction**
Provide comprehensive background, problem definition, research objectives, and contribution statement.

**Related Work**
Review existing literature, identify gaps, and position this work in the research landscape.

**Methodology**
Describe research approach, experimental design, data collection, and analysis methods.

**Results**
Present comprehensive findings with detailed analysis and interpretation.

**Discussion**
Analyze implications, discuss limitations, and compare with existing work.

**Conclusion**
Summarize contributions, implications, and future research directions.

**References**
Include 12+ properly formatted academic references.

**Research Context:**
{research_context}

**Requirements:**
- Formal academic language
- Technical depth and rigor
- Original insights and analysis
- Minimum 2500 words
- Proper citations throughout

Generate the complete paper now:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_catalog;

    fn model(lightweight: bool) -> ModelDescriptor {
        default_catalog()
            .into_iter()
            .find(|m| m.lightweight == lightweight)
            .unwrap()
    }

    #[test]
    fn test_full_prompt_is_deterministic() {
        let builder = PromptBuilder::new();
        let m = model(false);
        let a = builder.build("Graph neural networks for chemistry", "research", "ctx", &m);
        let b = builder.build("Graph neural networks for chemistry", "research", "ctx", &m);
        assert_eq!(a, b);

        assert!(a.starts_with(
            "You are a world-class academic researcher. Write a comprehensive research paper on: \"Graph neural networks for chemistry\""
        ));
        assert!(a.contains("**Related Work**"));
        assert!(a.contains("**Discussion**"));
        assert!(a.contains("**Research Context:**\nctx\n"));
        assert!(a.contains("- Minimum 2500 words"));
        assert!(a.ends_with("Generate the complete paper now:"));
    }

    #[test]
    fn test_lightweight_prompt_truncates_context() {
        let builder = PromptBuilder::new();
        let context = "é".repeat(1500);
        let prompt = builder.build("Quantum error correction", "survey", &context, &model(true));

        assert!(prompt.starts_with(
            "Write a complete survey paper on \"Quantum error correction\". Use these exact sections:"
        ));
        assert!(!prompt.contains("**Related Work**"));
        assert!(!prompt.contains("**Discussion**"));
        let expected = format!("Research context: {}\n\n", "é".repeat(1000));
        assert!(prompt.contains(&expected));
        assert!(prompt.ends_with("Write in formal academic style with technical details."));
    }

    #[test]
    fn test_lightweight_prompt_keeps_short_context() {
        let prompt = PromptBuilder::new().build(
            "Quantum error correction",
            "survey",
            "short context",
            &model(true),
        );
        assert!(prompt.contains("Research context: short context\n"));
    }
}
