//! 排版服务 - 业务能力层
//!
//! 只负责"把文档渲染成文本"能力

use crate::models::{ParsedDocument, SectionKey};

/// 按论文格式加上标识头
pub fn apply_formatting(content: &str, paper_format: &str) -> String {
    match paper_format.to_lowercase().as_str() {
        "ieee" => format!("📘 IEEE FORMATTED:\n\n{}", content),
        "springer" => format!("📕 Springer FORMAT:\n\n{}", content),
        "elsevier" => format!("📗 Elsevier FORMAT:\n\n{}", content),
        _ => format!("📄 {} FORMAT:\n\n{}", paper_format.to_uppercase(), content),
    }
}

/// 将文档渲染为带章节标题的文本
///
/// 空章节不输出，标题单独成行
pub fn render_document(doc: &ParsedDocument) -> String {
    let mut parts = Vec::new();

    let title = doc.sections.title.trim();
    if !title.is_empty() {
        parts.push(title.to_string());
    }

    for key in SectionKey::ALL.into_iter().filter(|k| *k != SectionKey::Title) {
        let content = doc.sections.get(key).trim();
        if content.is_empty() {
            continue;
        }
        parts.push(format!("**{}**\n{}", key.heading(), content));
    }

    let body = parts.join("\n\n");
    apply_formatting(&body, &doc.metadata.paper_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenerationStatus, PaperMetadata, PaperSections};
    use crate::services::section_parser::parse_sections;

    #[test]
    fn test_format_banners() {
        assert_eq!(apply_formatting("x", "IEEE"), "📘 IEEE FORMATTED:\n\nx");
        assert_eq!(apply_formatting("x", "springer"), "📕 Springer FORMAT:\n\nx");
        assert_eq!(apply_formatting("x", "Elsevier"), "📗 Elsevier FORMAT:\n\nx");
        assert_eq!(apply_formatting("x", "acm"), "📄 ACM FORMAT:\n\nx");
    }

    #[test]
    fn test_rendered_document_parses_back() {
        let mut sections = PaperSections::default();
        sections.set(SectionKey::Title, "Edge Inference");
        sections.set(SectionKey::Abstract, "Short abstract.");
        sections.set(SectionKey::RelatedWork, "Prior art.");
        sections.set(SectionKey::Conclusion, "Done.");

        let doc = ParsedDocument {
            sections: sections.clone(),
            metadata: PaperMetadata {
                topic: "Edge inference on microcontrollers".into(),
                paper_type: "research".into(),
                paper_format: "other".into(),
                model_used: "Test".into(),
                model_name: None,
                generation_time: String::new(),
                word_count: 0,
                char_count: 0,
                missing_sections: Vec::new(),
                success_model_index: None,
                total_attempts: 1,
                status: GenerationStatus::Success,
            },
        };

        let rendered = render_document(&doc);
        let body = rendered
            .strip_prefix("📄 OTHER FORMAT:\n\n")
            .unwrap();
        // 末尾补换行，使最后一个章节也能被识别
        let reparsed = parse_sections(&format!("{}\n", body));
        assert_eq!(reparsed, sections);
    }
}
