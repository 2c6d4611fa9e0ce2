//! 章节解析服务 - 业务能力层
//!
//! 只负责"把生成的文本切分为固定章节"能力，不关心流程
//!
//! 识别规则：
//! - 章节标题为行首的 `**标题**`，标题限定为 Abstract / Introduction / Related Work /
//!   Methodology / Results / Conclusion / References（区分大小写），可带冒号或连字符
//! - 第一个标题之前的文本若非空且少于 200 字符，取其第一行作为论文标题，
//!   否则使用默认标题
//! - 没有识别到任何标题时，全部内容放入 abstract，其余章节（含标题）为空

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::models::section::{normalize_heading, SectionKey};
use crate::models::PaperSections;

/// 可识别的章节标题
pub const SECTION_TITLES: [&str; 7] = [
    "Abstract",
    "Introduction",
    "Related Work",
    "Methodology",
    "Results",
    "Conclusion",
    "References",
];

/// 未能识别标题时的默认论文标题
pub const DEFAULT_TITLE: &str = "Generated Research Paper";

/// 标题启发式的长度上限（字符）
const TITLE_MAX_CHARS: usize = 200;

static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?m)^\*\*({})\*\*\s*[:\-]?\s*\n",
        SECTION_TITLES.join("|")
    );
    Regex::new(&pattern).expect("章节标题正则无效")
});

/// 解析生成的论文文本
pub fn parse_sections(paper: &str) -> PaperSections {
    let mut result = PaperSections::default();
    let matches: Vec<_> = HEADER_PATTERN.captures_iter(paper).collect();

    if matches.is_empty() {
        warn!("❌ 未匹配到任何章节标题，全部内容归入 abstract");
        result.abstract_text = paper.trim().to_string();
        return result;
    }

    // 第一个标题之前的内容作为候选标题
    let first_header_start = matches[0].get(0).map(|m| m.start()).unwrap_or(paper.len());
    result.title = derive_title(&paper[..first_header_start]);

    for (i, caps) in matches.iter().enumerate() {
        let (Some(whole), Some(raw_title)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let start = whole.end();
        let end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(paper.len());
        let content = paper[start..end].trim();

        let key = normalize_heading(raw_title.as_str());
        match SectionKey::from_key(&key) {
            Some(section) => result.set(section, content),
            None => warn!(
                "⚠️ 无法识别的章节键 '{}' (原始标题: '{}')，内容已丢弃",
                key,
                raw_title.as_str()
            ),
        }
    }

    debug!(
        "✅ 已解析章节: {:?}",
        result.filled().iter().map(|k| k.as_str()).collect::<Vec<_>>()
    );

    result
}

/// 从第一个标题之前的文本推导论文标题
fn derive_title(preamble: &str) -> String {
    let candidate = preamble.trim();
    if candidate.is_empty() || candidate.chars().count() >= TITLE_MAX_CHARS {
        return DEFAULT_TITLE.to_string();
    }

    match candidate.split_once('\n') {
        Some((first_line, _)) => first_line.trim().to_string(),
        None => candidate.to_string(),
    }
}
