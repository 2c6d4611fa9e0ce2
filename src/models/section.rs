use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 论文章节键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Title,
    Abstract,
    Introduction,
    RelatedWork,
    Methodology,
    Results,
    Conclusion,
    References,
}

/// 规范化后的章节键 → SectionKey
static SECTION_KEYS: phf::Map<&'static str, SectionKey> = phf_map! {
    "title" => SectionKey::Title,
    "abstract" => SectionKey::Abstract,
    "introduction" => SectionKey::Introduction,
    "related_work" => SectionKey::RelatedWork,
    "methodology" => SectionKey::Methodology,
    "results" => SectionKey::Results,
    "conclusion" => SectionKey::Conclusion,
    "references" => SectionKey::References,
};

impl SectionKey {
    /// 全部章节（固定顺序）
    pub const ALL: [SectionKey; 8] = [
        SectionKey::Title,
        SectionKey::Abstract,
        SectionKey::Introduction,
        SectionKey::RelatedWork,
        SectionKey::Methodology,
        SectionKey::Results,
        SectionKey::Conclusion,
        SectionKey::References,
    ];

    /// 质量校验要求的必需章节
    pub const REQUIRED: [SectionKey; 5] = [
        SectionKey::Abstract,
        SectionKey::Introduction,
        SectionKey::Methodology,
        SectionKey::Results,
        SectionKey::Conclusion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::Title => "title",
            SectionKey::Abstract => "abstract",
            SectionKey::Introduction => "introduction",
            SectionKey::RelatedWork => "related_work",
            SectionKey::Methodology => "methodology",
            SectionKey::Results => "results",
            SectionKey::Conclusion => "conclusion",
            SectionKey::References => "references",
        }
    }

    /// 用于渲染的标题文字
    pub fn heading(self) -> &'static str {
        match self {
            SectionKey::Title => "Title",
            SectionKey::Abstract => "Abstract",
            SectionKey::Introduction => "Introduction",
            SectionKey::RelatedWork => "Related Work",
            SectionKey::Methodology => "Methodology",
            SectionKey::Results => "Results",
            SectionKey::Conclusion => "Conclusion",
            SectionKey::References => "References",
        }
    }

    /// 按规范化键查找，未知键返回 None
    pub fn from_key(key: &str) -> Option<Self> {
        SECTION_KEYS.get(key).copied()
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 规范化章节标题：小写，空格与连字符替换为下划线
pub fn normalize_heading(raw: &str) -> String {
    raw.trim().to_lowercase().replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading("Related Work"), "related_work");
        assert_eq!(normalize_heading("Results"), "results");
        assert_eq!(normalize_heading("Follow-Up"), "follow_up");
    }

    #[test]
    fn test_from_key_roundtrips_every_section() {
        for key in SectionKey::ALL {
            assert_eq!(SectionKey::from_key(key.as_str()), Some(key));
            assert_eq!(SectionKey::from_key(&normalize_heading(key.heading())), Some(key));
        }
        assert_eq!(SectionKey::from_key("discussion"), None);
    }
}
