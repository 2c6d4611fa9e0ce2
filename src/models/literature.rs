use serde::{Deserialize, Serialize};

/// 文献检索结果条目
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteratureEntry {
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
}

impl LiteratureEntry {
    pub fn new(title: impl Into<String>, summary: impl Into<String>, published: Option<&str>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            published: published.map(str::to_string),
        }
    }
}
