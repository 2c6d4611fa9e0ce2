//! 研究背景服务 - 业务能力层
//!
//! 只负责"为一个主题拼装 arXiv 研究背景"能力，不关心模型与重试策略
//!
//! 任何失败都不会向上传播，最坏情况返回固定的提示文本

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::clients::LiteratureSource;
use crate::models::LiteratureEntry;

/// 没有找到任何论文时返回的文本
pub const NO_CONTEXT_SENTINEL: &str = "No recent papers found on arXiv for this topic.";

/// 最多保留的论文条目数
pub const MAX_SNIPPETS: usize = 6;
/// 每个检索式取前几条结果
const ENTRIES_PER_QUERY: usize = 2;
/// 摘要预览的最大字符数
const SUMMARY_PREVIEW_CHARS: usize = 300;
/// 外层尝试次数
const MAX_ATTEMPTS: u32 = 2;

/// 研究背景服务
pub struct ResearchService {
    source: Arc<dyn LiteratureSource>,
    query_delay: Duration,
}

impl ResearchService {
    /// 创建新的研究背景服务
    ///
    /// `query_delay` 为相邻两次检索之间的间隔
    pub fn new(source: Arc<dyn LiteratureSource>, query_delay: Duration) -> Self {
        Self {
            source,
            query_delay,
        }
    }

    /// 获取主题的研究背景
    ///
    /// 依次使用全文 / 标题 / 摘要三个检索式，每个检索式取前 2 条，
    /// 去重后最多保留 6 条，以空行连接
    pub async fn fetch(&self, topic: &str, max_results: usize) -> String {
        for attempt in 0..MAX_ATTEMPTS {
            let snippets = self.collect_snippets(topic, max_results).await;

            if !snippets.is_empty() {
                info!("✅ 找到 {} 篇 arXiv 论文", snippets.len());
                return snippets.join("\n\n");
            }

            error!("❌ arXiv 第 {} 次尝试未获得任何结果", attempt + 1);
            if attempt + 1 < MAX_ATTEMPTS {
                tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
            }
        }

        NO_CONTEXT_SENTINEL.to_string()
    }

    async fn collect_snippets(&self, topic: &str, max_results: usize) -> Vec<String> {
        let queries = [
            format!("all:{}", topic),
            format!("ti:{}", topic),
            format!("abs:{}", topic),
        ];

        let mut snippets: Vec<String> = Vec::new();

        for (i, query) in queries.iter().enumerate() {
            if i > 0 && !self.query_delay.is_zero() {
                tokio::time::sleep(self.query_delay).await;
            }

            match self.source.search(query, max_results).await {
                Ok(entries) => {
                    debug!("检索 '{}' 返回 {} 条结果", query, entries.len());
                    for entry in entries.iter().take(ENTRIES_PER_QUERY) {
                        let snippet = format_snippet(entry);
                        if !snippets.contains(&snippet) {
                            snippets.push(snippet);
                        }
                    }
                }
                Err(e) => {
                    warn!("⚠️ 检索 '{}' 失败: {}", query, e);
                }
            }
        }

        snippets.truncate(MAX_SNIPPETS);
        snippets
    }
}

/// 格式化单条论文
fn format_snippet(entry: &LiteratureEntry) -> String {
    let title = entry.title.replace('\n', " ");
    let summary: String = entry
        .summary
        .replace('\n', " ")
        .trim()
        .chars()
        .take(SUMMARY_PREVIEW_CHARS)
        .collect();
    let published = entry
        .published
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| p.chars().take(10).collect::<String>())
        .unwrap_or_else(|| "Recent".to_string());

    format!("• **{}** ({})\n  {}...", title.trim(), published, summary)
}
