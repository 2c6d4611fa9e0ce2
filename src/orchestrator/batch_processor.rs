//! 批量论文生成器 - 编排层
//!
//! ## 职责
//!
//! 同时运行多篇论文的生成任务，并把结果写入输出目录。
//!
//! ## 设计特点
//!
//! - **共享生成器**：所有任务共用一个 `Arc<PaperGenerator>`，
//!   熔断状态与请求配额（最多 2 个进行中的后端请求）全局共享
//! - **并发安全**：通过 tokio::spawn + join_all 实现并发
//! - **向下委托**：单篇论文的细节交给 `PaperGenerator`

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::models::{PaperRequest, ParsedDocument};
use crate::orchestrator::paper_generator::PaperGenerator;

/// 单个任务的结果
#[derive(Debug)]
pub enum JobOutcome {
    /// 生成成功，附输出文件路径
    Generated(PathBuf),
    /// 返回了兜底文档
    Fallback(PathBuf),
    /// 配置 / 校验 / 写文件错误
    Failed(String),
}

/// 批量处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub success: usize,
    pub fallback: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn total(&self) -> usize {
        self.success + self.fallback + self.failed
    }
}

/// 批量论文生成器
pub struct BatchProcessor {
    generator: Arc<PaperGenerator>,
    output_dir: PathBuf,
}

impl BatchProcessor {
    pub fn new(generator: Arc<PaperGenerator>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            output_dir: output_dir.into(),
        }
    }

    /// 并发生成所有论文
    pub async fn run(&self, requests: Vec<PaperRequest>) -> AppResult<(BatchStats, Vec<JobOutcome>)> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::file_write_failed(self.output_dir.display().to_string(), e))?;

        let handles: Vec<_> = requests
            .into_iter()
            .enumerate()
            .map(|(idx, request)| {
                let job_index = idx + 1;
                let generator = Arc::clone(&self.generator);
                let output_dir = self.output_dir.clone();

                tokio::spawn(async move {
                    info!("[任务 {}] 📄 开始: {}", job_index, request.topic);
                    match generator.generate(&request).await {
                        Ok(doc) => {
                            let path = output_dir.join(output_file_name(job_index, &request.topic));
                            match write_document(&path, &doc).await {
                                Ok(()) if doc.is_success() => JobOutcome::Generated(path),
                                Ok(()) => JobOutcome::Fallback(path),
                                Err(e) => JobOutcome::Failed(e.to_string()),
                            }
                        }
                        Err(e) => {
                            error!("[任务 {}] ❌ 生成失败: {}", job_index, e);
                            JobOutcome::Failed(e.to_string())
                        }
                    }
                })
            })
            .collect();

        let mut stats = BatchStats::default();
        let mut outcomes = Vec::with_capacity(handles.len());

        for (idx, joined) in join_all(handles).await.into_iter().enumerate() {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("[任务 {}] 任务执行失败: {}", idx + 1, e);
                    JobOutcome::Failed(e.to_string())
                }
            };

            match &outcome {
                JobOutcome::Generated(path) => {
                    stats.success += 1;
                    info!("[任务 {}] ✅ 已保存: {}", idx + 1, path.display());
                }
                JobOutcome::Fallback(path) => {
                    stats.fallback += 1;
                    info!("[任务 {}] 🆘 兜底文档已保存: {}", idx + 1, path.display());
                }
                JobOutcome::Failed(_) => stats.failed += 1,
            }
            outcomes.push(outcome);
        }

        Ok((stats, outcomes))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// 将文档写为 JSON 文件
pub async fn write_document(path: &Path, doc: &ParsedDocument) -> AppResult<()> {
    let json = serde_json::to_string_pretty(doc)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
}

/// 输出文件名：序号 + 主题缩写
fn output_file_name(job_index: usize, topic: &str) -> String {
    let slug: String = topic
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let slug: String = slug
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(40)
        .collect();

    if slug.is_empty() {
        format!("{:03}_paper.json", job_index)
    } else {
        format!("{:03}_{}.json", job_index, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            output_file_name(1, "  Machine Learning in Climate Change! "),
            "001_machine_learning_in_climate_change.json"
        );
        assert_eq!(output_file_name(12, "量子计算"), "012_paper.json");
        assert!(output_file_name(3, &"a ".repeat(100)).len() <= "003_".len() + 40 + ".json".len());
    }
}
