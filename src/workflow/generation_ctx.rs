//! 论文生成上下文
//!
//! 封装"我正在为哪个主题生成论文"这一信息

use std::fmt::Display;

use crate::error::FailureKind;
use crate::models::PaperRequest;

/// 一次失败的尝试
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub model: String,
    pub attempt: u32,
    pub kind: FailureKind,
}

/// 论文生成任务
///
/// 每个请求一个，研究背景只获取一次，所有模型共享
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub topic: String,
    pub paper_type: String,
    pub paper_format: String,
    /// arXiv 研究背景
    pub research_context: String,
    /// 所有模型的失败记录（仅用于诊断）
    pub failed_attempts: Vec<FailedAttempt>,
}

impl GenerationJob {
    /// 创建新的生成任务
    pub fn new(request: &PaperRequest, research_context: String) -> Self {
        Self {
            topic: request.topic.trim().to_string(),
            paper_type: request.paper_type.clone(),
            paper_format: request.paper_format.clone(),
            research_context,
            failed_attempts: Vec::new(),
        }
    }

    /// 记录一次失败
    pub fn record_failure(&mut self, model: &str, attempt: u32, kind: FailureKind) {
        self.failed_attempts.push(FailedAttempt {
            model: model.to_string(),
            attempt,
            kind,
        });
    }

    /// 失败次数合计
    pub fn failure_count(&self) -> u32 {
        self.failed_attempts.len() as u32
    }
}

impl Display for GenerationJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview: String = self.topic.chars().take(40).collect();
        write!(
            f,
            "[主题 {} 类型#{} 格式#{}]",
            preview, self.paper_type, self.paper_format
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ledger() {
        let request = PaperRequest::new("  Federated learning at the edge ", "research", "ieee");
        let mut job = GenerationJob::new(&request, "ctx".into());
        assert_eq!(job.topic, "Federated learning at the edge");
        assert_eq!(job.failure_count(), 0);

        job.record_failure("model-a", 0, FailureKind::ServerError);
        job.record_failure("model-b", 1, FailureKind::TransientConnection);
        assert_eq!(job.failure_count(), 2);
        assert_eq!(job.failed_attempts[1].kind, FailureKind::TransientConnection);

        assert_eq!(
            job.to_string(),
            "[主题 Federated learning at the edge 类型#research 格式#ieee]"
        );
    }
}
