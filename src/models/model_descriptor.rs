use serde::{Deserialize, Serialize};

/// 后端模型描述
///
/// 进程启动时加载，之后只读。按 `priority` 升序构成回退顺序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// 模型名称（唯一）
    pub name: String,
    /// 最大输出 token 数
    pub max_tokens: u32,
    /// 可读名称
    pub description: String,
    /// 优先级，越小越先尝试
    pub priority: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 限流且无 `retry-after` 提示时的最短等待（秒）
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,
    /// 小上下文模型，使用精简提示词
    #[serde(default)]
    pub lightweight: bool,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1
}

/// 内置模型列表
pub fn default_catalog() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor {
            name: "meta-llama/llama-4-maverick-17b-128e-instruct:free".to_string(),
            max_tokens: 8000,
            description: "Meta Llama 4 Maverick".to_string(),
            priority: 1,
            max_retries: 3,
            base_delay_secs: 2,
            lightweight: false,
        },
        ModelDescriptor {
            name: "google/gemma-2-9b-it:free".to_string(),
            max_tokens: 6000,
            description: "Google Gemma 2 9B".to_string(),
            priority: 2,
            max_retries: 3,
            base_delay_secs: 1,
            lightweight: false,
        },
        ModelDescriptor {
            name: "microsoft/phi-3-mini-128k-instruct:free".to_string(),
            max_tokens: 4000,
            description: "Microsoft Phi-3 Mini".to_string(),
            priority: 3,
            max_retries: 2,
            base_delay_secs: 1,
            lightweight: true,
        },
    ]
}

/// 按优先级排序（稳定排序，同优先级保持原顺序）
pub fn sort_by_priority(mut models: Vec<ModelDescriptor>) -> Vec<ModelDescriptor> {
    models.sort_by_key(|m| m.priority);
    models
}
