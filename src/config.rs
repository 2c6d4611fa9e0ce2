use std::time::Duration;

/// API 密钥所在的环境变量
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    /// OpenRouter API 密钥，缺失时生成请求直接失败
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    /// 请求头 HTTP-Referer
    pub http_referer: String,
    /// 请求头 X-Title
    pub app_title: String,
    /// 模型列表 TOML 文件（可选，不设置则使用内置列表）
    pub models_file: Option<String>,
    // --- arXiv 配置 ---
    pub arxiv_api_url: String,
    /// 每个查询变体请求的结果数量
    pub research_max_results: usize,
    /// 相邻 arXiv 查询之间的间隔
    pub arxiv_query_delay_ms: u64,
    // --- 限流配置 ---
    /// 全局同时进行中的后端请求上限
    pub max_concurrent_requests: usize,
    /// 任意两次后端请求之间的最小间隔
    pub global_request_delay_ms: u64,
    /// 切换到下一个模型前的等待时间
    pub inter_model_delay_ms: u64,
    // --- 质量校验 ---
    /// 响应文本的最小长度（字符）
    pub min_response_chars: usize,
    /// 允许缺失的必需章节数量
    pub max_missing_sections: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: None,
            llm_api_base_url: "https://openrouter.ai/api/v1".to_string(),
            http_referer: "http://localhost:5173".to_string(),
            app_title: "Research Paper Generator Pro".to_string(),
            models_file: None,
            arxiv_api_url: "https://export.arxiv.org/api/query".to_string(),
            research_max_results: 6,
            arxiv_query_delay_ms: 500,
            max_concurrent_requests: 2,
            global_request_delay_ms: 1000,
            inter_model_delay_ms: 3000,
            min_response_chars: 500,
            max_missing_sections: 2,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var(API_KEY_ENV).ok().filter(|v| !v.trim().is_empty()),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            http_referer: std::env::var("HTTP_REFERER").unwrap_or(default.http_referer),
            app_title: std::env::var("APP_TITLE").unwrap_or(default.app_title),
            models_file: std::env::var("MODELS_FILE").ok().or(default.models_file),
            arxiv_api_url: std::env::var("ARXIV_API_URL").unwrap_or(default.arxiv_api_url),
            research_max_results: std::env::var("RESEARCH_MAX_RESULTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.research_max_results),
            arxiv_query_delay_ms: std::env::var("ARXIV_QUERY_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.arxiv_query_delay_ms),
            max_concurrent_requests: std::env::var("MAX_CONCURRENT_REQUESTS").ok().and_then(|v| v.parse().ok()).filter(|v: &usize| *v > 0).unwrap_or(default.max_concurrent_requests),
            global_request_delay_ms: std::env::var("GLOBAL_REQUEST_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.global_request_delay_ms),
            inter_model_delay_ms: std::env::var("INTER_MODEL_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.inter_model_delay_ms),
            min_response_chars: std::env::var("MIN_RESPONSE_CHARS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.min_response_chars),
            max_missing_sections: std::env::var("MAX_MISSING_SECTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_missing_sections),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 带 API 密钥的配置（常用于测试与批处理）
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.llm_api_key = Some(key.into());
        self
    }

    pub fn global_request_delay(&self) -> Duration {
        Duration::from_millis(self.global_request_delay_ms)
    }

    pub fn inter_model_delay(&self) -> Duration {
        Duration::from_millis(self.inter_model_delay_ms)
    }

    pub fn arxiv_query_delay(&self) -> Duration {
        Duration::from_millis(self.arxiv_query_delay_ms)
    }
}
