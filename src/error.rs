use thiserror::Error;

/// 应用程序错误类型
///
/// 只有 `Config` 和 `Validation` 会从论文生成流程中向调用方传播，
/// 后端调用失败在流程内部被吸收，最坏情况返回兜底文档。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 请求校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少 API 密钥
    #[error("未找到 API 密钥，请在 .env 文件中设置 {var_name}")]
    MissingApiKey { var_name: String },
    /// 模型列表无效
    #[error("模型列表无效: {reason}")]
    InvalidModelCatalog { reason: String },
    /// HTTP 客户端初始化失败
    #[error("HTTP 客户端初始化失败: {message}")]
    HttpClient { message: String },
}

/// 请求校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// 主题为空
    #[error("主题不能为空")]
    EmptyTopic,
    /// 主题过短
    #[error("主题至少需要 {min} 个字符 (当前: {actual})")]
    TopicTooShort { min: usize, actual: usize },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 后端调用错误 ==========

/// 失败类型
///
/// 决定重试策略以及是否计入熔断器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// 显式限流信号（429 或限流消息）
    RateLimited,
    /// 超时 / 连接问题，不计入熔断器
    TransientConnection,
    /// 5xx 服务端错误
    ServerError,
    /// 无法识别的错误，立即放弃当前模型
    Unknown,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::RateLimited => "rate_limited",
            FailureKind::TransientConnection => "transient_connection",
            FailureKind::ServerError => "server_error",
            FailureKind::Unknown => "unknown",
        }
    }

    /// 是否计入熔断器失败次数
    pub fn counts_toward_breaker(self) -> bool {
        !matches!(self, FailureKind::TransientConnection)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单次后端请求错误
#[derive(Debug, Error)]
pub enum BackendError {
    /// 请求频率限制
    #[error("Rate limit exceeded (HTTP {status}), retry-after: {retry_after:?}")]
    RateLimited {
        status: u16,
        retry_after: Option<u64>,
    },
    /// 请求超时
    #[error("Request timeout after {after_secs}s")]
    Timeout { after_secs: u64 },
    /// 连接失败
    #[error("Connection error: {message}")]
    Connection { message: String },
    /// 服务端错误
    #[error("Server error: {status}")]
    Server { status: u16 },
    /// API 返回的其他错误
    #[error("API Error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    /// 响应解析失败
    #[error("响应解析失败: {message}")]
    Decode { message: String },
    /// 请求体构建失败
    #[error("请求构建失败: {message}")]
    InvalidRequest { message: String },
    /// 请求闸门不可用
    ///
    /// 闸门的信号量在运行期间不会关闭，这里只对应 `acquire_owned` 的错误分支
    #[error("请求闸门已关闭")]
    GateClosed,
}

impl BackendError {
    /// 将错误归类为失败类型
    pub fn kind(&self) -> FailureKind {
        match self {
            BackendError::RateLimited { .. } => FailureKind::RateLimited,
            BackendError::Timeout { .. } | BackendError::Connection { .. } => {
                FailureKind::TransientConnection
            }
            BackendError::Server { .. } => FailureKind::ServerError,
            BackendError::Api { .. }
            | BackendError::Decode { .. }
            | BackendError::InvalidRequest { .. }
            | BackendError::GateClosed => FailureKind::Unknown,
        }
    }

    /// 服务端建议的等待秒数
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            BackendError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON 序列化失败: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建模型列表无效错误
    pub fn invalid_catalog(reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidModelCatalog {
            reason: reason.into(),
        })
    }

    /// 是否为配置类错误
    pub fn is_config(&self) -> bool {
        matches!(self, AppError::Config(_))
    }

    /// 是否为校验类错误
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
