/// LLM API 客户端
///
/// 封装所有与 OpenRouter chat completions 相关的调用逻辑，
/// 并把 HTTP / 网络层面的失败归类为 `BackendError`
use crate::config::Config;
use crate::error::{AppError, AppResult, BackendError, ConfigError};
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 单次生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    /// 第几次尝试（从 0 开始）
    pub attempt: u32,
}

/// 文本生成后端
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// 发送一次生成请求，返回生成的文本
    ///
    /// 没有返回内容时返回空字符串，由调用方按"过短"处理
    async fn complete(&self, request: &ChatRequest) -> Result<String, BackendError>;
}

/// LLM 客户端
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    http_referer: String,
    app_title: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder().build().map_err(|e| {
            AppError::Config(ConfigError::HttpClient {
                message: e.to_string(),
            })
        })?;

        Ok(Self {
            http,
            api_key: config.llm_api_key.clone().unwrap_or_default(),
            api_base_url: config.llm_api_base_url.clone(),
            http_referer: config.http_referer.clone(),
            app_title: config.app_title.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let body = build_request_body(request)?;

        debug!("调用 LLM API，模型: {}", request.model);
        debug!("提示词长度: {} 字符", request.prompt.len());

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.http_referer)
            .header("X-Title", &self.app_title)
            .header(
                USER_AGENT,
                format!("PaperGenerator/1.0 (attempt-{})", request.attempt),
            )
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e, request.timeout))?;

        let status = response.status();
        info!("📡 Response: {}", status.as_u16());

        if status.is_success() {
            let completion: ChatCompletionBody = response.json().await.map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout {
                        after_secs: request.timeout.as_secs(),
                    }
                } else {
                    BackendError::Decode {
                        message: e.to_string(),
                    }
                }
            })?;

            return match completion.into_content() {
                Some(content) => Ok(content),
                None => {
                    warn!("❌ 响应中没有 choices: {}", request.model);
                    Ok(String::new())
                }
            };
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(BackendError::RateLimited {
                status: status.as_u16(),
                retry_after: parse_retry_after(response.headers()),
            });
        }

        if status.is_server_error() {
            return Err(BackendError::Server {
                status: status.as_u16(),
            });
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        Err(classify_api_error(status.as_u16(), message))
    }
}

/// 构建 chat completions 请求体
pub fn build_request_body(request: &ChatRequest) -> Result<CreateChatCompletionRequest, BackendError> {
    let invalid = |e: async_openai::error::OpenAIError| BackendError::InvalidRequest {
        message: e.to_string(),
    };

    let user_msg = ChatCompletionRequestUserMessageArgs::default()
        .content(request.prompt.as_str())
        .build()
        .map_err(invalid)?;

    #[allow(deprecated)]
    let body = CreateChatCompletionRequestArgs::default()
        .model(&request.model)
        .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
        .max_tokens(request.max_tokens)
        .temperature(request.temperature)
        .top_p(0.9)
        .frequency_penalty(0.1)
        .presence_penalty(0.1)
        .stream(false)
        .build()
        .map_err(invalid)?;

    Ok(body)
}

/// 读取 retry-after 头（秒）
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.ceil() as u64)
}

/// 网络层错误归类
fn classify_transport_error(err: &reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout {
            after_secs: timeout.as_secs(),
        }
    } else if err.is_connect() || err.is_request() {
        BackendError::Connection {
            message: err.to_string(),
        }
    } else {
        BackendError::Api {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            message: err.to_string(),
        }
    }
}

/// 非 2xx / 429 / 5xx 响应的归类
///
/// 部分服务商用 4xx + "rate limit" 消息表示限流
fn classify_api_error(status: u16, message: String) -> BackendError {
    if message.to_lowercase().contains("rate limit") {
        BackendError::RateLimited {
            status,
            retry_after: None,
        }
    } else {
        BackendError::Api { status, message }
    }
}

// ========== 响应结构 ==========

#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    #[serde(default)]
    choices: Vec<ChoiceBody>,
}

#[derive(Debug, Deserialize)]
struct ChoiceBody {
    message: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    content: Option<String>,
}

impl ChatCompletionBody {
    fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn sample_request() -> ChatRequest {
        ChatRequest {
            model: "google/gemma-2-9b-it:free".to_string(),
            prompt: "Write a paper".to_string(),
            max_tokens: 5500,
            temperature: 0.8,
            timeout: Duration::from_secs(150),
            attempt: 1,
        }
    }

    #[test]
    fn test_build_request_body() {
        let body = build_request_body(&sample_request()).unwrap();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "google/gemma-2-9b-it:free");
        assert_eq!(value["max_tokens"], 5500);
        assert_eq!(value["stream"], false);
        assert!((value["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
        assert!((value["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert!((value["frequency_penalty"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert!((value["presence_penalty"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Write a paper");
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("45"));
        assert_eq!(parse_retry_after(&headers), Some(45));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("2.5"));
        assert_eq!(parse_retry_after(&headers), Some(3));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_classify_api_error() {
        let err = classify_api_error(400, "Rate limit exceeded: free-models-per-day".into());
        assert!(matches!(err, BackendError::RateLimited { status: 400, retry_after: None }));

        let err = classify_api_error(404, "No endpoints found".into());
        assert!(matches!(err, BackendError::Api { status: 404, .. }));
    }

    #[test]
    fn test_completion_body_content() {
        let body: ChatCompletionBody = serde_json::from_str(
            r#"{"id":"gen-1","choices":[{"index":0,"message":{"role":"assistant","content":"hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_content().as_deref(), Some("hello"));

        let empty: ChatCompletionBody = serde_json::from_str(r#"{"id":"gen-2"}"#).unwrap();
        assert_eq!(empty.into_content(), None);
    }

    /// 测试 OpenRouter 连通性
    ///
    /// 运行方式：
    /// ```bash
    /// OPENROUTER_API_KEY=... cargo test test_live_completion -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_live_completion() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let client = LlmClient::new(&config).unwrap();
        let mut request = sample_request();
        request.prompt = "Reply with a single short sentence.".to_string();
        request.max_tokens = 64;

        match client.complete(&request).await {
            Ok(text) => println!("✅ LLM 响应: {}", text),
            Err(e) => panic!("LLM 调用失败: {} ({})", e, e.kind()),
        }
    }
}
