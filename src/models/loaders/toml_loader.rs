use crate::error::{AppError, AppResult, FileError};
use crate::models::model_descriptor::{sort_by_priority, ModelDescriptor};
use crate::models::paper::PaperRequest;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// 模型列表文件结构
#[derive(Debug, Deserialize)]
struct ModelCatalogFile {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

/// 批量任务文件结构
#[derive(Debug, Deserialize)]
struct PaperJobsFile {
    #[serde(default)]
    papers: Vec<PaperRequest>,
}

async fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(&display, e))?;

    toml::from_str(&content).map_err(|source| {
        AppError::File(FileError::TomlParseFailed {
            path: display,
            source,
        })
    })
}

/// 从 TOML 文件加载模型列表，并按优先级排序
///
/// 文件格式：
/// ```toml
/// [[models]]
/// name = "google/gemma-2-9b-it:free"
/// max_tokens = 6000
/// description = "Google Gemma 2 9B"
/// priority = 2
/// ```
pub async fn load_model_catalog(path: &Path) -> AppResult<Vec<ModelDescriptor>> {
    let file: ModelCatalogFile = read_toml(path).await?;
    let models = validate_catalog(file.models)?;

    tracing::info!(
        "成功加载 {} 个模型: {}",
        models.len(),
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(models)
}

/// 校验模型列表：非空且名称唯一
pub fn validate_catalog(models: Vec<ModelDescriptor>) -> AppResult<Vec<ModelDescriptor>> {
    if models.is_empty() {
        return Err(AppError::invalid_catalog("至少需要配置一个模型"));
    }

    let mut seen = HashSet::new();
    for model in &models {
        if !seen.insert(model.name.as_str()) {
            return Err(AppError::invalid_catalog(format!("模型名称重复: {}", model.name)));
        }
    }

    Ok(sort_by_priority(models))
}

/// 从 TOML 文件加载批量生成任务
///
/// 文件格式：
/// ```toml
/// [[papers]]
/// topic = "Machine Learning in Climate Change Prediction"
/// paper_type = "research"
/// paper_format = "ieee"
/// ```
pub async fn load_paper_requests(path: &Path) -> AppResult<Vec<PaperRequest>> {
    let file: PaperJobsFile = read_toml(path).await?;

    for request in &file.papers {
        tracing::info!("正在加载: {}", request.topic);
    }

    Ok(file.papers)
}
