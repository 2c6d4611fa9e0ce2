/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，未设置时按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, model_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多模型论文生成模式");
    info!("🤖 可用模型数: {}", model_count);
    info!("📊 最大并发请求数: {}", config.max_concurrent_requests);
    info!("⏱️ 请求间隔: {}ms", config.global_request_delay_ms);
    info!("{}", "=".repeat(60));
}

/// 记录批量任务加载信息
pub fn log_jobs_loaded(total: usize) {
    info!("✓ 找到 {} 个待生成的论文", total);
    info!("💡 所有任务共享熔断状态与请求配额\n");
}

/// 打印最终统计信息
pub fn print_final_stats(success: usize, fallback: usize, failed: usize, output_dir: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, success + fallback + failed);
    info!("🆘 兜底文档: {}", fallback);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_dir);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
