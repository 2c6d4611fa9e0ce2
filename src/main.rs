use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use paper_generator::models::{load_paper_requests, PaperRequest};
use paper_generator::orchestrator::batch_processor::write_document;
use paper_generator::services::render_document;
use paper_generator::utils::logging;
use paper_generator::{BatchProcessor, Config, PaperGenerator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Paper Generator - 多模型学术论文草稿生成器
#[derive(Parser, Debug)]
#[command(name = "paper-generator")]
#[command(version)]
struct Cli {
    /// 是否启用详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 模型列表 TOML 文件（覆盖 MODELS_FILE）
    #[arg(long, global = true)]
    models: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 生成一篇论文
    Generate {
        /// 论文主题（至少 10 个字符）
        #[arg(short, long)]
        topic: String,

        /// 论文类型
        #[arg(long, default_value = "research")]
        paper_type: String,

        /// 论文格式 (ieee, springer, elsevier, ...)
        #[arg(long, default_value = "ieee")]
        paper_format: String,

        /// 输出 JSON 文件，不指定时打印排版后的文本
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 按 TOML 任务文件批量生成
    Batch {
        /// 任务文件（[[papers]] 列表）
        #[arg(short, long)]
        jobs: PathBuf,

        /// 输出目录
        #[arg(short, long, default_value = "./papers")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::from_env();
    if cli.verbose {
        config.verbose_logging = true;
    }
    if let Some(models) = &cli.models {
        config.models_file = Some(models.display().to_string());
    }

    // 初始化日志
    logging::init(config.verbose_logging);

    let generator = Arc::new(PaperGenerator::from_config(config.clone()).await?);
    logging::log_startup(&config, generator.models().len());

    match cli.command {
        Command::Generate {
            topic,
            paper_type,
            paper_format,
            output,
        } => {
            let request = PaperRequest::new(topic, paper_type, paper_format);
            let doc = generator.generate(&request).await?;

            info!(
                "✅ 使用模型: {} (字数: {})",
                doc.metadata.model_used, doc.metadata.word_count
            );

            match output {
                Some(path) => {
                    write_document(&path, &doc).await?;
                    info!("结果已保存至: {}", path.display());
                }
                None => println!("{}", render_document(&doc)),
            }
        }
        Command::Batch { jobs, output_dir } => {
            let requests = load_paper_requests(&jobs)
                .await
                .with_context(|| format!("无法加载任务文件: {}", jobs.display()))?;
            logging::log_jobs_loaded(requests.len());

            let processor = BatchProcessor::new(generator, output_dir);
            let (stats, _) = processor.run(requests).await?;

            logging::print_final_stats(
                stats.success,
                stats.fallback,
                stats.failed,
                &processor.output_dir().display().to_string(),
            );
        }
    }

    Ok(())
}
