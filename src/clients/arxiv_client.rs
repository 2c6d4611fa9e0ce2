/// arXiv API 客户端
///
/// 封装 arXiv Atom 检索接口的调用与解析
use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::LiteratureEntry;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::debug;

/// 文献检索源
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// 执行一次检索
    ///
    /// `query` 为带字段前缀的检索式，例如 `all:graph neural networks`
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<LiteratureEntry>>;
}

/// arXiv 客户端
#[derive(Clone)]
pub struct ArxivClient {
    http: reqwest::Client,
    base: String,
}

impl ArxivClient {
    /// 创建新的 arXiv 客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent("PaperGenerator/1.0 (arxiv)")
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| {
                AppError::Config(ConfigError::HttpClient {
                    message: e.to_string(),
                })
            })?;

        Ok(Self {
            http,
            base: config.arxiv_api_url.clone(),
        })
    }
}

#[async_trait]
impl LiteratureSource for ArxivClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<LiteratureEntry>> {
        debug!("arXiv 检索: {}", query);

        let resp = self
            .http
            .get(&self.base)
            .query(&[("search_query", query)])
            .query(&[("start", 0usize), ("max_results", max_results)])
            .query(&[("sortBy", "submittedDate"), ("sortOrder", "descending")])
            .header(ACCEPT, "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("arXiv API error: HTTP {}", status));
        }

        let text = resp.text().await?;
        parse_atom_feed(&text)
    }
}

/// 解析 Atom feed 中的 entry
pub fn parse_atom_feed(xml: &str) -> Result<Vec<LiteratureEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut out = Vec::new();

    let mut in_entry = false;
    let mut current = LiteratureEntry::default();
    let mut text_target: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(e.name().as_ref());
                match name.as_slice() {
                    b"entry" => {
                        in_entry = true;
                        current = LiteratureEntry::default();
                        text_target = None;
                    }
                    b"title" if in_entry => text_target = Some("title"),
                    b"summary" if in_entry => text_target = Some("summary"),
                    b"published" if in_entry => text_target = Some("published"),
                    _ => text_target = None,
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(tag) = text_target.take() {
                    let txt = t.unescape().unwrap_or_default().to_string();
                    match tag {
                        "title" => current.title = txt,
                        "summary" => current.summary = txt,
                        "published" => current.published = Some(txt),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.name().as_ref());
                if name.as_slice() == b"entry" && in_entry {
                    in_entry = false;
                    out.push(std::mem::take(&mut current));
                }
                text_target = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("XML parse error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// 去掉命名空间前缀
fn local_name(raw: &[u8]) -> Vec<u8> {
    match raw.iter().position(|b| *b == b':') {
        Some(ix) => raw[ix + 1..].to_vec(),
        None => raw.to_vec(),
    }
}
