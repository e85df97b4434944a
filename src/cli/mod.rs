use crate::config::{Config, LLMProvider};
use crate::generator::workflow::ResearchRequest;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Deep Research - 由Rust与AI驱动的多阶段调研引擎
#[derive(Parser, Debug)]
#[command(name = "deep-research")]
#[command(
    about = "Multi-stage AI research pipeline: assesses the query, asks clarifying questions when needed, plans and runs searches concurrently, then writes a markdown report."
)]
#[command(version)]
pub struct Args {
    /// 调研问题
    pub query: String,

    /// 期望的检索次数（1-5，无法解析时使用3）
    #[arg(short = 'n', long)]
    pub searches: Option<String>,

    /// 报告输出路径
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 跳过澄清问题
    #[arg(long)]
    pub skip_clarification: bool,

    /// 输出带标记的原始事件行
    #[arg(long)]
    pub raw_events: bool,

    /// 不保存报告文件
    #[arg(long)]
    pub no_save: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// trace链接模板，`{trace_id}`会被替换
    #[arg(long)]
    pub trace_url_template: Option<String>,

    /// 高能效模型，用于常规推理任务
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于长上下文任务，以及作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 检索阶段的最大并发数
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// LLM Provider (openai, moonshot, deepseek, mistral, openrouter, anthropic, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,
}

impl Args {
    /// 构建本次调研请求
    pub fn request(&self) -> ResearchRequest {
        ResearchRequest {
            query: self.query.clone(),
            searches: self.searches.clone(),
            skip_clarification: self.skip_clarification,
            raw_events: self.raw_events,
        }
    }

    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.llm.max_parallels = max_parallels;
        }

        // 调研配置
        if let Some(template) = self.trace_url_template {
            config.research.trace_url_template = Some(template);
        }
        if self.no_save {
            config.research.save_report = false;
        }

        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}
