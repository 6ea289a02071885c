use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use clap::{Parser, ValueEnum};

use crate::config::{Config, LLMProvider};
use crate::generator::blackboard::AnalysisMode;
use crate::generator::outlet::OutputFormat;
use crate::generator::workflow::AnalyzeOptions;

/// Competitor Intel - 多Agent竞品情报分析
#[derive(Parser, Debug)]
#[command(name = "competitor-intel")]
#[command(
    about = "Discover competitors, analyze the competitive landscape and generate strategic recommendations with LLM agents."
)]
#[command(version)]
pub struct Args {
    /// 业务描述或公司网址
    pub input: Option<String>,

    /// 将输入视为公司网址
    #[arg(long)]
    pub url: bool,

    /// 控制台输出格式
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// 将完整报告保存为JSON文件
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 只输出警告和错误日志
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 日志格式
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// LLM Provider (anthropic, openai)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 模型标识
    #[arg(long)]
    pub model: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Tavily API KEY
    #[arg(long)]
    pub search_api_key: Option<String>,

    /// 以REST服务方式运行
    #[arg(long)]
    pub serve: bool,

    /// REST服务监听地址
    #[arg(long, requires = "serve")]
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// 解析后的运行方式
#[derive(Debug)]
pub enum Launch {
    Analyze {
        config: Config,
        options: AnalyzeOptions,
    },
    Serve {
        config: Config,
    },
}

impl Args {
    /// 加载配置文件并应用命令行覆盖
    pub fn into_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(provider_str) = &self.llm_provider {
            config.llm.provider = provider_str
                .parse::<LLMProvider>()
                .map_err(|e| anyhow!(e))?;
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = Some(llm_api_base_url.clone());
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(search_api_key) = &self.search_api_key {
            config.search.api_key = search_api_key.clone();
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }

    /// 将CLI参数转换为运行方式
    pub fn into_launch(self) -> Result<Launch> {
        let config = self.into_config()?;

        if self.serve {
            return Ok(Launch::Serve { config });
        }

        let input = match self.input {
            Some(input) if !input.trim().is_empty() => input.trim().to_string(),
            _ => bail!("An input (business description or company URL) is required"),
        };
        let analysis_mode = if self.url {
            AnalysisMode::Url
        } else {
            AnalysisMode::Description
        };

        Ok(Launch::Analyze {
            config,
            options: AnalyzeOptions {
                input,
                analysis_mode,
                format: self.format,
                output_path: self.output,
            },
        })
    }
}

impl Launch {
    pub fn config(&self) -> &Config {
        match self {
            Launch::Analyze { config, .. } | Launch::Serve { config } => config,
        }
    }
}

/// 日志过滤级别，`quiet` 优先于 `verbose`
pub fn log_filter(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "competitor_intel=warn"
    } else if verbose {
        "competitor_intel=debug"
    } else {
        "competitor_intel=info"
    }
}

/// 初始化tracing，日志写到stderr，stdout只留给报告
///
/// `verbose` 为命令行与配置文件合并后的值。
pub fn init_tracing(verbose: bool, quiet: bool, log_format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(verbose, quiet)));

    match log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
