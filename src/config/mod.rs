pub mod cli;
pub mod http;
pub mod settings;
pub mod toml_config;

use crate::config::toml_config::TomlConfig;
use crate::core::encoder::DEFAULT_VOCABULARY_TRANSFORMER;
use crate::domain::model::{EngineSettings, VocabularyPolicy};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_location, validate_non_empty_list, validate_non_empty_string, Validate,
};
use clap::{Parser, Subcommand, ValueEnum};

pub const DEFAULT_ARTIFACT_LOCATION: &str = "bigmac_model.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Text,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "bigmac")]
#[command(about = "Big Mac price estimates, rankings and trends from a fitted model")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Artifact path or http(s) URL")]
    pub artifact: Option<String>,

    #[arg(short, long, global = true, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, global = true, help = "Benchmark country")]
    pub benchmark: Option<String>,

    #[arg(long, global = true, help = "Static USD exchange rate for the converted price")]
    pub exchange_rate: Option<f64>,

    #[arg(long, global = true)]
    pub lookahead_years: Option<i32>,

    #[arg(long, global = true)]
    pub trend_month: Option<u32>,

    #[arg(long, global = true)]
    pub history_floor: Option<i32>,

    #[arg(long, global = true, help = "Fail instead of using the fallback country list")]
    pub strict_vocabulary: bool,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// List the countries the model knows
    Countries,
    /// Price for one country and date against the benchmark
    Point {
        #[arg(long)]
        country: Option<String>,
        /// Date as DD/MM/YYYY (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Most expensive and cheapest countries for one month
    Ranking {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Yearly series for one country next to the benchmark
    Trend {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        year: Option<i32>,
    },
}

impl CliConfig {
    /// 讀取 --config 指定的檔案並與命令列參數合併
    pub fn load(&self) -> Result<ResolvedConfig> {
        let file = match &self.config {
            Some(path) => Some(TomlConfig::from_file(path)?),
            None => None,
        };
        Ok(ResolvedConfig::resolve(self, file.as_ref()))
    }
}

/// Final configuration. Precedence: CLI flag, then TOML file, then built-in default.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub artifact_location: String,
    pub vocabulary_transformer: String,
    pub vocabulary_policy: VocabularyPolicy,
    pub settings: EngineSettings,
    pub fetch_timeout_seconds: Option<u64>,
    pub verbose: bool,
    pub json_logs: bool,
}

impl ResolvedConfig {
    pub fn resolve(cli: &CliConfig, file: Option<&TomlConfig>) -> Self {
        let file = file.cloned().unwrap_or_default();

        let mut settings = file.settings();
        if let Some(benchmark) = &cli.benchmark {
            settings.benchmark_country = benchmark.clone();
        }
        if let Some(rate) = cli.exchange_rate {
            settings.exchange_rate = rate;
        }
        if let Some(years) = cli.lookahead_years {
            settings.trend_lookahead_years = years;
        }
        if let Some(month) = cli.trend_month {
            settings.trend_month = month;
        }
        if let Some(floor) = cli.history_floor {
            settings.history_floor = floor;
        }

        let vocabulary_policy = if cli.strict_vocabulary {
            VocabularyPolicy::Strict
        } else {
            file.vocabulary_policy()
        };

        Self {
            artifact_location: cli
                .artifact
                .clone()
                .or_else(|| file.artifact.location.clone())
                .unwrap_or_else(|| DEFAULT_ARTIFACT_LOCATION.to_string()),
            vocabulary_transformer: file
                .artifact
                .vocabulary_transformer
                .clone()
                .unwrap_or_else(|| DEFAULT_VOCABULARY_TRANSFORMER.to_string()),
            vocabulary_policy,
            settings,
            fetch_timeout_seconds: file.artifact.timeout_seconds,
            verbose: cli.verbose || file.logging.verbose.unwrap_or(false),
            json_logs: cli.json_logs || file.logging.json.unwrap_or(false),
        }
    }
}

impl ConfigProvider for ResolvedConfig {
    fn artifact_location(&self) -> &str {
        &self.artifact_location
    }

    fn vocabulary_transformer(&self) -> &str {
        &self.vocabulary_transformer
    }

    fn vocabulary_policy(&self) -> VocabularyPolicy {
        self.vocabulary_policy.clone()
    }

    fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn fetch_timeout_seconds(&self) -> Option<u64> {
        self.fetch_timeout_seconds
    }
}

impl Validate for ResolvedConfig {
    fn validate(&self) -> Result<()> {
        validate_location("artifact.location", &self.artifact_location)?;
        validate_non_empty_string("artifact.vocabulary_transformer", &self.vocabulary_transformer)?;
        if let VocabularyPolicy::Fallback(list) = &self.vocabulary_policy {
            validate_non_empty_list("artifact.fallback_countries", list)?;
        }
        self.settings.validate()
    }
}
