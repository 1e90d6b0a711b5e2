use bigmac_engine::app::report::{render, CountryList, Report};
use bigmac_engine::config::Command;
use bigmac_engine::core::Analytics;
use bigmac_engine::domain::model::CountryLabel;
use bigmac_engine::utils::error::{ErrorSeverity, EstimatorError, Result};
use bigmac_engine::utils::{logger, validation::Validate};
use bigmac_engine::{CliConfig, EstimatorEngine};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;

const DEFAULT_COUNTRY: &str = "Brazil";

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(config.verbose, config.json_logs);
    tracing::debug!("Resolved config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let engine = EstimatorEngine::from_config(&config);

    if let Err(e) = run(&engine, &cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 依錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run<L>(engine: &EstimatorEngine<L>, cli: &CliConfig) -> Result<()>
where
    L: bigmac_engine::core::ArtifactLoader,
{
    // 模型載入失敗時直接中止，不執行任何分析
    let analytics = engine.analytics().await?;
    let today = Local::now().date_naive();

    let report = match &cli.command {
        Command::Countries => Report::Countries(CountryList {
            source: analytics.vocabulary_source(),
            countries: analytics.valid_countries().to_vec(),
        }),
        Command::Point { country, date } => {
            let country = select_country(&analytics, country.as_deref())?;
            let date = match date {
                Some(raw) => parse_date(raw)?,
                None => today,
            };
            Report::Point(analytics.point_estimate(country.as_str(), date)?)
        }
        Command::Ranking { year, month, top_n } => Report::Ranking(analytics.global_ranking(
            year.unwrap_or(today.year()),
            month.unwrap_or(today.month()),
            *top_n,
        )?),
        Command::Trend { country, year } => {
            let country = select_country(&analytics, country.as_deref())?;
            Report::Trend(analytics.trend_series(
                country.as_str(),
                year.unwrap_or(today.year()),
                None,
            )?)
        }
    };

    render(std::io::stdout().lock(), cli.format, &report)
}

/// 預設選擇 Brazil，不存在時使用清單第一個國家
fn select_country(analytics: &Analytics, requested: Option<&str>) -> Result<CountryLabel> {
    if let Some(country) = requested {
        return Ok(CountryLabel::from(country));
    }
    let countries = analytics.valid_countries();
    countries
        .iter()
        .find(|c| c.as_str() == DEFAULT_COUNTRY)
        .or_else(|| countries.first())
        .cloned()
        .ok_or_else(|| EstimatorError::MissingConfigError {
            field: "country".to_string(),
        })
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%d/%m/%Y").map_err(|e| {
        EstimatorError::InvalidConfigValueError {
            field: "date".to_string(),
            value: raw.to_string(),
            reason: format!("expected DD/MM/YYYY: {}", e),
        }
    })
}
