use crate::domain::model::{CountryLabel, EngineSettings, VocabularyPolicy};
use crate::utils::error::{EstimatorError, Result};
use crate::utils::validation::{
    validate_location, validate_non_empty_list, validate_non_empty_string, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub artifact: ArtifactConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub location: Option<String>,
    pub vocabulary_transformer: Option<String>,
    pub strict_vocabulary: Option<bool>,
    pub fallback_countries: Option<Vec<String>>,
    pub timeout_seconds: Option<u64>,
}

/// 所有欄位皆可省略，省略時使用內建預設值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub benchmark_country: Option<String>,
    pub exchange_rate: Option<f64>,
    pub trend_lookahead_years: Option<i32>,
    pub trend_month: Option<u32>,
    pub ranking_top_n: Option<usize>,
    pub history_floor: Option<i32>,
    pub max_target_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EstimatorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EstimatorError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MODEL_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EstimatorError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// File values layered over the built-in defaults.
    pub fn settings(&self) -> EngineSettings {
        let defaults = EngineSettings::default();
        let engine = &self.engine;
        EngineSettings {
            benchmark_country: engine
                .benchmark_country
                .clone()
                .unwrap_or(defaults.benchmark_country),
            exchange_rate: engine.exchange_rate.unwrap_or(defaults.exchange_rate),
            trend_lookahead_years: engine
                .trend_lookahead_years
                .unwrap_or(defaults.trend_lookahead_years),
            trend_month: engine.trend_month.unwrap_or(defaults.trend_month),
            ranking_top_n: engine.ranking_top_n.unwrap_or(defaults.ranking_top_n),
            history_floor: engine.history_floor.unwrap_or(defaults.history_floor),
            max_target_year: engine.max_target_year.unwrap_or(defaults.max_target_year),
        }
    }

    pub fn vocabulary_policy(&self) -> VocabularyPolicy {
        if self.artifact.strict_vocabulary.unwrap_or(false) {
            return VocabularyPolicy::Strict;
        }
        match &self.artifact.fallback_countries {
            Some(list) => VocabularyPolicy::Fallback(
                list.iter().map(|c| CountryLabel::new(c.as_str())).collect(),
            ),
            None => VocabularyPolicy::default(),
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(location) = &self.artifact.location {
            validate_location("artifact.location", location)?;
        }
        if let Some(name) = &self.artifact.vocabulary_transformer {
            validate_non_empty_string("artifact.vocabulary_transformer", name)?;
        }
        if let Some(list) = &self.artifact.fallback_countries {
            validate_non_empty_list("artifact.fallback_countries", list)?;
        }
        self.settings().validate()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
