use crate::domain::ports::{FeatureEncoder, Regressor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 國家標籤，必須屬於編碼器擬合時的詞彙表
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryLabel(String);

impl CountryLabel {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for CountryLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CountryLabel {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One raw query row, encoded as `(name, year, month)` at training time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRow {
    pub country: CountryLabel,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub query: QueryRow,
    /// Estimated price in USD.
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEstimate {
    pub country: CountryLabel,
    pub benchmark_country: CountryLabel,
    pub year: i32,
    pub month: u32,
    pub country_price: f64,
    pub benchmark_price: f64,
    pub relative_delta_percent: f64,
    pub exchange_rate: f64,
    pub converted_price: f64,
}

/// Two read-only projections of the same cross-section, sorted by price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalRanking {
    pub year: i32,
    pub month: u32,
    pub most_expensive: Vec<PredictionResult>,
    pub cheapest: Vec<PredictionResult>,
}

/// Selected country and benchmark over the same year axis and month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub country: CountryLabel,
    pub benchmark_country: CountryLabel,
    pub month: u32,
    pub marker_year: i32,
    pub years: Vec<i32>,
    pub country_series: Vec<PredictionResult>,
    pub benchmark_series: Vec<PredictionResult>,
}

/// 詞彙表來源：從編碼器讀取，或使用內建的備用清單
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularySource {
    Introspected,
    Fallback,
}

/// Immutable `(model, feature encoder)` pair, shared read-only by every query.
#[derive(Clone)]
pub struct ModelArtifact {
    model: Arc<dyn Regressor>,
    encoder: Arc<dyn FeatureEncoder>,
}

impl ModelArtifact {
    pub fn new(model: impl Regressor + 'static, encoder: impl FeatureEncoder + 'static) -> Self {
        Self {
            model: Arc::new(model),
            encoder: Arc::new(encoder),
        }
    }

    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    pub fn encoder(&self) -> &dyn FeatureEncoder {
        self.encoder.as_ref()
    }

    pub fn valid_countries(&self) -> &[CountryLabel] {
        self.encoder.valid_countries()
    }
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("model", &self.model.describe())
            .field("n_features", &self.model.n_features())
            .field("countries", &self.encoder.valid_countries().len())
            .field("vocabulary", &self.encoder.vocabulary_source())
            .finish()
    }
}

/// Snapshot used when the fitted vocabulary cannot be read from the artifact.
pub const DEFAULT_FALLBACK_COUNTRIES: [&str; 10] = [
    "Argentina",
    "Australia",
    "Brazil",
    "Britain",
    "Canada",
    "China",
    "Euro area",
    "Japan",
    "Switzerland",
    "United States",
];

#[derive(Debug, Clone, PartialEq)]
pub enum VocabularyPolicy {
    /// Log a warning and use this list.
    Fallback(Vec<CountryLabel>),
    /// Refuse to load the artifact.
    Strict,
}

impl Default for VocabularyPolicy {
    fn default() -> Self {
        VocabularyPolicy::Fallback(
            DEFAULT_FALLBACK_COUNTRIES
                .iter()
                .map(|c| CountryLabel::from(*c))
                .collect(),
        )
    }
}

pub const DEFAULT_BENCHMARK_COUNTRY: &str = "United States";
pub const DEFAULT_EXCHANGE_RATE: f64 = 5.00;
pub const DEFAULT_TREND_LOOKAHEAD_YEARS: i32 = 6;
pub const DEFAULT_TREND_MONTH: u32 = 7;
pub const DEFAULT_RANKING_TOP_N: usize = 10;
/// 訓練資料的最早年份
pub const DEFAULT_HISTORY_FLOOR: i32 = 2000;
/// 趨勢圖可接受的最晚目標年份
pub const DEFAULT_MAX_TARGET_YEAR: i32 = 2200;

/// Overridable defaults consumed by the query builder and analytics views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub benchmark_country: String,
    /// Static USD multiplier for the converted price. No live FX lookup.
    pub exchange_rate: f64,
    pub trend_lookahead_years: i32,
    pub trend_month: u32,
    pub ranking_top_n: usize,
    pub history_floor: i32,
    /// Trend target years above this are rejected before any rows are built.
    pub max_target_year: i32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            benchmark_country: DEFAULT_BENCHMARK_COUNTRY.to_string(),
            exchange_rate: DEFAULT_EXCHANGE_RATE,
            trend_lookahead_years: DEFAULT_TREND_LOOKAHEAD_YEARS,
            trend_month: DEFAULT_TREND_MONTH,
            ranking_top_n: DEFAULT_RANKING_TOP_N,
            history_floor: DEFAULT_HISTORY_FLOOR,
            max_target_year: DEFAULT_MAX_TARGET_YEAR,
        }
    }
}
