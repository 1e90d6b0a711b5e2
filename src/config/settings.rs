use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_finite, validate_positive_number, validate_range,
    Validate,
};

pub use crate::domain::model::{
    EngineSettings, DEFAULT_BENCHMARK_COUNTRY, DEFAULT_EXCHANGE_RATE, DEFAULT_HISTORY_FLOOR,
    DEFAULT_MAX_TARGET_YEAR, DEFAULT_RANKING_TOP_N, DEFAULT_TREND_LOOKAHEAD_YEARS,
    DEFAULT_TREND_MONTH,
};

impl Validate for EngineSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("engine.benchmark_country", &self.benchmark_country)?;
        validate_positive_finite("engine.exchange_rate", self.exchange_rate)?;
        validate_range("engine.trend_lookahead_years", self.trend_lookahead_years, 0, 100)?;
        validate_range("engine.trend_month", self.trend_month, 1, 12)?;
        validate_positive_number("engine.ranking_top_n", self.ranking_top_n, 1)?;
        validate_range("engine.history_floor", self.history_floor, 1900, 2200)?;
        validate_range(
            "engine.max_target_year",
            self.max_target_year,
            self.history_floor,
            DEFAULT_MAX_TARGET_YEAR,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dashboard() {
        let settings = EngineSettings::default();
        assert_eq!(settings.benchmark_country, "United States");
        assert_eq!(settings.exchange_rate, 5.00);
        assert_eq!(settings.trend_lookahead_years, 6);
        assert_eq!(settings.trend_month, 7);
        assert_eq!(settings.ranking_top_n, 10);
        assert_eq!(settings.history_floor, 2000);
        assert_eq!(settings.max_target_year, 2200);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut settings = EngineSettings::default();
        settings.trend_month = 13;
        assert!(settings.validate().is_err());

        let mut settings = EngineSettings::default();
        settings.exchange_rate = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = EngineSettings::default();
        settings.ranking_top_n = 0;
        assert!(settings.validate().is_err());

        let mut settings = EngineSettings::default();
        settings.benchmark_country = "  ".to_string();
        assert!(settings.validate().is_err());

        let mut settings = EngineSettings::default();
        settings.max_target_year = 1999;
        assert!(settings.validate().is_err());
    }
}
