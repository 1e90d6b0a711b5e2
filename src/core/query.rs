use crate::domain::model::{CountryLabel, EngineSettings, QueryRow};
use crate::utils::error::QueryError;

impl QueryRow {
    pub fn new(country: impl Into<CountryLabel>, year: i32, month: u32) -> Result<Self, QueryError> {
        if !(1..=12).contains(&month) {
            return Err(QueryError::InvalidMonth { month });
        }
        Ok(Self {
            country: country.into(),
            year,
            month,
        })
    }
}

/// Builds raw query rows from caller intent. Pure: no inference, no side effects.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    benchmark: CountryLabel,
    history_floor: i32,
    lookahead_years: i32,
    max_target_year: i32,
}

impl QueryBuilder {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            benchmark: CountryLabel::new(settings.benchmark_country.as_str()),
            history_floor: settings.history_floor,
            lookahead_years: settings.trend_lookahead_years,
            max_target_year: settings.max_target_year,
        }
    }

    pub fn benchmark(&self) -> &CountryLabel {
        &self.benchmark
    }

    pub fn single_point(
        &self,
        country: &CountryLabel,
        year: i32,
        month: u32,
    ) -> Result<QueryRow, QueryError> {
        QueryRow::new(country.clone(), year, month)
    }

    pub fn benchmark_point(&self, year: i32, month: u32) -> Result<QueryRow, QueryError> {
        QueryRow::new(self.benchmark.clone(), year, month)
    }

    pub fn cross_section(
        &self,
        countries: &[CountryLabel],
        year: i32,
        month: u32,
    ) -> Result<Vec<QueryRow>, QueryError> {
        countries
            .iter()
            .map(|country| QueryRow::new(country.clone(), year, month))
            .collect()
    }

    pub fn year_series(
        &self,
        country: &CountryLabel,
        years: &[i32],
        month: u32,
    ) -> Result<Vec<QueryRow>, QueryError> {
        years
            .iter()
            .map(|year| QueryRow::new(country.clone(), *year, month))
            .collect()
    }

    /// Historical floor through `target_year + lookahead`, inclusive.
    pub fn year_range(&self, target_year: i32) -> Result<Vec<i32>, QueryError> {
        // 先檢查上限，避免建立過大的年份序列
        if target_year > self.max_target_year {
            return Err(QueryError::TargetYearTooLate {
                year: target_year,
                max: self.max_target_year,
            });
        }
        let end = target_year.saturating_add(self.lookahead_years);
        if end < self.history_floor {
            return Err(QueryError::EmptyYearRange {
                floor: self.history_floor,
                end,
            });
        }
        Ok((self.history_floor..=end).collect())
    }
}
