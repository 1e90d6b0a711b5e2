use crate::core::inference::InferenceEngine;
use crate::core::query::QueryBuilder;
use crate::domain::model::{
    CountryLabel, EngineSettings, GlobalRanking, ModelArtifact, PointEstimate, PredictionResult,
    TrendSeries, VocabularySource,
};
use crate::utils::error::AnalyticsError;
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

/// Stateless analytics views over one loaded artifact.
///
/// Every view builds its query rows, runs batched inference and returns plain
/// data. Recoverable failures are logged here and returned as [`AnalyticsError`].
#[derive(Debug, Clone)]
pub struct Analytics {
    artifact: Arc<ModelArtifact>,
    settings: EngineSettings,
    queries: QueryBuilder,
}

impl Analytics {
    pub fn new(artifact: Arc<ModelArtifact>, settings: EngineSettings) -> Self {
        let queries = QueryBuilder::new(&settings);
        Self {
            artifact,
            settings,
            queries,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn valid_countries(&self) -> &[CountryLabel] {
        self.artifact.valid_countries()
    }

    pub fn vocabulary_source(&self) -> VocabularySource {
        self.artifact.encoder().vocabulary_source()
    }

    fn engine(&self) -> InferenceEngine<'_> {
        InferenceEngine::new(&self.artifact)
    }

    pub fn point_estimate(
        &self,
        country: &str,
        date: NaiveDate,
    ) -> Result<PointEstimate, AnalyticsError> {
        observe("point_estimate", self.compute_point_estimate(country, date))
    }

    /// `top_n` defaults to the configured ranking size.
    pub fn global_ranking(
        &self,
        year: i32,
        month: u32,
        top_n: Option<usize>,
    ) -> Result<GlobalRanking, AnalyticsError> {
        let top_n = top_n.unwrap_or(self.settings.ranking_top_n);
        observe("global_ranking", self.compute_global_ranking(year, month, top_n))
    }

    /// `benchmark` defaults to the configured benchmark country.
    pub fn trend_series(
        &self,
        country: &str,
        target_year: i32,
        benchmark: Option<&str>,
    ) -> Result<TrendSeries, AnalyticsError> {
        observe(
            "trend_series",
            self.compute_trend_series(country, target_year, benchmark),
        )
    }

    fn compute_point_estimate(
        &self,
        country: &str,
        date: NaiveDate,
    ) -> Result<PointEstimate, AnalyticsError> {
        let (year, month) = (date.year(), date.month());
        let country = CountryLabel::from(country);

        // 選定國家與基準國家同一批推論
        let rows = vec![
            self.queries.single_point(&country, year, month)?,
            self.queries.benchmark_point(year, month)?,
        ];
        let prices = self.engine().predict(&rows)?;
        let (country_price, benchmark_price) = (prices[0], prices[1]);

        if benchmark_price == 0.0 || !benchmark_price.is_finite() {
            return Err(AnalyticsError::DegenerateResult {
                reason: format!(
                    "benchmark price for {} is {}",
                    self.queries.benchmark(),
                    benchmark_price
                ),
            });
        }
        if !country_price.is_finite() {
            return Err(AnalyticsError::DegenerateResult {
                reason: format!("price for {} is {}", country, country_price),
            });
        }

        Ok(PointEstimate {
            country,
            benchmark_country: self.queries.benchmark().clone(),
            year,
            month,
            country_price,
            benchmark_price,
            relative_delta_percent: (country_price / benchmark_price - 1.0) * 100.0,
            exchange_rate: self.settings.exchange_rate,
            converted_price: country_price * self.settings.exchange_rate,
        })
    }

    fn compute_global_ranking(
        &self,
        year: i32,
        month: u32,
        top_n: usize,
    ) -> Result<GlobalRanking, AnalyticsError> {
        let rows = self
            .queries
            .cross_section(self.valid_countries(), year, month)?;
        let results = self.engine().predict_results(rows)?;
        ensure_finite(&results)?;

        // 穩定排序：同價時保留字母順序
        let mut most_expensive = results.clone();
        most_expensive.sort_by(|a, b| b.price.total_cmp(&a.price));
        most_expensive.truncate(top_n);

        let mut cheapest = results;
        cheapest.sort_by(|a, b| a.price.total_cmp(&b.price));
        cheapest.truncate(top_n);

        Ok(GlobalRanking {
            year,
            month,
            most_expensive,
            cheapest,
        })
    }

    fn compute_trend_series(
        &self,
        country: &str,
        target_year: i32,
        benchmark: Option<&str>,
    ) -> Result<TrendSeries, AnalyticsError> {
        let country = CountryLabel::from(country);
        let benchmark = benchmark
            .map(CountryLabel::from)
            .unwrap_or_else(|| self.queries.benchmark().clone());
        let month = self.settings.trend_month;
        let years = self.queries.year_range(target_year)?;

        let country_series = self.series(&country, &years, month)?;
        let benchmark_series = self.series(&benchmark, &years, month)?;

        Ok(TrendSeries {
            country,
            benchmark_country: benchmark,
            month,
            marker_year: target_year,
            years,
            country_series,
            benchmark_series,
        })
    }

    fn series(
        &self,
        country: &CountryLabel,
        years: &[i32],
        month: u32,
    ) -> Result<Vec<PredictionResult>, AnalyticsError> {
        let rows = self.queries.year_series(country, years, month)?;
        let results = self.engine().predict_results(rows)?;
        ensure_finite(&results)?;
        Ok(results)
    }
}

fn ensure_finite(results: &[PredictionResult]) -> Result<(), AnalyticsError> {
    match results.iter().find(|r| !r.price.is_finite()) {
        Some(bad) => Err(AnalyticsError::DegenerateResult {
            reason: format!(
                "price for {} in {} is {}",
                bad.query.country, bad.query.year, bad.price
            ),
        }),
        None => Ok(()),
    }
}

fn observe<T>(view: &'static str, result: Result<T, AnalyticsError>) -> Result<T, AnalyticsError> {
    if let Err(err) = &result {
        tracing::warn!("⚠️ {} unavailable: {}", view, err);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::test_support::artifact;
    use crate::utils::error::QueryError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const COUNTRIES: [&str; 5] = ["Brazil", "Japan", "Norway", "Switzerland", "United States"];

    fn analytics(prices: Vec<f64>) -> (Analytics, Arc<AtomicUsize>) {
        let (artifact, calls) = artifact(&COUNTRIES, prices, 0.1);
        (
            Analytics::new(Arc::new(artifact), EngineSettings::default()),
            calls,
        )
    }

    fn date(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 15).unwrap()
    }

    #[test]
    fn test_point_estimate_uses_one_batch() {
        let (analytics, calls) = analytics(vec![4.0, 3.0, 6.0, 7.0, 5.0]);

        let estimate = analytics.point_estimate("Brazil", date(2000, 6)).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(estimate.country_price, 4.0);
        assert_eq!(estimate.benchmark_price, 5.0);
        assert_eq!(estimate.benchmark_country.as_str(), "United States");
        assert!((estimate.relative_delta_percent - (-20.0)).abs() < 1e-9);
        assert!((estimate.converted_price - 20.0).abs() < 1e-9);
        assert_eq!(estimate.exchange_rate, 5.0);
    }

    #[test]
    fn test_point_estimate_zero_benchmark_is_degenerate() {
        let (analytics, _) = analytics(vec![4.0, 3.0, 6.0, 7.0, 0.0]);
        let err = analytics.point_estimate("Brazil", date(2000, 1)).unwrap_err();
        assert!(matches!(err, AnalyticsError::DegenerateResult { .. }));
    }

    #[test]
    fn test_point_estimate_unknown_country() {
        let (analytics, _) = analytics(vec![4.0, 3.0, 6.0, 7.0, 5.0]);
        let err = analytics.point_estimate("Atlantis", date(2024, 6)).unwrap_err();
        assert!(err.is_unknown_country());
    }

    #[test]
    fn test_ranking_sorted_and_truncated() {
        let (analytics, calls) = analytics(vec![4.0, 3.0, 6.0, 7.0, 5.0]);

        let ranking = analytics.global_ranking(2024, 6, Some(3)).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let expensive: Vec<&str> = ranking
            .most_expensive
            .iter()
            .map(|r| r.query.country.as_str())
            .collect();
        let cheapest: Vec<&str> = ranking
            .cheapest
            .iter()
            .map(|r| r.query.country.as_str())
            .collect();
        assert_eq!(expensive, vec!["Switzerland", "Norway", "United States"]);
        assert_eq!(cheapest, vec!["Japan", "Brazil", "United States"]);
    }

    #[test]
    fn test_ranking_ties_keep_lexicographic_order() {
        let (analytics, _) = analytics(vec![5.0, 5.0, 5.0, 2.0, 5.0]);

        let ranking = analytics.global_ranking(2024, 6, None).unwrap();

        let expensive: Vec<&str> = ranking
            .most_expensive
            .iter()
            .map(|r| r.query.country.as_str())
            .collect();
        assert_eq!(
            expensive,
            vec!["Brazil", "Japan", "Norway", "United States", "Switzerland"]
        );
        assert_eq!(ranking.cheapest[0].query.country.as_str(), "Switzerland");
        assert_eq!(ranking.cheapest[1].query.country.as_str(), "Brazil");
    }

    #[test]
    fn test_ranking_rejects_non_finite_prices() {
        let (analytics, _) = analytics(vec![5.0, f64::NAN, 5.0, 2.0, 5.0]);
        let err = analytics.global_ranking(2024, 6, None).unwrap_err();
        assert!(matches!(err, AnalyticsError::DegenerateResult { .. }));
    }

    #[test]
    fn test_ranking_invalid_month() {
        let (analytics, calls) = analytics(vec![4.0, 3.0, 6.0, 7.0, 5.0]);
        let err = analytics.global_ranking(2024, 13, None).unwrap_err();
        assert_eq!(err, AnalyticsError::Query(QueryError::InvalidMonth { month: 13 }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_trend_series_two_batches_shared_axis() {
        let (analytics, calls) = analytics(vec![4.0, 3.0, 6.0, 7.0, 5.0]);

        let trend = analytics.trend_series("Brazil", 2024, None).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(trend.years.first(), Some(&2000));
        assert_eq!(trend.years.last(), Some(&2030));
        assert_eq!(trend.marker_year, 2024);
        assert_eq!(trend.month, 7);
        assert_eq!(trend.country_series.len(), trend.years.len());
        assert_eq!(trend.benchmark_series.len(), trend.years.len());
        for ((year, c), b) in trend
            .years
            .iter()
            .zip(&trend.country_series)
            .zip(&trend.benchmark_series)
        {
            assert_eq!(c.query.year, *year);
            assert_eq!(b.query.year, *year);
            assert_eq!(c.query.month, 7);
            assert_eq!(b.query.country.as_str(), "United States");
        }
    }

    #[test]
    fn test_trend_series_custom_benchmark() {
        let (analytics, _) = analytics(vec![4.0, 3.0, 6.0, 7.0, 5.0]);
        let trend = analytics.trend_series("Brazil", 2010, Some("Japan")).unwrap();
        assert_eq!(trend.benchmark_country.as_str(), "Japan");
        assert_eq!(trend.benchmark_series[0].price, 3.0);
    }

    #[test]
    fn test_trend_series_rejects_non_finite_prices() {
        // 基準國家序列含 inf
        let (infinite_benchmark, _) = analytics(vec![4.0, 3.0, 6.0, 7.0, f64::INFINITY]);
        let err = infinite_benchmark
            .trend_series("Brazil", 2024, None)
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::DegenerateResult { .. }));

        let (nan_country, _) = analytics(vec![f64::NAN, 3.0, 6.0, 7.0, 5.0]);
        let err = nan_country.trend_series("Brazil", 2024, None).unwrap_err();
        assert!(matches!(err, AnalyticsError::DegenerateResult { .. }));
    }

    #[test]
    fn test_trend_series_target_year_too_late() {
        let (analytics, calls) = analytics(vec![4.0, 3.0, 6.0, 7.0, 5.0]);
        let err = analytics.trend_series("Brazil", 2_000_000, None).unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::Query(QueryError::TargetYearTooLate {
                year: 2_000_000,
                max: 2200
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_trend_series_before_floor() {
        let (analytics, calls) = analytics(vec![4.0, 3.0, 6.0, 7.0, 5.0]);
        let err = analytics.trend_series("Brazil", 1980, None).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Query(QueryError::EmptyYearRange { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
