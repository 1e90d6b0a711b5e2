mod common;

use bigmac_engine::core::inference::InferenceEngine;
use bigmac_engine::core::{CountryLabel, QueryRow, VocabularySource};
use bigmac_engine::utils::error::{AnalyticsError, InferenceError, QueryError};
use chrono::NaiveDate;
use common::{expected_price, fixture_analytics, COUNTRIES};

fn june_2024() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[test]
fn test_vocabulary_is_introspected_and_sorted() {
    let analytics = fixture_analytics();
    let countries: Vec<&str> = analytics
        .valid_countries()
        .iter()
        .map(CountryLabel::as_str)
        .collect();

    let mut expected: Vec<&str> = COUNTRIES.iter().map(|(c, _)| *c).collect();
    expected.sort();

    assert_eq!(countries, expected);
    assert_eq!(analytics.vocabulary_source(), VocabularySource::Introspected);
}

#[test]
fn test_batch_keeps_length_and_order() {
    let analytics = fixture_analytics();
    let engine = InferenceEngine::new(analytics.artifact());

    let rows = vec![
        QueryRow::new("Switzerland", 2010, 3).unwrap(),
        QueryRow::new("Brazil", 2024, 6).unwrap(),
        QueryRow::new("Brazil", 2001, 12).unwrap(),
        QueryRow::new("India", 2030, 1).unwrap(),
    ];
    let results = engine.predict_results(rows.clone()).unwrap();

    assert_eq!(results.len(), rows.len());
    for (row, result) in rows.iter().zip(&results) {
        assert_eq!(&result.query, row);
        assert_eq!(
            result.price,
            expected_price(row.country.as_str(), row.year, row.month)
        );
    }
}

#[test]
fn test_empty_batch_is_empty() {
    let analytics = fixture_analytics();
    let engine = InferenceEngine::new(analytics.artifact());
    assert!(engine.predict(&[]).unwrap().is_empty());
}

#[test]
fn test_unknown_country_rejects_whole_batch() {
    let analytics = fixture_analytics();
    let engine = InferenceEngine::new(analytics.artifact());

    let rows = vec![
        QueryRow::new("Brazil", 2024, 6).unwrap(),
        QueryRow::new("Atlantis", 2024, 6).unwrap(),
    ];
    let err = engine.predict(&rows).unwrap_err();
    assert!(matches!(err, InferenceError::Encoding(_)));

    let err = analytics.point_estimate("Atlantis", june_2024()).unwrap_err();
    assert!(err.is_unknown_country());
}

#[test]
fn test_brazil_against_united_states() {
    let analytics = fixture_analytics();
    let estimate = analytics.point_estimate("Brazil", june_2024()).unwrap();

    let brazil = expected_price("Brazil", 2024, 6);
    let us = expected_price("United States", 2024, 6);

    assert_eq!(estimate.country.as_str(), "Brazil");
    assert_eq!(estimate.benchmark_country.as_str(), "United States");
    assert_eq!(estimate.country_price, brazil);
    assert_eq!(estimate.benchmark_price, us);
    assert!((estimate.relative_delta_percent - (brazil / us - 1.0) * 100.0).abs() < 1e-12);
    assert!(estimate.relative_delta_percent < 0.0);
    assert_eq!(estimate.converted_price, brazil * estimate.exchange_rate);
}

#[test]
fn test_ranking_order_and_length() {
    let analytics = fixture_analytics();

    for top_n in [1, 3, 10, 25] {
        let ranking = analytics.global_ranking(2024, 6, Some(top_n)).unwrap();
        let expected_len = top_n.min(COUNTRIES.len());

        assert_eq!(ranking.most_expensive.len(), expected_len);
        assert_eq!(ranking.cheapest.len(), expected_len);
        assert!(ranking
            .most_expensive
            .windows(2)
            .all(|w| w[0].price >= w[1].price));
        assert!(ranking.cheapest.windows(2).all(|w| w[0].price <= w[1].price));
    }
}

#[test]
fn test_ranking_top_three() {
    let analytics = fixture_analytics();
    let ranking = analytics.global_ranking(2024, 6, Some(3)).unwrap();

    let names = |list: &[bigmac_engine::core::PredictionResult]| -> Vec<String> {
        list.iter().map(|r| r.query.country.to_string()).collect()
    };

    // Denmark and Sweden tie; vocabulary order breaks the tie in both lists
    assert_eq!(
        names(&ranking.most_expensive),
        vec!["Switzerland", "United States", "Denmark"]
    );
    assert_eq!(names(&ranking.cheapest), vec!["India", "China", "Japan"]);

    let full = analytics.global_ranking(2024, 6, Some(10)).unwrap();
    let denmark = full
        .cheapest
        .iter()
        .position(|r| r.query.country.as_str() == "Denmark")
        .unwrap();
    let sweden = full
        .cheapest
        .iter()
        .position(|r| r.query.country.as_str() == "Sweden")
        .unwrap();
    assert!(denmark < sweden);
}

#[test]
fn test_point_estimate_matches_ranking() {
    let analytics = fixture_analytics();
    let ranking = analytics
        .global_ranking(2024, 6, Some(COUNTRIES.len()))
        .unwrap();

    for entry in &ranking.most_expensive {
        let estimate = analytics
            .point_estimate(entry.query.country.as_str(), june_2024())
            .unwrap();
        assert_eq!(estimate.country_price, entry.price);
    }
}

#[test]
fn test_trend_years_span_floor_to_lookahead() {
    let analytics = fixture_analytics();
    let trend = analytics.trend_series("Japan", 2024, None).unwrap();

    let expected: Vec<i32> = (2000..=2030).collect();
    assert_eq!(trend.years, expected);
    assert!(trend.years.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(trend.marker_year, 2024);
    assert_eq!(trend.month, 7);
    assert_eq!(trend.benchmark_country.as_str(), "United States");

    assert_eq!(trend.country_series.len(), trend.years.len());
    assert_eq!(trend.benchmark_series.len(), trend.years.len());
    for ((year, country), benchmark) in trend
        .years
        .iter()
        .zip(&trend.country_series)
        .zip(&trend.benchmark_series)
    {
        assert_eq!(country.query.year, *year);
        assert_eq!(benchmark.query.year, *year);
        assert_eq!(country.price, expected_price("Japan", *year, 7));
        assert_eq!(benchmark.price, expected_price("United States", *year, 7));
    }
}

#[test]
fn test_trend_with_explicit_benchmark() {
    let analytics = fixture_analytics();
    let trend = analytics
        .trend_series("Brazil", 2010, Some("Euro area"))
        .unwrap();

    assert_eq!(trend.benchmark_country.as_str(), "Euro area");
    assert_eq!(trend.years.last(), Some(&2016));
}

#[test]
fn test_trend_before_floor_is_rejected() {
    let analytics = fixture_analytics();
    let err = analytics.trend_series("Brazil", 1980, None).unwrap_err();
    assert!(matches!(
        err,
        AnalyticsError::Query(QueryError::EmptyYearRange { .. })
    ));
}

#[test]
fn test_trend_target_year_is_bounded() {
    let analytics = fixture_analytics();

    let err = analytics.trend_series("Brazil", 2_000_000, None).unwrap_err();
    assert!(matches!(
        err,
        AnalyticsError::Query(QueryError::TargetYearTooLate { year: 2_000_000, .. })
    ));

    let trend = analytics.trend_series("Brazil", 2200, None).unwrap();
    assert_eq!(trend.years.len(), 207);
}

#[test]
fn test_views_are_idempotent() {
    let analytics = fixture_analytics();

    let first = serde_json::to_string(&analytics.global_ranking(2024, 6, Some(5)).unwrap()).unwrap();
    let second = serde_json::to_string(&analytics.global_ranking(2024, 6, Some(5)).unwrap()).unwrap();
    assert_eq!(first, second);

    let first = analytics.trend_series("China", 2020, None).unwrap();
    let second = analytics.trend_series("China", 2020, None).unwrap();
    assert_eq!(first, second);

    let first = analytics.point_estimate("Argentina", june_2024()).unwrap();
    let second = analytics.point_estimate("Argentina", june_2024()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_invalid_month_is_rejected() {
    let analytics = fixture_analytics();
    let err = analytics.global_ranking(2024, 13, Some(3)).unwrap_err();
    assert!(matches!(
        err,
        AnalyticsError::Query(QueryError::InvalidMonth { month: 13 })
    ));
}
