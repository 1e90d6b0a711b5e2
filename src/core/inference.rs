use crate::domain::model::{ModelArtifact, PredictionResult, QueryRow};
use crate::utils::error::InferenceError;
use std::time::Instant;

/// Batch inference over a loaded artifact.
///
/// Every call encodes the whole batch once and invokes the model once. The
/// result is all-or-nothing: any failure rejects the entire batch.
#[derive(Debug, Clone, Copy)]
pub struct InferenceEngine<'a> {
    artifact: &'a ModelArtifact,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(artifact: &'a ModelArtifact) -> Self {
        Self { artifact }
    }

    /// One price per row, same length and order as `rows`.
    pub fn predict(&self, rows: &[QueryRow]) -> Result<Vec<f64>, InferenceError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let features = self.artifact.encoder().encode(rows)?;

        let model = self.artifact.model();
        if features.ncols() != model.n_features() {
            return Err(InferenceError::ShapeMismatch {
                expected: model.n_features(),
                actual: features.ncols(),
            });
        }

        let prices = model.predict(&features)?;
        if prices.len() != rows.len() {
            return Err(InferenceError::OutputLength {
                expected: rows.len(),
                actual: prices.len(),
            });
        }

        tracing::debug!(
            "Batch inference: {} rows x {} features in {:?}",
            rows.len(),
            features.ncols(),
            started.elapsed()
        );
        Ok(prices)
    }

    pub fn predict_results(&self, rows: Vec<QueryRow>) -> Result<Vec<PredictionResult>, InferenceError> {
        let prices = self.predict(&rows)?;
        Ok(rows
            .into_iter()
            .zip(prices)
            .map(|(query, price)| PredictionResult { query, price })
            .collect())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::domain::model::CountryLabel;
    use crate::utils::error::EncodingError;
    use std::sync::atomic::Ordering;

    fn row(country: &str, year: i32) -> QueryRow {
        QueryRow::new(country, year, 6).unwrap()
    }

    #[test]
    fn test_predict_preserves_length_and_order_with_one_call() {
        let (artifact, calls) = artifact(&["Brazil", "Japan", "United States"], vec![4.0, 3.0, 5.0], 0.0);
        let engine = InferenceEngine::new(&artifact);

        let prices = engine
            .predict(&[row("United States", 2024), row("Brazil", 2024), row("Japan", 2024)])
            .unwrap();

        assert_eq!(prices, vec![5.0, 4.0, 3.0]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_batch_skips_model() {
        let (artifact, calls) = artifact(&["Brazil"], vec![4.0], 0.0);
        let prices = InferenceEngine::new(&artifact).predict(&[]).unwrap();
        assert!(prices.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_country_rejects_whole_batch() {
        let (artifact, calls) = artifact(&["Brazil"], vec![4.0], 0.0);
        let err = InferenceEngine::new(&artifact)
            .predict(&[row("Brazil", 2024), row("Atlantis", 2024)])
            .unwrap_err();

        assert_eq!(
            err,
            InferenceError::Encoding(EncodingError::UnknownCountry {
                country: "Atlantis".to_string()
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_encoder_model_width_mismatch() {
        let mut encoder = IndexEncoder::new(&["Brazil"]);
        encoder.width = 4;
        let artifact = ModelArtifact::new(TableModel::new(vec![4.0], 0.0), encoder);

        let err = InferenceEngine::new(&artifact)
            .predict(&[row("Brazil", 2024)])
            .unwrap_err();
        assert_eq!(
            err,
            InferenceError::ShapeMismatch {
                expected: 3,
                actual: 4
            }
        );
    }

    #[test]
    fn test_predict_results_pairs_rows() {
        let (artifact, _) = artifact(&["Brazil"], vec![4.0], 0.5);
        let results = InferenceEngine::new(&artifact)
            .predict_results(vec![row("Brazil", 2000), row("Brazil", 2002)])
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].query.country, CountryLabel::from("Brazil"));
        assert_eq!(results[1].price, 5.0);
    }
}
