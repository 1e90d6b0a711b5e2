use crate::domain::model::{
    CountryLabel, EngineSettings, ModelArtifact, QueryRow, VocabularyPolicy, VocabularySource,
};
use crate::utils::error::{EncodingError, InferenceError, LoadError};
use async_trait::async_trait;
use ndarray::Array2;

/// Byte source for serialized artifacts (local disk, HTTP, ...).
pub trait Storage: Send + Sync {
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, LoadError>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn artifact_location(&self) -> &str;
    fn vocabulary_transformer(&self) -> &str;
    fn vocabulary_policy(&self) -> VocabularyPolicy;
    fn settings(&self) -> &EngineSettings;

    /// Timeout for remote artifact fetches.
    fn fetch_timeout_seconds(&self) -> Option<u64> {
        None
    }
}

/// Supplies the fitted artifact. Called at most once per artifact lifetime.
#[async_trait]
pub trait ArtifactLoader: Send + Sync {
    async fn load(&self) -> Result<ModelArtifact, LoadError>;
}

#[async_trait]
impl<L: ArtifactLoader + ?Sized> ArtifactLoader for Box<L> {
    async fn load(&self) -> Result<ModelArtifact, LoadError> {
        (**self).load().await
    }
}

/// Frozen training-time transform from query rows to model features.
pub trait FeatureEncoder: Send + Sync {
    /// Fitted vocabulary, sorted lexicographically.
    fn valid_countries(&self) -> &[CountryLabel];

    fn vocabulary_source(&self) -> VocabularySource;

    /// Number of columns produced per row.
    fn n_features(&self) -> usize;

    fn encode(&self, rows: &[QueryRow]) -> Result<Array2<f64>, EncodingError>;
}

/// Already-fitted regression model. `predict` returns one value per input row.
pub trait Regressor: Send + Sync {
    fn n_features(&self) -> usize;

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, InferenceError>;

    fn describe(&self) -> String {
        "regressor".to_string()
    }
}
