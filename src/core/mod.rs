pub mod analytics;
pub mod artifact;
pub mod encoder;
pub mod engine;
pub mod inference;
pub mod query;
pub mod regressor;

pub use crate::domain::model::{
    CountryLabel, GlobalRanking, ModelArtifact, PointEstimate, PredictionResult, QueryRow,
    TrendSeries, VocabularySource,
};
pub use crate::core::analytics::Analytics;
pub use crate::domain::ports::{ArtifactLoader, ConfigProvider, FeatureEncoder, Regressor, Storage};
