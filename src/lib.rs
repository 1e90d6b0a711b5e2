pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, http::HttpStorage, CliConfig, ResolvedConfig};
pub use core::{
    analytics::Analytics,
    artifact::{ArtifactStore, BundleLoader},
    engine::EstimatorEngine,
};
pub use utils::error::{AnalyticsError, EstimatorError, LoadError, Result};
