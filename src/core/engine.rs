use crate::config::cli::LocalStorage;
use crate::config::http::HttpStorage;
use crate::core::analytics::Analytics;
use crate::core::artifact::{ArtifactStore, BundleLoader};
use crate::domain::model::EngineSettings;
use crate::domain::ports::{ArtifactLoader, ConfigProvider};
use crate::utils::error::LoadError;
use crate::utils::validation::is_remote_location;
use std::time::Duration;

/// Owns the artifact lifecycle and hands out analytics bound to it.
pub struct EstimatorEngine<L: ArtifactLoader> {
    store: ArtifactStore<L>,
    settings: EngineSettings,
}

impl<L: ArtifactLoader> EstimatorEngine<L> {
    pub fn new(loader: L, settings: EngineSettings) -> Self {
        Self {
            store: ArtifactStore::new(loader),
            settings,
        }
    }

    /// Loads the artifact on first use. A load failure halts every view.
    pub async fn analytics(&self) -> Result<Analytics, LoadError> {
        let artifact = self.store.get_or_load().await?;
        Ok(Analytics::new(artifact, self.settings.clone()))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn reload(&mut self) {
        self.store.invalidate();
    }
}

impl EstimatorEngine<Box<dyn ArtifactLoader>> {
    /// 依位置選擇本機或 HTTP 來源
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        let location = config.artifact_location();
        let loader: Box<dyn ArtifactLoader> = if is_remote_location(location) {
            let mut storage = HttpStorage::new();
            if let Some(seconds) = config.fetch_timeout_seconds() {
                storage = storage.with_timeout(Duration::from_secs(seconds));
            }
            Box::new(BundleLoader::new(
                storage,
                location,
                config.vocabulary_transformer(),
                config.vocabulary_policy(),
            ))
        } else {
            Box::new(BundleLoader::new(
                LocalStorage::default(),
                location,
                config.vocabulary_transformer(),
                config.vocabulary_policy(),
            ))
        };
        Self::new(loader, config.settings().clone())
    }
}
