use crate::core::encoder::{ColumnTransformer, EncoderAdapter, VocabularyPolicy};
use crate::core::regressor::Model;
use crate::domain::model::ModelArtifact;
use crate::domain::ports::{ArtifactLoader, FeatureEncoder, Regressor, Storage};
use crate::utils::error::LoadError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

pub const MANIFEST_ENTRY: &str = "manifest.json";
pub const MODEL_ENTRY: &str = "model.json";
pub const PREPROCESSOR_ENTRY: &str = "preprocessor.json";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Single-document artifact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDocument {
    pub format_version: u32,
    pub model: Model,
    pub preprocessor: ColumnTransformer,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Manifest {
    pub format_version: u32,
}

fn check_version(location: &str, version: u32) -> Result<(), LoadError> {
    if version != ARTIFACT_FORMAT_VERSION {
        return Err(LoadError::corrupt(
            location,
            format!(
                "unsupported format version {} (expected {})",
                version, ARTIFACT_FORMAT_VERSION
            ),
        ));
    }
    Ok(())
}

/// 依內容判斷格式：zip bundle 或單一 JSON 文件
pub fn decode_artifact(location: &str, bytes: &[u8]) -> Result<ArtifactDocument, LoadError> {
    if bytes.starts_with(ZIP_MAGIC) {
        decode_zip(location, bytes)
    } else {
        decode_json(location, bytes)
    }
}

fn decode_json(location: &str, bytes: &[u8]) -> Result<ArtifactDocument, LoadError> {
    // 先讀版本，避免版本不符時回報難懂的 schema 錯誤
    let manifest: Manifest = serde_json::from_slice(bytes)
        .map_err(|e| LoadError::corrupt(location, format!("invalid artifact JSON: {}", e)))?;
    check_version(location, manifest.format_version)?;

    serde_json::from_slice(bytes)
        .map_err(|e| LoadError::corrupt(location, format!("invalid artifact JSON: {}", e)))
}

fn decode_zip(location: &str, bytes: &[u8]) -> Result<ArtifactDocument, LoadError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| LoadError::corrupt(location, format!("invalid zip bundle: {}", e)))?;

    let mut read_entry = |name: &str| -> Result<Vec<u8>, LoadError> {
        let mut entry = archive
            .by_name(name)
            .map_err(|e| LoadError::corrupt(location, format!("missing {}: {}", name, e)))?;
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| LoadError::corrupt(location, format!("unreadable {}: {}", name, e)))?;
        Ok(data)
    };

    let manifest = read_entry(MANIFEST_ENTRY)?;
    let model = read_entry(MODEL_ENTRY)?;
    let preprocessor = read_entry(PREPROCESSOR_ENTRY)?;

    let manifest: Manifest = parse_entry(location, MANIFEST_ENTRY, &manifest)?;
    check_version(location, manifest.format_version)?;

    Ok(ArtifactDocument {
        format_version: manifest.format_version,
        model: parse_entry(location, MODEL_ENTRY, &model)?,
        preprocessor: parse_entry(location, PREPROCESSOR_ENTRY, &preprocessor)?,
    })
}

fn parse_entry<T: serde::de::DeserializeOwned>(
    location: &str,
    name: &str,
    data: &[u8],
) -> Result<T, LoadError> {
    serde_json::from_slice(data)
        .map_err(|e| LoadError::corrupt(location, format!("invalid {}: {}", name, e)))
}

/// Validate a decoded document and resolve the encoder vocabulary.
pub fn build_artifact(
    location: &str,
    document: ArtifactDocument,
    vocabulary_transformer: &str,
    policy: &VocabularyPolicy,
) -> Result<ModelArtifact, LoadError> {
    document
        .model
        .validate()
        .map_err(|reason| LoadError::corrupt(location, reason))?;
    document
        .preprocessor
        .validate()
        .map_err(|reason| LoadError::corrupt(location, reason))?;

    let encoder = EncoderAdapter::resolve(
        document.preprocessor,
        vocabulary_transformer,
        policy,
        location,
    )?;

    if encoder.n_features() != document.model.n_features() {
        return Err(LoadError::corrupt(
            location,
            format!(
                "preprocessor produces {} features but model expects {}",
                encoder.n_features(),
                document.model.n_features()
            ),
        ));
    }

    tracing::info!(
        "✅ Loaded model artifact {}: {} model, {} features, {} countries ({:?} vocabulary)",
        location,
        document.model.describe(),
        encoder.n_features(),
        encoder.valid_countries().len(),
        encoder.vocabulary_source()
    );

    Ok(ModelArtifact::new(document.model, encoder))
}

/// Reads an artifact through a [`Storage`] backend.
pub struct BundleLoader<S: Storage> {
    storage: S,
    location: String,
    vocabulary_transformer: String,
    policy: VocabularyPolicy,
}

impl<S: Storage> BundleLoader<S> {
    pub fn new(
        storage: S,
        location: impl Into<String>,
        vocabulary_transformer: impl Into<String>,
        policy: VocabularyPolicy,
    ) -> Self {
        Self {
            storage,
            location: location.into(),
            vocabulary_transformer: vocabulary_transformer.into(),
            policy,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

#[async_trait]
impl<S: Storage> ArtifactLoader for BundleLoader<S> {
    async fn load(&self) -> Result<ModelArtifact, LoadError> {
        let started = Instant::now();
        tracing::info!("📦 Loading model artifact from: {}", self.location);

        let bytes = self.storage.read_file(&self.location).await?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), self.location);

        let document = decode_artifact(&self.location, &bytes)?;
        let artifact = build_artifact(
            &self.location,
            document,
            &self.vocabulary_transformer,
            &self.policy,
        )?;

        tracing::debug!("Artifact ready in {:?}", started.elapsed());
        Ok(artifact)
    }
}

/// Lifecycle-scoped artifact cache: loaded on first use, read-only afterwards.
pub struct ArtifactStore<L: ArtifactLoader> {
    loader: L,
    cell: OnceCell<Arc<ModelArtifact>>,
}

impl<L: ArtifactLoader> ArtifactStore<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
        }
    }

    /// Concurrent first calls share a single load. A failed load is not cached.
    pub async fn get_or_load(&self) -> Result<Arc<ModelArtifact>, LoadError> {
        self.cell
            .get_or_try_init(|| async { self.loader.load().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn get(&self) -> Option<Arc<ModelArtifact>> {
        self.cell.get().cloned()
    }

    /// Drop the cached artifact so the next call reloads it.
    pub fn invalidate(&mut self) {
        if self.cell.take().is_some() {
            tracing::info!("🔄 Model artifact invalidated; next query reloads it");
        }
    }
}
