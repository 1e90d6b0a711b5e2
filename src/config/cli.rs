use crate::domain::ports::Storage;
use crate::utils::error::LoadError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Filesystem storage. Relative paths resolve against `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        let full_path = Path::new(&self.base_path).join(path);
        tokio::fs::read(&full_path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                location: full_path.display().to_string(),
            },
            _ => LoadError::Unavailable {
                location: full_path.display().to_string(),
                reason: e.to_string(),
            },
        })
    }
}
