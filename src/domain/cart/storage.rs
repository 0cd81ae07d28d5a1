//! Local storage for cart sessions: one serialized line list per cart.

use async_trait::async_trait;
use camino::Utf8PathBuf;

use super::{CartId, CartLine};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Could not access stored cart at {path}.")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("Stored cart at {path} is not valid.")]
    Corrupt {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait CartStorage: Send + Sync {
    /// Reads the stored lines of a cart. `Ok(None)` when nothing was stored yet.
    async fn load(&self, cart_id: CartId) -> Result<Option<Vec<CartLine>>, StorageError>;

    async fn save(&self, cart_id: CartId, lines: &[CartLine]) -> Result<(), StorageError>;
}

/// Keeps each cart as `<cart_id>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    directory: Utf8PathBuf,
}

impl FileCartStorage {
    pub fn new(directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path(&self, cart_id: CartId) -> Utf8PathBuf {
        self.directory.join(format!("{cart_id}.json"))
    }
}

#[async_trait]
impl CartStorage for FileCartStorage {
    async fn load(&self, cart_id: CartId) -> Result<Option<Vec<CartLine>>, StorageError> {
        let path = self.path(cart_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Corrupt { path, source })
    }

    async fn save(&self, cart_id: CartId, lines: &[CartLine]) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| StorageError::Io {
                path: self.directory.clone(),
                source,
            })?;

        let path = self.path(cart_id);
        let payload = serde_json::to_vec(lines).map_err(|source| StorageError::Corrupt {
            path: path.clone(),
            source,
        })?;

        // Staged then renamed into place; readers never see a partial file.
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, payload)
            .await
            .map_err(|source| StorageError::Io {
                path: staging.clone(),
                source,
            })?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|source| StorageError::Io { path, source })
    }
}

//-------------------------- Tests -------------------------------
