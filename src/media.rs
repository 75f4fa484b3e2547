use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::MediaConfig;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to write media file {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// A stored piece of media, addressable by URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedMedia {
    pub uri: String,
}

/// Persists downloaded media content and hands back a retrievable URI.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn save(&self, extension: &str, content: Bytes) -> Result<SavedMedia, MediaError>;
}

/// Filesystem-backed store. Files land in the download directory under a
/// timestamped unique name and are served from `{base_url}/downloaded/`.
pub struct FsMediaStore {
    dir: PathBuf,
    base_url: String,
}

impl FsMediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            dir: config.download_dir.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn save(&self, extension: &str, content: Bytes) -> Result<SavedMedia, MediaError> {
        let name = format!(
            "{}-{}.{}",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            Uuid::new_v4(),
            extension
        );
        let path = self.dir.join(&name);
        tokio::fs::write(&path, &content)
            .await
            .map_err(|source| MediaError::Write {
                name: name.clone(),
                source,
            })?;
        debug!("saved {} bytes to {}", content.len(), path.display());
        Ok(SavedMedia {
            uri: format!("{}/downloaded/{}", self.base_url, name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_writes_file_and_returns_uri() {
        let dir = std::env::temp_dir().join(format!("betbot-media-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let store = FsMediaStore::new(&MediaConfig {
            download_dir: dir.clone(),
            base_url: "https://bot.example.com/".to_string(),
        });
        let saved = store
            .save("jpg", Bytes::from_static(b"not really a jpg"))
            .await
            .unwrap();

        assert!(saved.uri.starts_with("https://bot.example.com/downloaded/"));
        assert!(saved.uri.ends_with(".jpg"));

        let name = saved.uri.rsplit('/').next().unwrap();
        let written = tokio::fs::read(dir.join(name)).await.unwrap();
        assert_eq!(written, b"not really a jpg");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
