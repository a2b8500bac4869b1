use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use axum::body::Bytes;
use uuid::Uuid;

/// Route prefix under which stored assets are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// A file received from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Binary asset store. `upload` returns the public URL of the stored asset; `remove`
/// takes that same URL back.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, file: &UploadedFile) -> anyhow::Result<String>;

    /// Removing an asset that is already gone is not an error.
    async fn remove(&self, url: &str) -> anyhow::Result<()>;
}

pub type DynStorage = Arc<dyn ObjectStorage>;

/// Stores assets in a local directory that the kernel serves under [`PUBLIC_PREFIX`].
pub struct LocalDiskStorage {
    base_dir: PathBuf,
    public_base_url: String,
}

impl LocalDiskStorage {
    pub async fn new(base_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> anyhow::Result<Self> {
        let base_dir = base_dir.into();
        tokio::fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir, public_base_url: public_base_url.into().trim_end_matches('/').to_string() })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_name_from_url<'a>(&self, url: &'a str) -> anyhow::Result<&'a str> {
        let Some((_, name)) = url.rsplit_once(&format!("{PUBLIC_PREFIX}/")) else {
            bail!("asset url {url:?} is not served by this store");
        };
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            bail!("invalid asset name in {url:?}");
        }
        Ok(name)
    }
}

#[async_trait]
impl ObjectStorage for LocalDiskStorage {
    async fn upload(&self, file: &UploadedFile) -> anyhow::Result<String> {
        let ext = Path::new(&file.file_name)
            .extension()
            .and_then(|s| s.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin");
        let fname = format!("{}-{}.{}", Uuid::new_v4(), chrono::Utc::now().timestamp(), ext);
        tokio::fs::write(self.base_dir.join(&fname), &file.bytes).await?;
        tracing::debug!(file = %fname, size = file.bytes.len(), "stored asset");
        Ok(format!("{}{PUBLIC_PREFIX}/{fname}", self.public_base_url))
    }

    async fn remove(&self, url: &str) -> anyhow::Result<()> {
        if url.is_empty() {
            return Ok(());
        }
        let name = self.file_name_from_url(url)?;
        match tokio::fs::remove_file(self.base_dir.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(%url, "asset already removed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
