use async_trait::async_trait;
use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};

use crate::artifact::{ArtifactError, ArtifactStore, PutOptions, io_error};

/// Filesystem-backed artifact store rooted at `<root>/.artifacts`.
#[derive(Clone)]
pub struct FsArtifactStore {
    objects_dir: PathBuf,
}

impl fmt::Debug for FsArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsArtifactStore")
            .field("objects_dir", &self.objects_dir)
            .finish()
    }
}

impl FsArtifactStore {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let objects_dir = root.as_ref().join(".artifacts");
        fs::create_dir_all(&objects_dir)
            .await
            .map_err(|e| io_error(&objects_dir, e))?;
        Ok(Self { objects_dir })
    }

    /// Map an object path onto the filesystem. Only plain relative segments
    /// are accepted so objects cannot escape the store root.
    fn object_path(&self, path: &str) -> Result<PathBuf, ArtifactError> {
        let invalid = |reason| ArtifactError::InvalidPath {
            path: path.to_string(),
            reason,
        };
        if path.is_empty() {
            return Err(invalid("empty path"));
        }
        let mut resolved = self.objects_dir.clone();
        for segment in path.split('/') {
            match segment {
                "" => return Err(invalid("empty segment")),
                "." | ".." => return Err(invalid("relative segment")),
                s if s.contains('\\') || s.contains('\0') => {
                    return Err(invalid("forbidden character"));
                }
                s => resolved.push(s),
            }
        }
        Ok(resolved)
    }

    async fn write_once(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(ArtifactError::AlreadyExists(path.display().to_string()));
            }
            Err(err) => return Err(io_error(path, err)),
        };
        file.write_all(bytes).await.map_err(|e| io_error(path, e))?;
        file.sync_all().await.map_err(|e| io_error(path, e))?;
        Ok(())
    }

    /// Write to a sibling temp file, then rename over the target so readers
    /// never observe a partial object.
    async fn replace(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));
        Self::write_once(&tmp, bytes).await?;
        if let Err(err) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_error(path, err));
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        options: PutOptions,
    ) -> anyhow::Result<()> {
        let target = self.object_path(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        if options.upsert {
            Self::replace(&target, &bytes).await?;
        } else {
            Self::write_once(&target, &bytes).await?;
        }
        Ok(())
    }

    async fn get_object(&self, path: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let target = self.object_path(path)?;
        match fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(target, err).into()),
        }
    }
}
