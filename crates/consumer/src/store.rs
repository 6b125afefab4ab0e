//! FileArtifactStore - one durable text file per flushed batch

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use contracts::{ArtifactStore, ContractError, SuffixSource, WorkerId};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument};

/// Store that writes each batch to `<output_dir>/<worker>_<suffix>.txt`
pub struct FileArtifactStore {
    name: String,
    output_dir: PathBuf,
    suffix: Arc<dyn SuffixSource>,
}

impl FileArtifactStore {
    /// Create the store, creating `output_dir` if it doesn't exist
    pub fn new(
        name: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        suffix: Arc<dyn SuffixSource>,
    ) -> std::io::Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            name: name.into(),
            output_dir,
            suffix,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Artifact location for a given worker and suffix
    pub fn artifact_path(&self, worker: WorkerId, suffix: u64) -> PathBuf {
        self.output_dir.join(format!("{worker}_{suffix}.txt"))
    }

    async fn write_artifact(path: &Path, content: &[u8]) -> std::io::Result<()> {
        // create_new: an existing artifact is never overwritten
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        Ok(())
    }
}

impl ArtifactStore for FileArtifactStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_store_persist",
        skip(self, content),
        fields(store = %self.name, worker = %worker, bytes = content.len())
    )]
    async fn persist(&self, worker: WorkerId, content: Bytes) -> Result<PathBuf, ContractError> {
        let path = self.artifact_path(worker, self.suffix.next_suffix());

        if let Err(e) = Self::write_artifact(&path, &content).await {
            error!(path = %path.display(), error = %e, "Failed to write artifact");
            return Err(ContractError::artifact_write(
                worker,
                format!("{}: {e}", path.display()),
            ));
        }

        debug!(path = %path.display(), "Artifact written");
        Ok(path)
    }
}
