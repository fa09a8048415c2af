//! Local-disk image storage, served under `/uploads`.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{ImageUpload, MediaError, MediaFolder};

/// URL path the uploads directory is mounted at.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Stores images in a directory with random file names.
#[derive(Clone, Debug)]
pub struct LocalUploads {
    dir: PathBuf,
    public_base: String,
}

impl LocalUploads {
    #[must_use]
    pub fn new(dir: PathBuf, base_url: &str) -> Self {
        Self {
            dir,
            public_base: format!("{}{UPLOADS_ROUTE}", base_url.trim_end_matches('/')),
        }
    }

    /// Directory served under [`UPLOADS_ROUTE`].
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub(super) async fn store(
        &self,
        upload: &ImageUpload,
        folder: MediaFolder,
    ) -> Result<String, MediaError> {
        let target_dir = self.dir.join(folder.as_str());
        tokio::fs::create_dir_all(&target_dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), upload.extension());
        tokio::fs::write(target_dir.join(&file_name), &upload.bytes).await?;

        Ok(format!("{}/{}/{file_name}", self.public_base, folder.as_str()))
    }
}
