//! Image ingestion.
//!
//! Every upload goes through the same steps: validate the file, hand it to
//! the configured image host, and fall back to "no image" only when the
//! request carried no file or the host failed under the `placeholder`
//! failure policy.
//!
//! Validation failures are always client errors. Host failures are either
//! surfaced (`reject`, the default) or logged and swallowed (`placeholder`).

mod cloudinary;
mod local;

use axum::body::Bytes;
use thiserror::Error;

pub use cloudinary::CloudinaryClient;
pub use local::{LocalUploads, UPLOADS_ROUTE};

use crate::config::{ImageFailurePolicy, MediaBackendConfig, MediaConfig};

/// Largest accepted upload (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Errors that can occur while ingesting an image.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The file is not an image.
    #[error("Only image files are allowed!")]
    NotAnImage,

    /// The file exceeds [`MAX_IMAGE_BYTES`].
    #[error("File size too large! Maximum size is 5MB.")]
    TooLarge,

    /// HTTP request to the image host failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The image host rejected the upload.
    #[error("image host error: {status} - {message}")]
    Host { status: u16, message: String },

    /// Writing a local upload failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Whether the error comes from the uploaded file rather than the host.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::NotAnImage | Self::TooLarge)
    }
}

/// Destination folder, one per kind of image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFolder {
    Products,
    Profiles,
}

impl MediaFolder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Profiles => "profiles",
        }
    }
}

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied file name, if any.
    pub file_name: Option<String>,
    /// Declared content type.
    pub content_type: String,
    /// File contents.
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Check content type and size.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::NotAnImage` unless the content type is a raster
    /// `image/` type, and `MediaError::TooLarge` above [`MAX_IMAGE_BYTES`].
    pub fn validate(&self) -> Result<(), MediaError> {
        let content_type = self.content_type.trim().to_lowercase();
        // SVG is markup and can carry script
        match content_type.strip_prefix("image/") {
            Some(subtype) if !subtype.starts_with("svg") => {}
            _ => return Err(MediaError::NotAnImage),
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(MediaError::TooLarge);
        }
        Ok(())
    }

    /// File extension derived from the content type (`image/jpeg` -> `jpg`).
    #[must_use]
    pub fn extension(&self) -> String {
        let subtype = self
            .content_type
            .split_once('/')
            .map_or("bin", |(_, sub)| sub);
        let subtype = subtype.split(['+', ';']).next().unwrap_or(subtype).trim();
        match subtype {
            "jpeg" | "pjpeg" => "jpg".to_owned(),
            "" => "bin".to_owned(),
            other => other
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_lowercase(),
        }
    }
}

/// Where accepted images are stored.
#[derive(Clone, Debug)]
pub enum ImageHost {
    Cloudinary(CloudinaryClient),
    Local(LocalUploads),
}

impl ImageHost {
    /// Store an already validated image and return its public URL.
    async fn store(&self, upload: &ImageUpload, folder: MediaFolder) -> Result<String, MediaError> {
        match self {
            Self::Cloudinary(client) => client.upload(upload, folder).await,
            Self::Local(local) => local.store(upload, folder).await,
        }
    }
}

/// Image ingestion with a fixed failure policy.
#[derive(Clone, Debug)]
pub struct MediaService {
    host: ImageHost,
    failure_policy: ImageFailurePolicy,
    placeholder_image_url: String,
}

impl MediaService {
    /// Build the service for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &MediaConfig, base_url: &str) -> Result<Self, MediaError> {
        let host = match &config.backend {
            MediaBackendConfig::Cloudinary(cloudinary) => {
                ImageHost::Cloudinary(CloudinaryClient::new(cloudinary)?)
            }
            MediaBackendConfig::Local { dir } => {
                ImageHost::Local(LocalUploads::new(dir.clone(), base_url))
            }
        };

        Ok(Self::new(
            host,
            config.failure_policy,
            config.placeholder_image_url.clone(),
        ))
    }

    #[must_use]
    pub const fn new(
        host: ImageHost,
        failure_policy: ImageFailurePolicy,
        placeholder_image_url: String,
    ) -> Self {
        Self {
            host,
            failure_policy,
            placeholder_image_url,
        }
    }

    /// URL used for products without an image.
    #[must_use]
    pub fn placeholder_image_url(&self) -> &str {
        &self.placeholder_image_url
    }

    /// The local uploads directory, when images are stored on disk.
    #[must_use]
    pub const fn local_uploads(&self) -> Option<&LocalUploads> {
        match &self.host {
            ImageHost::Local(local) => Some(local),
            ImageHost::Cloudinary(_) => None,
        }
    }

    /// Validate and store an optional upload.
    ///
    /// Returns `Ok(None)` when no file was supplied, or when the host failed
    /// and the failure policy is `placeholder`.
    ///
    /// # Errors
    ///
    /// Returns a client error (`NotAnImage`, `TooLarge`) for invalid files,
    /// and the host error under the `reject` policy.
    #[tracing::instrument(skip_all, fields(folder = folder.as_str()))]
    pub async fn ingest(
        &self,
        upload: Option<ImageUpload>,
        folder: MediaFolder,
    ) -> Result<Option<String>, MediaError> {
        let Some(upload) = upload else {
            return Ok(None);
        };
        upload.validate()?;

        match self.host.store(&upload, folder).await {
            Ok(url) => {
                tracing::info!(bytes = upload.bytes.len(), "image stored");
                Ok(Some(url))
            }
            Err(e) => match self.failure_policy {
                ImageFailurePolicy::Reject => Err(e),
                ImageFailurePolicy::Placeholder => {
                    tracing::warn!(error = %e, "image host failed, continuing without image");
                    Ok(None)
                }
            },
        }
    }
}
