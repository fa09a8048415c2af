//! Multipart form reading shared by registration and product forms.

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;

use crate::error::AppError;
use crate::services::{ImageUpload, MediaError};

/// Text fields plus at most one file from a multipart form.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    /// The file part named by the handler, if one with content was sent.
    pub file: Option<ImageUpload>,
}

impl FormData {
    /// Remove and return a text field.
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Remove a text field, treating blank values as absent.
    pub fn take_non_blank(&mut self, name: &str) -> Option<String> {
        self.take(name).filter(|v| !v.trim().is_empty())
    }
}

/// Read every part of the form.
///
/// The part called `file_field` is kept as an [`ImageUpload`]; an empty file
/// part (browsers send one when nothing was picked) counts as no file. Other
/// file parts are ignored. Repeated text fields keep the last value.
///
/// # Errors
///
/// Returns `MediaError::TooLarge` when the body limit is hit and
/// `AppError::BadRequest` for a malformed form.
pub async fn read_form(mut multipart: Multipart, file_field: &str) -> Result<FormData, AppError> {
    let mut form = FormData::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == file_field {
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            if !bytes.is_empty() {
                form.file = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
        } else if field.file_name().is_some() {
            tracing::debug!(field = %name, "ignoring unexpected file part");
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        MediaError::TooLarge.into()
    } else {
        AppError::BadRequest(err.body_text())
    }
}
