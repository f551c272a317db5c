use std::collections::HashMap;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};

use crate::delegation::outcome::Failure;
use crate::providers::Asset;

/// Size ceiling on one file field. Reading stops as soon as it is crossed.
#[derive(Debug, Clone, Copy)]
pub struct FileLimit {
    pub field: &'static str,
    pub max_bytes: usize,
    /// Reported when the file (or the whole body) is too large.
    pub message: &'static str,
}

/// A fully-read multipart body: file parts by field name, plus text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    files: HashMap<String, Asset>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Reads every part. Oversized or malformed bodies become validation failures.
    pub async fn read(mut multipart: Multipart, limit: Option<FileLimit>) -> Result<Self, Failure> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| upload_error(e, limit))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = match limit {
                        Some(limit) if limit.field == name => read_capped(field, limit).await?,
                        _ => field.bytes().await.map_err(|e| upload_error(e, limit))?,
                    };
                    form.files.insert(
                        name,
                        Asset::new(bytes, content_type).with_file_name(file_name),
                    );
                }
                None => {
                    let text = field.text().await.map_err(|e| upload_error(e, limit))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn take_file(&mut self, name: &str) -> Option<Asset> {
        self.files.remove(name)
    }

    pub fn take_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

async fn read_capped(mut field: Field<'_>, limit: FileLimit) -> Result<Bytes, Failure> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| upload_error(e, Some(limit)))?
    {
        if buf.len() + chunk.len() > limit.max_bytes {
            return Err(Failure::validation(limit.message));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn upload_error(e: MultipartError, limit: Option<FileLimit>) -> Failure {
    match limit {
        Some(limit) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Failure::validation(limit.message)
        }
        _ => Failure::validation(format!("Invalid upload: {e}")),
    }
}
