// Uploaded file storage and multipart form collection

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use axum::extract::Multipart;
use chrono::Utc;
use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Per-file size limit.
pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

/// Public URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub original_name: String,
    /// Public path, e.g. `/uploads/1739512345123-9f1c...png`
    pub path: String,
}

#[derive(Clone)]
pub struct UploadStore {
    base_path: PathBuf,
}

impl UploadStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {e}")))?;
        Ok(())
    }

    /// Writes the bytes under a collision-free name derived from the current
    /// time and a random suffix, keeping the original extension.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<StoredFile> {
        let stored_name = format!(
            "{}-{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension_of(original_name)
        );

        fs::write(self.base_path.join(&stored_name), data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write upload: {e}")))?;

        Ok(StoredFile {
            original_name: original_name.to_string(),
            path: format!("{PUBLIC_PREFIX}/{stored_name}"),
        })
    }

    /// Maps a public path back onto the upload directory. Only the final
    /// component is honoured, so a stored path can never escape the directory.
    pub fn disk_path(&self, public_path: &str) -> Option<PathBuf> {
        let name = Path::new(public_path).file_name()?;
        Some(self.base_path.join(name))
    }

    pub async fn remove(&self, public_path: &str) -> Result<()> {
        let Some(path) = self.disk_path(public_path) else {
            return Ok(());
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!(
                "Failed to delete {}: {e}",
                path.display()
            ))),
        }
    }

    /// Removes every path, logging failures instead of returning them.
    pub async fn remove_all(&self, public_paths: &[String]) {
        for path in public_paths {
            if let Err(e) = self.remove(path).await {
                tracing::warn!("Upload cleanup failed: {e}");
            }
        }
    }
}

fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 16 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// A file field accepted by a form and how many files it may carry.
#[derive(Debug, Clone, Copy)]
pub struct FileField {
    pub name: &'static str,
    pub max_count: usize,
}

/// A multipart form whose files have already been written to disk.
///
/// Files are stored as they stream in; callers that reject the form after
/// collection must call [`UploadedForm::discard`].
#[derive(Debug, Default)]
pub struct UploadedForm {
    fields: HashMap<String, String>,
    files: HashMap<&'static str, Vec<StoredFile>>,
}

impl UploadedForm {
    pub async fn collect(
        mut multipart: Multipart,
        store: &UploadStore,
        accepted: &[FileField],
    ) -> Result<Self> {
        let mut form = UploadedForm::default();
        match form.read_fields(&mut multipart, store, accepted).await {
            Ok(()) => Ok(form),
            Err(e) => {
                form.discard(store).await;
                Err(e)
            }
        }
    }

    async fn read_fields(
        &mut self,
        multipart: &mut Multipart,
        store: &UploadStore,
        accepted: &[FileField],
    ) -> Result<()> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            let Some(file_name) = field.file_name().map(str::to_string) else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read field {name}: {e}")))?;
                self.fields.insert(name, value);
                continue;
            };

            let Some(rule) = accepted.iter().find(|f| f.name == name) else {
                return Err(AppError::Validation(format!("Unexpected file field: {name}")));
            };

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file {file_name}: {e}")))?;

            // Browsers send an empty part when no file was picked
            if file_name.is_empty() && data.is_empty() {
                continue;
            }

            if data.len() > MAX_FILE_BYTES {
                return Err(AppError::Validation(
                    "File size cannot exceed 5MB".to_string(),
                ));
            }

            let slot = self.files.entry(rule.name).or_default();
            if slot.len() >= rule.max_count {
                return Err(AppError::Validation(format!(
                    "At most {} file(s) can be uploaded for {}",
                    rule.max_count, rule.name
                )));
            }

            slot.push(store.save(&file_name, &data).await?);
        }

        Ok(())
    }

    /// Trimmed text value as submitted, including an empty string.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim())
    }

    /// Trimmed text value; empty strings count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn files(&self, name: &str) -> &[StoredFile] {
        self.files.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn single_file(&self, name: &str) -> Option<&StoredFile> {
        self.files(name).first()
    }

    pub fn stored_paths(&self) -> impl Iterator<Item = &str> {
        self.files.values().flatten().map(|f| f.path.as_str())
    }

    /// Deletes every file written while collecting the form.
    pub async fn discard(&self, store: &UploadStore) {
        let paths: Vec<String> = self.stored_paths().map(str::to_string).collect();
        store.remove_all(&paths).await;
    }
}
