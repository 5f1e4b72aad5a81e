use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing::warn;

use crate::error::AppError;

/// One JSON document on disk.
///
/// Saves go to a sibling temp file that is flushed and then renamed over the
/// target, so a crash mid-write leaves either the old or the new document.
#[derive(Debug, Clone)]
pub struct JsonDocument<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonDocument<T> {
    pub fn new(path: PathBuf) -> Self {
        JsonDocument {
            path,
            _marker: PhantomData,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// `None` when the document is missing or unreadable as JSON; a corrupt
    /// document is treated like an absent one.
    pub fn load(&self) -> Result<Option<T>, AppError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Io(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str(&content) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unparseable document");
                Ok(None)
            }
        }
    }

    pub fn save(&self, data: &T) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(data)
            .map_err(|e| AppError::JsonError(format!("Failed to serialize document: {}", e)))?;

        let temp_path = self.temp_path();
        let write_temp = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()
        };
        if let Err(e) = write_temp() {
            let _ = fs::remove_file(&temp_path);
            return Err(AppError::Io(format!(
                "Failed to write {}: {}",
                temp_path.display(),
                e
            )));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            AppError::Io(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }

    pub fn remove(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
