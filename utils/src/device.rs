//! Persistent device identifier.
//!
//! One id per installation, generated on first use and reused for every
//! login afterwards.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pacer_types::DeviceId;
use thiserror::Error;
use uuid::Uuid;

use crate::atomic_write::atomic_write;

#[derive(Debug, Error)]
pub enum DeviceIdError {
    #[error("failed to read device id from {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write device id to {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to remove device id at {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
}

/// File-backed store for the [`DeviceId`].
#[derive(Debug, Clone)]
pub struct DeviceIdStore {
    path: PathBuf,
}

impl DeviceIdStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored id, generating and persisting a new one when the
    /// file is missing or blank.
    pub fn get_or_create(&self) -> Result<DeviceId, DeviceIdError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                if let Ok(id) = DeviceId::new(content) {
                    return Ok(id);
                }
                tracing::warn!(
                    path = %self.path.display(),
                    "Device id file is blank; regenerating"
                );
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(DeviceIdError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        }

        let id = generate_device_id();
        atomic_write(&self.path, id.as_str().as_bytes()).map_err(|source| {
            DeviceIdError::Write {
                path: self.path.clone(),
                source,
            }
        })?;
        tracing::debug!(path = %self.path.display(), "Generated new device id");
        Ok(id)
    }

    /// Deletes the stored id. A missing file is not an error.
    pub fn clear(&self) -> Result<(), DeviceIdError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(DeviceIdError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

fn generate_device_id() -> DeviceId {
    DeviceId::new(Uuid::new_v4().to_string())
        .unwrap_or_else(|_| unreachable!("uuid is never blank"))
}
