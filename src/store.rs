//! Drawer document persistence
//!
//! One JSON file on disk, whole-document reads and writes. Loading never
//! fails: a missing or unparseable file yields a fresh default document so
//! the UI always has its 32 drawers.

use crate::drawer::{DocumentError, DrawerDocument};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

/// Default data file name, placed in the user's home directory
const DATA_FILE_NAME: &str = "electronics_storage_data.json";

/// Save failures surfaced to the HTTP layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Mentési hiba")]
    Io(#[from] std::io::Error),
    #[error("Mentési hiba")]
    Serialize(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(#[from] DocumentError),
}

/// JSON-file-backed drawer document store
#[derive(Debug, Clone)]
pub struct DrawerStore {
    path: PathBuf,
}

impl DrawerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/electronics_storage_data.json`, falling back to the
    /// current directory when no home is resolvable
    pub fn at_default_location() -> Self {
        let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join(DATA_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, falling back to the default 32 empty drawers on
    /// any read or parse failure
    pub async fn load(&self) -> DrawerDocument {
        match fs::read_to_string(&self.path).await {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(doc) => {
                    debug!("Loaded drawer data from {}", self.path.display());
                    doc
                }
                Err(e) => {
                    warn!(
                        "Drawer data file {} is unparseable, starting fresh: {}",
                        self.path.display(),
                        e
                    );
                    DrawerDocument::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No drawer data file yet at {}", self.path.display());
                DrawerDocument::default()
            }
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                DrawerDocument::default()
            }
        }
    }

    /// Validate and overwrite the document on disk
    pub async fn save(&self, doc: &DrawerDocument) -> Result<(), StoreError> {
        doc.validate()?;
        let json = serde_json::to_string_pretty(doc)?;
        fs::write(&self.path, json).await?;
        debug!("Saved drawer data to {}", self.path.display());
        Ok(())
    }
}
