use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dictation_core::model::{Library, LibraryName};
use tempfile::NamedTempFile;

use crate::repository::{LibraryRepository, StorageError};

mod document;

pub use document::{LibraryDocument, WordEntry, decode_library, decode_words, encode_words};

const EXTENSION: &str = "json";

/// Library store keeping one `<name>.json` document per library under a root directory.
#[derive(Debug, Clone)]
pub struct JsonLibraryStore {
    root: PathBuf,
}

impl JsonLibraryStore {
    /// The root directory is created on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, name: &LibraryName) -> PathBuf {
        self.root.join(format!("{name}.{EXTENSION}"))
    }
}

fn io(e: impl std::fmt::Display) -> StorageError {
    StorageError::Io(e.to_string())
}

/// Replace `path` with `contents` through a temp file in the same directory.
///
/// # Errors
///
/// Returns `StorageError::Io` if the directory or file cannot be written.
pub async fn write_atomically(path: &Path, contents: String) -> Result<(), StorageError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(io)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io)?;
        tmp.write_all(contents.as_bytes()).map_err(io)?;
        tmp.as_file().sync_all().map_err(io)?;
        tmp.persist(&path).map_err(|e| io(e.error))?;
        Ok(())
    })
    .await
    .map_err(io)?
}

#[async_trait]
impl LibraryRepository for JsonLibraryStore {
    async fn list_libraries(&self) -> Result<Vec<LibraryName>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match LibraryName::new(stem) {
                Ok(name) => names.push(name),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping file"),
            }
        }
        names.sort();
        Ok(names)
    }

    async fn load_library(&self, name: &LibraryName) -> Result<Library, StorageError> {
        let path = self.path_for(name);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::LibraryNotFound(name.clone()));
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(StorageError::MalformedLibrary {
                    library: name.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(io(e)),
        };
        let library = decode_library(name, &text)?;
        tracing::debug!(library = %name, words = library.len(), "loaded library");
        Ok(library)
    }

    async fn save_library(&self, library: &Library) -> Result<(), StorageError> {
        let contents = encode_words(library.words())?;
        write_atomically(&self.path_for(library.name()), contents).await?;
        tracing::info!(library = %library.name(), words = library.len(), "saved library");
        Ok(())
    }

    async fn library_exists(&self, name: &LibraryName) -> Result<bool, StorageError> {
        tokio::fs::try_exists(self.path_for(name)).await.map_err(io)
    }
}
