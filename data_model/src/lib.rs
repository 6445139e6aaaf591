use std::{collections::HashMap, fs::File, io::Read, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Platform label used by the build tooling for Apple desktop builds.
pub const DARWIN_OS: &str = "darwin";
/// Label shown to users in place of [`DARWIN_OS`].
pub const MACOS_OS: &str = "macOS";

/// Descriptor of one downloadable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Logical file name, without the compression suffix.
    pub name: String,
    pub mime: String,
    /// Size in bytes before compression.
    pub size: u64,
    /// Operating system the file targets.
    pub os: String,
}

impl FileMetadata {
    fn normalize(mut self) -> Self {
        if self.os == DARWIN_OS {
            self.os = MACOS_OS.to_string();
        }
        self
    }
}

/// Read-only index of the downloadable files, keyed by logical name.
///
/// Built once from a JSON array of [`FileMetadata`]. There is no way to
/// mutate a registry after it has been built; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: HashMap<String, FileMetadata>,
}

impl FileRegistry {
    /// Decodes the whole descriptor list. A malformed document fails the
    /// load as a whole. Duplicate names are resolved last-wins.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let file_list: Vec<FileMetadata> =
            serde_json::from_reader(reader).context("malformed file metadata document")?;

        let mut files = HashMap::with_capacity(file_list.len());
        for metadata in file_list {
            let metadata = metadata.normalize();
            if let Some(previous) = files.insert(metadata.name.clone(), metadata) {
                debug!(
                    name = %previous.name,
                    "duplicate file metadata entry, keeping the last one"
                );
            }
        }
        Ok(Self { files })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("can't open file metadata: {}", path.display()))?;
        Self::from_reader(file)
    }

    pub fn get(&self, name: &str) -> Option<&FileMetadata> {
        self.files.get(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All descriptors ordered by name.
    pub fn iter_sorted(&self) -> Vec<&FileMetadata> {
        let mut files: Vec<&FileMetadata> = self.files.values().collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files
    }
}
