use std::{
    io,
    path::{Path, PathBuf},
};

use tokio::fs::File;
use tracing::debug;

mod compress;
mod disk;

pub use disk::{inflate_stream, raw_stream, ByteStream, CHUNK_SIZE};

/// Suffix carried by every artifact in the store.
pub const GZIP_SUFFIX: &str = ".gz";

/// What a name in the store resolves to.
///
/// This is the only place where the filesystem is asked whether something
/// is a file, so callers decide not-found vs. error from this value alone.
#[derive(Debug)]
pub enum ArtifactEntry {
    /// A regular file, already opened for reading.
    File {
        file: File,
        path: PathBuf,
        size: u64,
    },
    Directory,
    /// Absent, unreadable, not a regular file, or not a flat name.
    Missing,
}

impl ArtifactEntry {
    pub fn is_file(&self) -> bool {
        matches!(self, ArtifactEntry::File { .. })
    }
}

/// Flat directory holding one gzip file per logical name.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk path of the artifact backing `logical_name`.
    pub fn artifact_path(&self, logical_name: &str) -> PathBuf {
        self.root.join(format!("{}{}", logical_name, GZIP_SUFFIX))
    }

    /// Opens the artifact backing `logical_name`.
    pub async fn open_artifact(&self, logical_name: &str) -> ArtifactEntry {
        self.open(&format!("{}{}", logical_name, GZIP_SUFFIX)).await
    }

    /// Opens `file_name` directly inside the store root. The handle is
    /// classified with a stat on the opened descriptor, so the entry that was
    /// checked is the entry that gets read.
    pub async fn open(&self, file_name: &str) -> ArtifactEntry {
        if file_name.is_empty() || file_name.contains('/') {
            return ArtifactEntry::Missing;
        }

        let path = self.root.join(file_name);
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                log_open_error(&path, &e);
                return ArtifactEntry::Missing;
            }
        };
        let metadata = match file.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                log_open_error(&path, &e);
                return ArtifactEntry::Missing;
            }
        };

        if metadata.is_dir() {
            debug!(path = %path.display(), "artifact path is a directory");
            return ArtifactEntry::Directory;
        }
        if !metadata.is_file() {
            debug!(path = %path.display(), "artifact path is not a regular file");
            return ArtifactEntry::Missing;
        }

        ArtifactEntry::File {
            file,
            path,
            size: metadata.len(),
        }
    }
}

fn log_open_error(path: &Path, e: &io::Error) {
    if e.kind() == io::ErrorKind::NotFound {
        debug!(path = %path.display(), "artifact not found");
    } else {
        debug!(path = %path.display(), "can't open artifact: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_regular_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(temp_dir.path().join("a.txt.gz"), b"gzip bytes")
            .await
            .unwrap();
        let store = ArtifactStore::new(temp_dir.path());

        match store.open_artifact("a.txt").await {
            ArtifactEntry::File { path, size, .. } => {
                assert_eq!(path, temp_dir.path().join("a.txt.gz"));
                assert_eq!(size, 10);
            }
            other => panic!("expected a file, got {:?}", other),
        }
        assert!(store.open("a.txt.gz").await.is_file());
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(temp_dir.path());

        assert!(matches!(
            store.open_artifact("nope").await,
            ArtifactEntry::Missing
        ));
        assert!(matches!(store.open("").await, ArtifactEntry::Missing));
    }

    #[tokio::test]
    async fn test_open_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(temp_dir.path().join("dir.gz"))
            .await
            .unwrap();
        let store = ArtifactStore::new(temp_dir.path());

        assert!(matches!(
            store.open_artifact("dir").await,
            ArtifactEntry::Directory
        ));
        assert!(matches!(store.open("dir.gz").await, ArtifactEntry::Directory));
    }

    #[tokio::test]
    async fn test_open_rejects_nested_names() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sub_dir = temp_dir.path().join("sub");
        tokio::fs::create_dir(&sub_dir).await.unwrap();
        tokio::fs::write(sub_dir.join("a.txt.gz"), b"gzip bytes")
            .await
            .unwrap();
        let store = ArtifactStore::new(temp_dir.path());

        assert!(matches!(
            store.open("sub/a.txt.gz").await,
            ArtifactEntry::Missing
        ));
        assert!(matches!(
            store.open_artifact("sub/a.txt").await,
            ArtifactEntry::Missing
        ));
    }

    #[test]
    fn test_artifact_path() {
        let store = ArtifactStore::new("/srv/files");
        assert_eq!(
            store.artifact_path("cli.tar"),
            PathBuf::from("/srv/files/cli.tar.gz")
        );
        assert_eq!(store.root(), Path::new("/srv/files"));
    }
}
