use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use flate2::{write::GzEncoder, Compression};
use tracing::{error, info};

use crate::{ArtifactStore, GZIP_SUFFIX};

impl ArtifactStore {
    /// Compresses every plain file at the top level of the store into
    /// `<name>.gz` and removes the original. Existing `.gz` files and
    /// sub-directories are left alone.
    ///
    /// Returns the paths of the artifacts that were written.
    pub async fn compress_pending(&self) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || compress_dir(&root))
            .await
            .context("compression worker panicked")?
    }
}

fn compress_dir(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("can't read files directory: {}", root.display()))?;

    let mut pending = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let metadata = fs::metadata(&path)
            .with_context(|| format!("can't stat file: {}", path.display()))?;
        if !metadata.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(GZIP_SUFFIX) {
            continue;
        }
        pending.push(path);
    }
    pending.sort();

    let mut compressed = Vec::with_capacity(pending.len());
    for path in pending {
        let mut compressed_name = path.clone().into_os_string();
        compressed_name.push(GZIP_SUFFIX);
        let compressed_path = PathBuf::from(compressed_name);

        info!(
            file = %path.display(),
            compressed_file = %compressed_path.display(),
            "compressing file"
        );
        compress_file(&path, &compressed_path)?;

        info!(file = %path.display(), "removing the uncompressed file");
        if let Err(e) = fs::remove_file(&path) {
            error!(file = %path.display(), "failed to remove the uncompressed file: {}", e);
        }
        compressed.push(compressed_path);
    }

    Ok(compressed)
}

fn compress_file(src: &Path, dst: &Path) -> Result<()> {
    let input = File::open(src).with_context(|| format!("can't open file: {}", src.display()))?;
    let output =
        File::create(dst).with_context(|| format!("can't create file: {}", dst.display()))?;

    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    io::copy(&mut BufReader::new(input), &mut encoder)
        .with_context(|| format!("can't compress file: {}", src.display()))?;
    encoder
        .finish()
        .and_then(|mut writer| writer.flush())
        .with_context(|| format!("can't write file: {}", dst.display()))?;
    Ok(())
}
