//! The filesystem blob store.

use crate::error::{StorageError, StorageResult};
use bytes::Bytes;
use futures::Stream;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// Chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// A streaming byte source for downloads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Filesystem-backed blob storage rooted at a single directory.
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a new blob store, creating the root directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Resolve the path for a blob, rejecting traversal in either component.
    pub fn path(&self, id_hex: &str, filename: &str) -> StorageResult<PathBuf> {
        validate_component(id_hex)?;
        validate_component(filename)?;
        Ok(self.root.join(id_hex).join(filename))
    }

    /// Begin a streaming write of `filename` under the token's directory.
    ///
    /// The per-token directory is created if absent (idempotent). Bytes go
    /// to a uniquely named temp file; `finish` fsyncs and renames it over
    /// the final path, overwriting any prior content. A writer that never
    /// finishes leaves no final file behind; there is no partial commit.
    pub async fn writer(&self, id_hex: &str, filename: &str) -> StorageResult<BlobWriter> {
        let path = self.path(id_hex, filename)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_file_name(format!("{filename}.tmp.{}", Uuid::new_v4()));
        let file = fs::File::create(&temp_path).await?;

        Ok(BlobWriter {
            file,
            temp_path,
            final_path: path,
            bytes_written: 0,
        })
    }

    /// One-shot write of a complete buffer.
    pub async fn write(&self, id_hex: &str, filename: &str, data: Bytes) -> StorageResult<u64> {
        let mut writer = self.writer(id_hex, filename).await?;
        if let Err(e) = writer.write(data).await {
            writer.abort().await;
            return Err(e);
        }
        writer.finish().await
    }

    /// Open a blob for streaming, chunked reads.
    pub async fn read(&self, id_hex: &str, filename: &str) -> StorageResult<ByteStream> {
        let path = self.path(id_hex, filename)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(format!("{id_hex}/{filename}"))
            } else {
                StorageError::Io(e)
            }
        })?;
        tracing::debug!(path = %path.display(), "blob opened for read");

        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Reject empty names and anything that is not a single normal path
/// component, so neither the id nor the filename can escape the root.
fn validate_component(s: &str) -> StorageResult<()> {
    if s.is_empty() {
        return Err(StorageError::InvalidKey("empty path component".to_string()));
    }

    let mut components = Path::new(s).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StorageError::InvalidKey(format!(
            "unsafe path component: {s:?}"
        ))),
    }
}

/// In-progress streaming write of one blob.
pub struct BlobWriter {
    file: fs::File,
    temp_path: PathBuf,
    final_path: PathBuf,
    bytes_written: u64,
}

impl BlobWriter {
    /// Append a chunk to the temp file.
    pub async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        self.file.write_all(&data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Flush to disk and move the temp file over the final path.
    pub async fn finish(self) -> StorageResult<u64> {
        self.file.sync_all().await?;
        drop(self.file);
        fs::rename(&self.temp_path, &self.final_path).await?;
        tracing::debug!(
            path = %self.final_path.display(),
            bytes = self.bytes_written,
            "blob committed"
        );
        Ok(self.bytes_written)
    }

    /// Discard the write, removing the temp file. Best effort.
    pub async fn abort(self) {
        drop(self.file);
        let _ = fs::remove_file(&self.temp_path).await;
    }
}
