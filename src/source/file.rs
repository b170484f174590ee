use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::ByteSource;

/// A file on local disk.
///
/// Every `read_range` opens its own handle so reads from one window can run
/// concurrently without sharing a cursor.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    size: u64,
}

impl FileSource {
    /// Open `path` and capture its current size.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        Ok(Self {
            path,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used as the remote file name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

#[async_trait]
impl ByteSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    async fn read_range(&self, offset: u64, len: usize) -> std::io::Result<Bytes> {
        let available = self.size.saturating_sub(offset);
        let to_read = (len as u64).min(available) as usize;
        if to_read == 0 {
            return Ok(Bytes::new());
        }

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut buf = BytesMut::zeroed(to_read);
        file.read_exact(&mut buf).await?;
        Ok(buf.freeze())
    }
}
