use std::{
    future::Future,
    io,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use tokio::{
    fs::{self, File, OpenOptions},
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("survey log io failed: {0}")]
    Io(#[from] io::Error),

    #[error("survey record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Byte sink behind the survey log. Besides writing it must report its
/// committed size, cut back to a size, and make written bytes durable.
pub trait LogSink: AsyncWrite + Unpin + Send {
    fn size(&self) -> impl Future<Output = io::Result<u64>> + Send;
    fn truncate(&self, len: u64) -> impl Future<Output = io::Result<()>> + Send;
    fn sync(&self) -> impl Future<Output = io::Result<()>> + Send;
}

impl LogSink for File {
    async fn size(&self) -> io::Result<u64> {
        Ok(self.metadata().await?.len())
    }

    async fn truncate(&self, len: u64) -> io::Result<()> {
        self.set_len(len).await
    }

    async fn sync(&self) -> io::Result<()> {
        self.sync_data().await
    }
}

struct Inner<S> {
    sink: S,
    /// Set when a failed write could not be rolled back: the length the log
    /// must be cut to before anything else is appended.
    torn_at: Option<u64>,
}

/// Line-delimited JSON sink. Appends are serialized through one handle,
/// so concurrent writers never interleave bytes of two records.
pub struct AppendStore<S = File> {
    path: PathBuf,
    inner: Mutex<Inner<S>>,
}

impl AppendStore<File> {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self::with_sink(path, file))
    }
}

impl<S: LogSink> AppendStore<S> {
    pub fn with_sink(path: PathBuf, sink: S) -> Self {
        Self {
            path,
            inner: Mutex::new(Inner {
                sink,
                torn_at: None,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `record` as one line and syncs it before returning.
    pub async fn append(&self, record: &Map<String, Value>) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut inner = self.inner.lock().await;

        // A partial line is still on disk; nothing may be appended after it.
        if let Some(len) = inner.torn_at {
            inner.sink.truncate(len).await?;
            tracing::warn!(path = %self.path.display(), len, "survey log torn tail removed");
            inner.torn_at = None;
        }

        let committed_len = inner.sink.size().await?;
        if let Err(err) = write_line(&mut inner.sink, &line).await {
            if let Err(rollback) = inner.sink.truncate(committed_len).await {
                tracing::error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "survey log rollback failed"
                );
                inner.torn_at = Some(committed_len);
            }
            return Err(err.into());
        }

        Ok(())
    }
}

async fn write_line<S: LogSink>(sink: &mut S, line: &[u8]) -> io::Result<()> {
    sink.write_all(line).await?;
    sink.flush().await?;
    sink.sync().await
}
