//! Saves downloaded files into the configured export directory.

use async_trait::async_trait;
use resource_sync::{Download, DownloadSink};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// [`DownloadSink`] writing into one directory. Existing files are never overwritten;
/// a second `invoices-20261017.csv` becomes `invoices-20261017-1.csv`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, download: Download) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let stem = sanitize(&download.file_stem);
        let extension = download.extension();
        let mut attempt = 0u32;
        loop {
            let name = match attempt {
                0 => format!("{stem}.{extension}"),
                n => format!("{stem}-{n}.{extension}"),
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => {
                    fill(file, &path, &download.bytes).await?;
                    debug!(path = %path.display(), bytes = download.bytes.len(), "File written");
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Writes `bytes` into the file just created at `path`. On failure the partial file is
/// removed.
async fn fill<W: AsyncWrite + Unpin>(mut file: W, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "Partial file not removed");
        }
        return Err(e);
    }
    Ok(())
}

/// Keeps a server-chosen stem from escaping the directory.
fn sanitize(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Accepts nothing; every write fails as a full disk would.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn csv(stem: &str) -> Download {
        Download {
            file_stem: stem.to_string(),
            content_type: "text/csv".to_string(),
            bytes: b"id,name\n1,Acme\n".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_saves_with_extension_from_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("exports"));

        let path = sink.save(csv("tenants-20261017")).await.unwrap();

        assert_eq!(path, dir.path().join("exports").join("tenants-20261017.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"id,name\n1,Acme\n");
    }

    #[tokio::test]
    async fn test_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        let first = sink.save(csv("report")).await.unwrap();
        let second = sink.save(csv("report")).await.unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("report-1.csv"));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tenants-20261017.csv");
        std::fs::write(&path, b"id,na").unwrap();

        let error = fill(FullDisk, &path, b"id,name\n1,Acme\n").await.unwrap_err();

        assert_eq!(error.to_string(), "no space left on device");
        assert!(!path.exists());
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize(".."), "download");
        assert_eq!(sanitize("invoice-42"), "invoice-42");
    }
}
