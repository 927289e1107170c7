//! Resource provider capability
//!
//! Abstracts the storage behind a resource root so the resolution logic can
//! treat bundled assets and filesystem directories the same way.

use std::fmt;
use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Byte stream of an opened resource. Dropping it releases the underlying handle.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Storage backend for one kind of resource root
#[async_trait]
pub trait ResourceProvider: Send + Sync + fmt::Debug {
    /// Provider path of `relative_path` below `base_path`.
    ///
    /// `Some` only for regular files and directories that stay inside
    /// `base_path`. A missing entry is `Ok(None)`; only unexpected failures
    /// are errors. The returned path is the one to open.
    fn locate(&self, base_path: &str, relative_path: &str) -> io::Result<Option<String>>;

    /// Whether `relative_path` exists below `base_path`
    fn exists(&self, base_path: &str, relative_path: &str) -> io::Result<bool> {
        Ok(self.locate(base_path, relative_path)?.is_some())
    }

    /// Whether `path` denotes a directory
    fn is_directory(&self, path: &str) -> bool;

    /// Open a byte stream for the file at `path`
    async fn open_stream(&self, path: &str) -> io::Result<ByteStream>;

    /// Length in bytes of the file at `path`, when cheaply known
    fn size(&self, _path: &str) -> Option<u64> {
        None
    }

    /// Join a base path and a normalized relative path into a provider path
    fn join(&self, base_path: &str, relative_path: &str) -> String {
        let base = base_path.trim_end_matches('/');
        if relative_path.is_empty() {
            base.to_string()
        } else if base.is_empty() {
            relative_path.to_string()
        } else {
            format!("{base}/{relative_path}")
        }
    }
}

/// Whether an I/O error just means "nothing there"
pub(crate) fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
