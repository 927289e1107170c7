//! External resources
//!
//! Serves files from a directory on the local filesystem.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::provider::{is_missing, ByteStream, ResourceProvider};
use crate::logger;

/// Provider backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct ExternalProvider;

impl ExternalProvider {
    pub const fn new() -> Self {
        Self
    }
}

/// Canonicalize, mapping "does not exist" to `None`
fn canonicalize(path: &Path) -> io::Result<Option<PathBuf>> {
    match path.canonicalize() {
        Ok(p) => Ok(Some(p)),
        Err(e) if is_missing(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ResourceProvider for ExternalProvider {
    fn locate(&self, base_path: &str, relative_path: &str) -> io::Result<Option<String>> {
        let Some(base) = canonicalize(Path::new(base_path))? else {
            return Ok(None);
        };
        let Some(target) = canonicalize(&Path::new(base_path).join(relative_path))? else {
            return Ok(None);
        };

        // Symlinks may still point outside the root after normalization
        if !target.starts_with(&base) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {relative_path} -> {}",
                target.display()
            ));
            return Ok(None);
        }

        // FIFOs, sockets and devices could block the reader forever
        let file_type = match std::fs::metadata(&target) {
            Ok(meta) => meta.file_type(),
            Err(e) if is_missing(&e) => return Ok(None),
            Err(e) => return Err(e),
        };
        if !file_type.is_file() && !file_type.is_dir() {
            tracing::debug!(path = %target.display(), "skipping non-regular file");
            return Ok(None);
        }
        Ok(Some(target.to_string_lossy().into_owned()))
    }

    fn is_directory(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    async fn open_stream(&self, path: &str) -> io::Result<ByteStream> {
        let file = tokio::fs::File::open(path).await?;
        if !file.metadata().await?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{path}' is not a regular file"),
            ));
        }
        Ok(Box::pin(file))
    }

    fn size(&self, path: &str) -> Option<u64> {
        std::fs::metadata(path)
            .ok()
            .filter(std::fs::Metadata::is_file)
            .map(|meta| meta.len())
    }

    fn join(&self, base_path: &str, relative_path: &str) -> String {
        if relative_path.is_empty() {
            return base_path.to_string();
        }
        Path::new(base_path)
            .join(relative_path)
            .to_string_lossy()
            .into_owned()
    }
}
