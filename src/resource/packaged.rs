//! Packaged resources
//!
//! Serves files from the `assets/` tree bundled into the binary. A packaged
//! root names a folder inside that tree, e.g. `public`.

use std::borrow::Cow;
use std::io::{self, Cursor};

use async_trait::async_trait;
use rust_embed::RustEmbed;

use super::provider::{ByteStream, ResourceProvider};

#[derive(RustEmbed)]
#[folder = "assets/"]
struct PackagedAssets;

/// Provider backed by the bundled asset tree
#[derive(Debug, Default, Clone, Copy)]
pub struct PackagedProvider;

impl PackagedProvider {
    pub const fn new() -> Self {
        Self
    }

    /// Names of every bundled file, relative to the asset tree root
    pub fn files() -> impl Iterator<Item = Cow<'static, str>> {
        PackagedAssets::iter()
    }
}

/// Asset keys never carry leading or trailing slashes
fn asset_key(path: &str) -> &str {
    path.trim_matches('/')
}

#[async_trait]
impl ResourceProvider for PackagedProvider {
    fn locate(&self, base_path: &str, relative_path: &str) -> io::Result<Option<String>> {
        let path = self.join(base_path, relative_path);
        let found = PackagedAssets::get(asset_key(&path)).is_some() || self.is_directory(&path);
        Ok(found.then_some(path))
    }

    fn is_directory(&self, path: &str) -> bool {
        let key = asset_key(path);
        if key.is_empty() {
            return PackagedAssets::iter().next().is_some();
        }
        let prefix = format!("{key}/");
        PackagedAssets::iter().any(|file| file.starts_with(&prefix))
    }

    async fn open_stream(&self, path: &str) -> io::Result<ByteStream> {
        let file = PackagedAssets::get(asset_key(path)).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no packaged resource at '{path}'"),
            )
        })?;
        Ok(Box::pin(Cursor::new(file.data)))
    }

    fn size(&self, path: &str) -> Option<u64> {
        PackagedAssets::get(asset_key(path)).and_then(|file| u64::try_from(file.data.len()).ok())
    }

    fn join(&self, base_path: &str, relative_path: &str) -> String {
        let base = asset_key(base_path);
        match (base.is_empty(), relative_path.is_empty()) {
            (true, _) => relative_path.to_string(),
            (false, true) => base.to_string(),
            (false, false) => format!("{base}/{relative_path}"),
        }
    }
}
