//! Resource roots, handlers and resolved resources
//!
//! A `ResourceHandler` owns one configured root and maps request paths to
//! candidate `Resource`s below it. Handlers come in two kinds:
//! - `Packaged`: files bundled into the binary
//! - `External`: files in a filesystem directory

mod external;
mod packaged;
mod provider;

pub use external::ExternalProvider;
pub use packaged::PackagedProvider;
pub use provider::{ByteStream, ResourceProvider};

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, StaticFilesError};

pub const DEFAULT_WELCOME_FILE: &str = "index.html";

/// Where a resource root lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Packaged,
    External,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packaged => f.write_str("packaged"),
            Self::External => f.write_str("external"),
        }
    }
}

/// A configured base location for static lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRoot {
    pub base_path: String,
    pub welcome_file: String,
    pub kind: ResourceKind,
}

impl ResourceRoot {
    pub fn new(kind: ResourceKind, base_path: &str, welcome_file: &str) -> Self {
        Self {
            base_path: base_path.to_string(),
            welcome_file: welcome_file.to_string(),
            kind,
        }
    }
}

/// Handler for one configured root
#[derive(Debug, Clone)]
pub enum ResourceHandler {
    Packaged {
        root: ResourceRoot,
        provider: Arc<dyn ResourceProvider>,
    },
    External {
        root: ResourceRoot,
        provider: Arc<dyn ResourceProvider>,
    },
}

impl ResourceHandler {
    pub fn new(root: ResourceRoot, provider: Arc<dyn ResourceProvider>) -> Self {
        match root.kind {
            ResourceKind::Packaged => Self::Packaged { root, provider },
            ResourceKind::External => Self::External { root, provider },
        }
    }

    pub const fn root(&self) -> &ResourceRoot {
        match self {
            Self::Packaged { root, .. } | Self::External { root, .. } => root,
        }
    }

    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Packaged { .. } => ResourceKind::Packaged,
            Self::External { .. } => ResourceKind::External,
        }
    }

    fn provider(&self) -> &Arc<dyn ResourceProvider> {
        match self {
            Self::Packaged { provider, .. } | Self::External { provider, .. } => provider,
        }
    }

    /// Map a request path to a candidate below this root.
    ///
    /// Returns `None` when the path cannot be decoded or escapes the root.
    /// The candidate is not checked for readability here.
    pub fn get_resource(&self, request_path: &str) -> Option<Resource> {
        let mut relative = normalize_request_path(request_path)?;
        let root = self.root();
        let provider = self.provider();

        let denotes_directory = relative.is_empty()
            || request_path.ends_with('/')
            || provider.is_directory(&provider.join(&root.base_path, &relative));
        if denotes_directory {
            relative = if relative.is_empty() {
                root.welcome_file.clone()
            } else {
                format!("{relative}/{}", root.welcome_file)
            };
        }

        let location = provider.join(&root.base_path, &relative);
        Some(Resource {
            kind: self.kind(),
            base_path: root.base_path.clone(),
            relative_path: relative,
            location,
            provider: Arc::clone(provider),
        })
    }
}

/// A located candidate file, produced per resolution attempt
#[derive(Debug)]
pub struct Resource {
    kind: ResourceKind,
    base_path: String,
    relative_path: String,
    location: String,
    provider: Arc<dyn ResourceProvider>,
}

impl Resource {
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Path of the file relative to its root
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Provider path of the file (asset key or filesystem path)
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Whether the candidate exists below its root and is a regular file
    pub fn is_readable(&self) -> Result<bool> {
        Ok(self.readable_location()?.is_some())
    }

    /// Keep the candidate only if it is readable.
    ///
    /// The returned resource points at the location the provider verified,
    /// so opening it cannot follow a path that was swapped after the check.
    pub fn into_readable(self) -> Result<Option<Self>> {
        Ok(self
            .readable_location()?
            .map(|location| Self { location, ..self }))
    }

    fn readable_location(&self) -> Result<Option<String>> {
        let located = self
            .provider
            .locate(&self.base_path, &self.relative_path)
            .map_err(|source| StaticFilesError::Io {
                path: self.location.clone(),
                source,
            })?;
        Ok(located.filter(|location| !self.provider.is_directory(location)))
    }

    /// Length in bytes, when the provider knows it without reading
    pub fn size(&self) -> Option<u64> {
        self.provider.size(&self.location)
    }

    pub async fn open_stream(&self) -> Result<ByteStream> {
        self.provider
            .open_stream(&self.location)
            .await
            .map_err(|source| StaticFilesError::Streaming {
                path: self.location.clone(),
                source,
            })
    }
}

/// Decode and normalize a request path into a root-relative path.
///
/// `.` segments and empty segments are dropped, `..` removes the previous
/// segment. Returns `None` if the path climbs above the root, is not valid
/// UTF-8 after decoding, or contains NUL or backslash characters.
pub fn normalize_request_path(request_path: &str) -> Option<String> {
    let decoded = urlencoding::decode(request_path).ok()?;
    if decoded.contains(['\0', '\\']) {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }
    Some(segments.join("/"))
}
