//! Static resource registry
//!
//! Holds the ordered list of resource handlers. Roots are registered once
//! during startup; afterwards the registry is shared read-only across
//! request tasks.

use std::sync::Arc;

use crate::config::StaticFilesConfig;
use crate::error::{Result, StaticFilesError};
use crate::logger;
use crate::resource::{
    ExternalProvider, PackagedProvider, Resource, ResourceHandler, ResourceKind,
    ResourceProvider, ResourceRoot, DEFAULT_WELCOME_FILE,
};

/// What a configuration call did
#[derive(Debug)]
pub enum ConfigureOutcome {
    /// A new handler was appended
    Registered,
    /// This kind of root was configured before; the call was ignored
    AlreadyConfigured,
    /// The folder is not a usable directory; the registry is unchanged
    Rejected(StaticFilesError),
}

impl ConfigureOutcome {
    pub const fn is_registered(&self) -> bool {
        matches!(self, Self::Registered)
    }
}

#[derive(Debug)]
pub struct StaticResourceRegistry {
    handlers: Vec<ResourceHandler>,
    packaged_configured: bool,
    external_configured: bool,
    packaged_provider: Arc<dyn ResourceProvider>,
    external_provider: Arc<dyn ResourceProvider>,
    welcome_file: String,
}

impl Default for StaticResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticResourceRegistry {
    /// Registry using the bundled assets and the local filesystem
    pub fn new() -> Self {
        Self::with_providers(
            Arc::new(PackagedProvider::new()),
            Arc::new(ExternalProvider::new()),
        )
    }

    pub fn with_providers(
        packaged: Arc<dyn ResourceProvider>,
        external: Arc<dyn ResourceProvider>,
    ) -> Self {
        Self {
            handlers: Vec::new(),
            packaged_configured: false,
            external_configured: false,
            packaged_provider: packaged,
            external_provider: external,
            welcome_file: DEFAULT_WELCOME_FILE.to_string(),
        }
    }

    /// Welcome file for roots registered after this call
    #[must_use]
    pub fn with_welcome_file(mut self, welcome_file: &str) -> Self {
        if !welcome_file.trim().is_empty() {
            self.welcome_file = welcome_file.to_string();
        }
        self
    }

    /// Register a folder of the bundled asset tree. Only the first call has effect.
    pub fn configure_packaged_root(&mut self, folder: &str) -> Result<ConfigureOutcome> {
        self.configure(ResourceKind::Packaged, folder)
    }

    /// Register a filesystem directory. Only the first call has effect.
    pub fn configure_external_root(&mut self, folder: &str) -> Result<ConfigureOutcome> {
        self.configure(ResourceKind::External, folder)
    }

    /// Apply the roots named in configuration, packaged first
    pub fn configure_from(&mut self, config: &StaticFilesConfig) -> Result<()> {
        if let Some(folder) = config.packaged_root.as_deref() {
            self.configure_packaged_root(folder)?;
        }
        if let Some(folder) = config.external_root.as_deref() {
            self.configure_external_root(folder)?;
        }
        Ok(())
    }

    fn configure(&mut self, kind: ResourceKind, folder: &str) -> Result<ConfigureOutcome> {
        if folder.trim().is_empty() {
            return Err(StaticFilesError::InvalidArgument { name: "folder" });
        }

        if self.is_configured(kind) {
            logger::log_root_ignored(kind, folder);
            return Ok(ConfigureOutcome::AlreadyConfigured);
        }

        let provider = match kind {
            ResourceKind::Packaged => &self.packaged_provider,
            ResourceKind::External => &self.external_provider,
        };
        if !provider.is_directory(folder) {
            let err = StaticFilesError::Configuration {
                kind,
                folder: folder.to_string(),
            };
            logger::log_error(&err.to_string());
            return Ok(ConfigureOutcome::Rejected(err));
        }

        let root = ResourceRoot::new(kind, folder, &self.welcome_file);
        self.handlers
            .push(ResourceHandler::new(root, Arc::clone(provider)));
        match kind {
            ResourceKind::Packaged => self.packaged_configured = true,
            ResourceKind::External => self.external_configured = true,
        }
        logger::log_root_configured(kind, folder);
        Ok(ConfigureOutcome::Registered)
    }

    const fn is_configured(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Packaged => self.packaged_configured,
            ResourceKind::External => self.external_configured,
        }
    }

    pub const fn is_packaged_configured(&self) -> bool {
        self.packaged_configured
    }

    pub const fn is_external_configured(&self) -> bool {
        self.external_configured
    }

    /// Handlers in priority order
    pub fn handlers(&self) -> &[ResourceHandler] {
        &self.handlers
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Find the first readable resource for `request_path`.
    ///
    /// Handlers are consulted in registration order and the first readable
    /// candidate wins.
    pub fn resolve(&self, request_path: &str) -> Result<Option<Resource>> {
        for handler in &self.handlers {
            let Some(resource) = handler.get_resource(request_path) else {
                continue;
            };
            if let Some(resource) = resource.into_readable()? {
                return Ok(Some(resource));
            }
        }
        Ok(None)
    }
}
