//! Static resource serving for an embedded HTTP server.
//!
//! Request paths are resolved against an ordered list of resource roots,
//! either folders bundled into the binary or directories on the local
//! filesystem. The first root holding a readable file wins and its bytes
//! become the response body.
//!
//! ```no_run
//! use std::sync::Arc;
//! use resource_server::{RequestStaticResourceConsumer, StaticResourceRegistry};
//!
//! # async fn demo() -> resource_server::error::Result<()> {
//! let mut registry = StaticResourceRegistry::new();
//! registry.configure_packaged_root("public")?;
//! registry.configure_external_root("/var/www/static")?;
//!
//! let consumer = RequestStaticResourceConsumer::new(Arc::new(registry));
//! let mut body = Vec::new();
//! if consumer.consume("/", &mut body).await? {
//!     // body now holds public/index.html
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod consumer;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod registry;
pub mod resource;
pub mod server;

pub use consumer::{OpenedResource, RequestStaticResourceConsumer};
pub use error::StaticFilesError;
pub use registry::{ConfigureOutcome, StaticResourceRegistry};
pub use resource::{Resource, ResourceHandler, ResourceKind, ResourceProvider, ResourceRoot};
