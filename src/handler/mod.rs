//! Request handler module
//!
//! Request dispatch: static resources first, then health checks, then 404.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
