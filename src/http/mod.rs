//! HTTP protocol layer module
//!
//! Response builders used by the host server, decoupled from resource
//! resolution.

pub mod response;

pub use response::{
    build_404_response, build_405_response, build_500_response, build_head_response,
    build_health_response, build_options_response, build_resource_response, HttpBody,
    HttpResponse,
};
