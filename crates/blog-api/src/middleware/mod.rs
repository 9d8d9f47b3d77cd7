//! HTTP middleware
//!
//! Author: hephaex@gmail.com

pub mod errors;
pub mod security_headers;

pub use errors::render_errors;
pub use security_headers::security_headers_middleware;
