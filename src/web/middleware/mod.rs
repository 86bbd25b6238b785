//! Cross-cutting request interceptors. Installed in a fixed order by
//! [`crate::web::pipeline`].

pub mod cors;
pub mod rate_limit;
pub mod request_log;
pub mod security;

pub use cors::cors_layer;
pub use rate_limit::rate_limit;
pub use request_log::request_log;
pub use security::security_headers;
