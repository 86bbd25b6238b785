//! HTTP surface: middleware chain, route table and error normalization

pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod response;
pub mod routes;
pub mod server;

pub use error::{ApiError, ErrorKind};
pub use response::ServiceResponse;
pub use server::{build_app, start_web_server};
