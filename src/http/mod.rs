//! HTTP layer - requests, transport, logging and envelope decoding
//!
//! Layers from the bottom up:
//!
//! - [`Transport`]: one request in, status and body out
//! - [`Dispatcher`]: bearer token injection and the [`RequestLog`]
//! - [`crate::auth::AuthInterceptor`]: refresh-and-retry on 401
//! - [`RequestPipeline`]: envelope decoding into [`ApiResult`]

pub mod envelope;
mod dispatcher;
mod log;
mod pipeline;
mod request;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use envelope::{ApiErrorBody, ApiResult};
pub use log::{RequestLog, RequestLogEntry};
pub use pipeline::RequestPipeline;
pub use request::{Method, PendingRequest, RequestOptions};
pub use transport::{HttpTransport, RawResponse, Transport};
