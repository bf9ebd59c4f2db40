//! Wavess client - admin API client with transparent token refresh
//!
//! A typed client for the Wavess backend. Every call carries the stored
//! bearer token; an expired token is refreshed once and the call replayed,
//! so callers only see authentication errors that cannot be recovered.
//!
//! ## Features
//!
//! - Durable session storage (memory, JSON file, OS credential manager)
//! - One-shot refresh-and-retry on 401, with optional single-flight refresh
//! - Normalized results (`ApiResult`) or strict `Result`s, per call
//! - Bounded, redacted request log and an event bus for the UI layer
//! - Typed endpoint groups and a background health monitor
//!
//! ## Architecture
//!
//! - **Http**: transport, bearer injection, request log, envelope decoding
//! - **Auth**: token store, session lifecycle, the retry interceptor
//! - **Api**: endpoint groups over the request pipeline
//! - **Agents**: background polling
//! - **Security**: sanitizing tokens, URLs and payloads for logs
//!
//! ```no_run
//! use std::sync::Arc;
//! use wavess_client::storage::FileStore;
//! use wavess_client::{ClientConfig, WavessClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load();
//! let session_file = ClientConfig::config_dir()
//!     .ok_or("no config directory")?
//!     .join("session.json");
//! let store = Arc::new(FileStore::open(session_file)?);
//! let client = WavessClient::new(config, store)?;
//!
//! if client.login("admin", "secret").await.is_ok() {
//!     let stats = client.api().admin.stats().await;
//!     println!("{:?}", stats.data());
//! }
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod api;
pub mod auth;
mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod http;
mod preferences;
pub mod security;
pub mod storage;

#[cfg(test)]
mod testing;

pub use auth::{Credentials, LogoutOutcome, NavigationIntent, UserInfo};
pub use client::WavessClient;
pub use config::{ClientConfig, LogoutMode, RefreshCoordination, StorageKeys};
pub use error::{ClientError, ErrorCode, TransportError};
pub use events::{ClientEvent, LogoutReason};
pub use http::{ApiResult, Method, RequestLogEntry, RequestOptions};
pub use preferences::Preferences;

/// Installs a `tracing` subscriber for applications without their own
///
/// `RUST_LOG` takes precedence; `default_directive` (e.g.
/// `"wavess_client=debug"`) applies otherwise. Returns false if a
/// subscriber was already installed or the directive does not parse.
pub fn init_tracing(default_directive: &str) -> bool {
    let directive: tracing_subscriber::filter::Directive = match default_directive.parse() {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("Invalid log directive {:?}: {}", default_directive, e);
            return false;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive),
        )
        .try_init()
        .is_ok()
}
