//! Shared fixtures for unit tests

use std::sync::Arc;

use crate::auth::{AuthInterceptor, SessionLifecycle, TokenStore};
use crate::config::{ClientConfig, StorageKeys};
use crate::events::EventBus;
use crate::http::transport::MockTransport;
use crate::http::{Dispatcher, RequestLog, RequestPipeline};
use crate::storage::MemoryStore;

/// A dispatcher over `transport` with an empty in-memory session
pub(crate) fn dispatcher_with(transport: MockTransport) -> Arc<Dispatcher> {
    let tokens = TokenStore::new(Arc::new(MemoryStore::new()), StorageKeys::default());
    Arc::new(Dispatcher::new(
        Arc::new(transport),
        tokens,
        Arc::new(RequestLog::new()),
        Arc::new(EventBus::new()),
    ))
}

pub(crate) fn session_with(transport: MockTransport, config: ClientConfig) -> SessionLifecycle {
    SessionLifecycle::new(dispatcher_with(transport), Arc::new(config))
}

pub(crate) fn interceptor_with(transport: MockTransport, config: ClientConfig) -> AuthInterceptor {
    interceptor_over(dispatcher_with(transport), config)
}

fn interceptor_over(dispatcher: Arc<Dispatcher>, config: ClientConfig) -> AuthInterceptor {
    let config = Arc::new(config);
    let session = Arc::new(SessionLifecycle::new(dispatcher.clone(), config.clone()));
    AuthInterceptor::new(dispatcher, session, config)
}

/// A pipeline over `transport` along with its request log
pub(crate) fn logged_pipeline_with(transport: MockTransport) -> (RequestPipeline, Arc<RequestLog>) {
    let dispatcher = dispatcher_with(transport);
    let log = dispatcher.log().clone();
    let interceptor = interceptor_over(dispatcher, ClientConfig::default());
    (RequestPipeline::new(Arc::new(interceptor)), log)
}

pub(crate) fn pipeline_with(transport: MockTransport) -> RequestPipeline {
    logged_pipeline_with(transport).0
}
