//! Client facade
//!
//! [`WavessClient`] builds the whole stack from a [`ClientConfig`] and a
//! storage backend. Each instance is independent; nothing is global.

use std::path::Path;
use std::sync::Arc;

use crate::agents::{HealthMonitor, HealthMonitorConfig};
use crate::api::Api;
use crate::auth::{AuthInterceptor, LogoutOutcome, SessionLifecycle, TokenStore, UserInfo};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::{ClientEvent, EventBus};
use crate::http::{
    ApiResult, Dispatcher, HttpTransport, RequestLog, RequestLogEntry, RequestPipeline, Transport,
};
use crate::preferences::Preferences;
use crate::storage::{KeyValueStore, MemoryStore, StorageError};

/// An API client with its own session, request log and event listeners
pub struct WavessClient {
    config: Arc<ClientConfig>,
    store: Arc<dyn KeyValueStore>,
    dispatcher: Arc<Dispatcher>,
    session: Arc<SessionLifecycle>,
    pipeline: RequestPipeline,
    api: Api,
}

impl WavessClient {
    /// Creates a client talking HTTP to `config.base_url`
    pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, store, Arc::new(transport)))
    }

    /// Creates a client from a JSON config file
    ///
    /// Unlike [`ClientConfig::load`], a missing or malformed file is an
    /// error. `WAVESS_BASE_URL` still overrides the stored base URL.
    pub fn from_config_file(
        path: impl AsRef<Path>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ClientError> {
        let config = ClientConfig::load_from(path.as_ref())?.with_env_overrides();
        tracing::info!("Loaded client config from {:?}", path.as_ref());
        Self::new(config, store)
    }

    /// Creates a client whose session lives only as long as the process
    pub fn in_memory(config: ClientConfig) -> Result<Self, ClientError> {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    /// Creates a client over a custom transport
    pub fn with_transport(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let config = Arc::new(config);
        let tokens = TokenStore::new(store.clone(), config.storage_keys.clone());
        let dispatcher = Arc::new(Dispatcher::new(
            transport,
            tokens,
            Arc::new(RequestLog::with_capacity(config.request_log_capacity)),
            Arc::new(EventBus::new()),
        ));
        let session = Arc::new(SessionLifecycle::new(dispatcher.clone(), config.clone()));
        let interceptor = Arc::new(AuthInterceptor::new(
            dispatcher.clone(),
            session.clone(),
            config.clone(),
        ));
        let pipeline = RequestPipeline::new(interceptor);
        let api = Api::new(pipeline.clone());

        tracing::debug!(
            "Client ready for {}{}",
            config.base_url,
            config.api_prefix
        );

        Self {
            config,
            store,
            dispatcher,
            session,
            pipeline,
            api,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Generic request surface
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Typed endpoint groups
    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn session(&self) -> &Arc<SessionLifecycle> {
        &self.session
    }

    pub fn tokens(&self) -> &TokenStore {
        self.dispatcher.tokens()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        self.dispatcher.events()
    }

    /// Registers a callback for every client event
    pub fn on_event<F>(&self, callback: F)
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.events().subscribe(callback);
    }

    pub fn request_log(&self) -> &Arc<RequestLog> {
        self.dispatcher.log()
    }

    /// Logged requests, newest first
    pub async fn request_log_entries(&self) -> Vec<RequestLogEntry> {
        self.request_log().entries().await
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult {
        self.session.login(username, password).await
    }

    pub async fn logout(&self) -> LogoutOutcome {
        self.session.logout().await
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserInfo> {
        self.session.current_user()
    }

    /// Tells the client which route the application is showing
    pub fn set_current_route(&self, route: impl Into<String>) {
        self.session.set_current_route(route);
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::load(self.store.as_ref(), &self.config.storage_keys.preferences)
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<(), StorageError> {
        preferences.save(self.store.as_ref(), &self.config.storage_keys.preferences)
    }

    /// A health monitor polling through this client
    pub fn health_monitor(&self, config: HealthMonitorConfig) -> HealthMonitor {
        HealthMonitor::with_config(self.api.monitor.clone(), config)
    }
}
