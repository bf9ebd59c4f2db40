#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use wavess_client::storage::{KeyValueStore, MemoryStore};
use wavess_client::{ClientConfig, ClientEvent, UserInfo, WavessClient};
use wiremock::MockServer;

pub struct Harness {
    pub server: MockServer,
    pub store: Arc<MemoryStore>,
    pub client: WavessClient,
    pub events: Arc<Mutex<Vec<ClientEvent>>>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut ClientConfig)) -> Self {
        let server = MockServer::start().await;
        let mut config = ClientConfig::with_base_url(server.uri());
        customize(&mut config);

        let store = Arc::new(MemoryStore::new());
        let client = WavessClient::new(config, store.clone()).unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        client.on_event(move |event| sink.lock().unwrap().push(event.clone()));

        Self {
            server,
            store,
            client,
            events,
        }
    }

    /// Stores a signed-in session directly
    pub fn sign_in(&self, access: &str, refresh: Option<&str>) {
        self.client
            .tokens()
            .set(access, Some(&UserInfo::new("admin").with_role("owner")), refresh)
            .unwrap();
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap()
    }

    pub fn navigations(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, ClientEvent::Navigate(_)))
            .count()
    }
}
