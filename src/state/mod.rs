//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::memory::InMemoryStore;
use crate::services::openai::OpenAiClient;
use crate::services::Services;

pub struct AppState {
    pub config: ServerConfig,
    pub services: Services,
}

impl AppState {
    /// Wire the default providers: OpenAI for speech and text, in-memory
    /// persistence.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let api_key = config.openai_api_key.clone().unwrap_or_default();
        let openai = Arc::new(OpenAiClient::with_base_url(
            api_key,
            config.openai_base_url.clone(),
        ));
        let services = Services {
            stt: openai.clone(),
            voice: openai.clone(),
            dialogue_model: openai,
            store: Arc::new(InMemoryStore::new()),
        };
        Self::with_services(config, services)
    }

    /// Inject arbitrary providers; used by tests with stub services.
    pub fn with_services(config: ServerConfig, services: Services) -> Arc<Self> {
        Arc::new(Self { config, services })
    }
}
