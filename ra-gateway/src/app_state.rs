use std::sync::Arc;

use crate::{
    cache::CacheClient,
    config::Config,
    crypto::KeyEncryptor,
    dispatcher::UpstreamClient,
    error::init::InitError,
    hooks::HookExecutor,
    logger::LogSink,
    resolver::Resolver,
    store::{UserDataStorageConnector, memory::InMemoryStore},
};

#[derive(Debug, Clone)]
pub struct AppState(pub Arc<InnerAppState>);

#[derive(Debug)]
pub struct InnerAppState {
    pub config: Config,
    pub store: Arc<dyn UserDataStorageConnector>,
    pub cache: CacheClient,
    pub sink: LogSink,
    pub upstream: UpstreamClient,
    pub hooks: HookExecutor,
    pub resolver: Resolver,
    pub encryptor: KeyEncryptor,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, InitError> {
        let store: Arc<dyn UserDataStorageConnector> =
            Arc::new(InMemoryStore::new());
        Self::with_store(config, store)
    }

    /// Builds the state over a caller-supplied storage connector. Used by
    /// tests and by deployments with a remote store.
    pub fn with_store(
        config: Config,
        store: Arc<dyn UserDataStorageConnector>,
    ) -> Result<Self, InitError> {
        let encryptor =
            KeyEncryptor::from_hex_key(config.auth.encryption_key.expose())?;
        let cache = CacheClient::new(&config.cache);
        let sink = LogSink::new(Arc::clone(&store));
        let upstream =
            UpstreamClient::new(&config.dispatcher, config.retries.clone())?;
        let hooks = HookExecutor::new(cache.clone(), upstream.clone());
        let resolver = Resolver::new(Arc::clone(&store), encryptor.clone());
        Ok(Self(Arc::new(InnerAppState {
            config,
            store,
            cache,
            sink,
            upstream,
            hooks,
            resolver,
            encryptor,
        })))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.0.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn UserDataStorageConnector> {
        &self.0.store
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.0.resolver
    }
}
