//! Application state and dependency injection.

use cascade_nats::ExecutorQueue;
use cascade_opendal::StorageBackend;
use cascade_postgres::PgClient;

use super::callback::CallbackClient;
use super::config::ServiceConfig;
use crate::handler::Result;

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    pg_client: PgClient,
    storage: StorageBackend,
    executor_queue: ExecutorQueue,
    callbacks: CallbackClient,
    config: ServiceConfig,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to all external services and loads required resources.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        let service_state = Self {
            pg_client: config.connect_postgres().await?,
            storage: config.create_storage()?,
            executor_queue: config.connect_executor_queue().await?,
            callbacks: CallbackClient::new(config.callback_timeout()),
            config: config.clone(),
        };

        Ok(service_state)
    }

    /// Returns the database client.
    pub fn pg_client(&self) -> &PgClient {
        &self.pg_client
    }

    /// Returns the artifact storage backend.
    pub fn storage(&self) -> &StorageBackend {
        &self.storage
    }

    /// Returns the executor queue.
    pub fn executor_queue(&self) -> &ExecutorQueue {
        &self.executor_queue
    }

    /// Returns the callback client.
    pub fn callbacks(&self) -> &CallbackClient {
        &self.callbacks
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+ $(,)?) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(pg_client: PgClient);
impl_di!(storage: StorageBackend);
impl_di!(executor_queue: ExecutorQueue);
impl_di!(callbacks: CallbackClient);
