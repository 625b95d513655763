// ABOUTME: Storage construction from configuration and process-wide lifecycle management
// ABOUTME: StorageManager owns the store instance and its app settings expiry sweeper

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};
use watchstore_config::{StorageProviderKind, StoreConfig};
use watchstore_core::AppSettingsView;

use crate::{
    memory::InMemoryStorage, sweeper::ExpirySweeper, SettingsStorage, StorageInfo, StorageResult,
};

/// Factory for creating storage instances
pub struct StorageFactory;

impl StorageFactory {
    /// Create a new storage instance from configuration
    pub async fn create_storage(config: &StoreConfig) -> StorageResult<Box<dyn SettingsStorage>> {
        debug!("Creating storage with provider: {}", config.provider);

        match config.provider {
            StorageProviderKind::Memory => {
                info!("Initializing in-memory settings storage");
                Ok(Box::new(InMemoryStorage::new()))
            }
        }
    }

    /// Create a storage instance with default configuration
    pub async fn create_default_storage() -> StorageResult<Box<dyn SettingsStorage>> {
        Self::create_storage(&StoreConfig::default()).await
    }
}

/// Owns the single store instance of a process and its expiry sweeper.
///
/// Create it once at startup, hand out [`StorageManager::storage`] to
/// consumers, and call [`StorageManager::shutdown`] before exit.
pub struct StorageManager {
    storage: Arc<dyn SettingsStorage>,
    config: StoreConfig,
    sweeper: Option<ExpirySweeper>,
}

impl StorageManager {
    /// Create a new storage manager with the given configuration
    pub async fn new(config: StoreConfig) -> StorageResult<Self> {
        let storage: Arc<dyn SettingsStorage> =
            Arc::from(StorageFactory::create_storage(&config).await?);
        Ok(Self::with_storage(storage, config))
    }

    /// Create a storage manager from environment variables
    pub async fn from_env() -> StorageResult<Self> {
        let config = StoreConfig::from_env()?;
        Self::new(config).await
    }

    /// Wrap an already constructed store
    pub fn with_storage(storage: Arc<dyn SettingsStorage>, config: StoreConfig) -> Self {
        Self {
            storage,
            config,
            sweeper: None,
        }
    }

    /// Get a reference to the storage instance
    pub fn storage(&self) -> Arc<dyn SettingsStorage> {
        self.storage.clone()
    }

    /// Get the current configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Start background work. Returns whether a sweeper is running afterwards.
    pub fn start(&mut self) -> bool {
        if !self.config.sweep_enabled {
            info!("App settings expiry sweeper disabled by configuration");
            return false;
        }

        if self.sweeper.is_none() {
            self.sweeper = Some(ExpirySweeper::spawn(
                self.storage.clone(),
                self.config.sweep_interval(),
            ));
        }
        true
    }

    /// Receive app settings removed by the sweeper. `None` until started.
    pub fn subscribe_expired(&self) -> Option<broadcast::Receiver<AppSettingsView>> {
        self.sweeper.as_ref().map(ExpirySweeper::subscribe)
    }

    /// Sweep expired app settings now, publishing them if the sweeper runs
    pub async fn sweep_now(&self) -> StorageResult<Vec<AppSettingsView>> {
        match &self.sweeper {
            Some(sweeper) => sweeper.sweep_now().await,
            None => self.storage.remove_expired_app_settings().await,
        }
    }

    /// Stop background work. The store itself stays usable.
    pub async fn shutdown(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.shutdown().await;
        }
    }

    /// Test the storage connection
    pub async fn test_connection(&self) -> StorageResult<StorageInfo> {
        debug!("Testing storage connection");
        let info = self.storage.get_storage_info().await?;
        info!("Storage connection test successful ({})", info.provider);
        Ok(info)
    }
}

/// Wrapper trait that adds convenience methods to SettingsStorage
#[async_trait]
pub trait SettingsStorageExt: SettingsStorage {
    /// Check if a channel has live settings
    async fn channel_exists(&self, channel_label: &str) -> StorageResult<bool> {
        Ok(self.get_user_settings(channel_label).await?.is_some())
    }

    /// Check if a user's app settings are stored and not expired
    async fn app_settings_active(&self, user_key: &str) -> StorageResult<bool> {
        Ok(self.get_app_settings(user_key).await?.is_some())
    }
}

// Blanket implementation for all SettingsStorage types
impl<T: SettingsStorage + ?Sized> SettingsStorageExt for T {}
