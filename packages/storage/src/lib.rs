// ABOUTME: Backing store contract for watch-app auth tokens, channel settings and app settings
// ABOUTME: Defines the SettingsStorage trait shared by every backend plus the in-memory backend

use async_trait::async_trait;
use serde::Serialize;

pub mod error;
pub mod factory;
pub mod memory;
pub mod sweeper;

pub use error::{StorageError, StorageResult};
pub use factory::{SettingsStorageExt, StorageFactory, StorageManager};
pub use memory::InMemoryStorage;
pub use sweeper::ExpirySweeper;

pub use watchstore_config::{StorageProviderKind, StoreConfig};
pub use watchstore_core::{
    AppSettingsView, AuthTokens, Clock, Payload, SystemClock, UserSettings, UserSettingsView,
};

/// Contract every settings backing store implements.
///
/// Keys are caller-defined opaque strings and payloads are opaque JSON values.
/// Lookups on missing keys resolve to `None` rather than an error; `Err` is
/// reserved for invalid input and for backends that can fail at I/O.
///
/// Methods are async so in-memory and database-backed stores can sit behind
/// the same `Arc<dyn SettingsStorage>`.
#[async_trait]
pub trait SettingsStorage: Send + Sync {
    // Auth tokens
    async fn store_auth_tokens(&self, credentials_key: &str, tokens: AuthTokens)
        -> StorageResult<()>;
    async fn get_auth_tokens_by_credentials_key(
        &self,
        credentials_key: &str,
    ) -> StorageResult<Option<AuthTokens>>;
    async fn get_auth_tokens_by_channel_label(
        &self,
        channel_label: &str,
    ) -> StorageResult<Option<AuthTokens>>;

    // Channel settings (reference counted)

    /// Link one more subscriber to `channel_label`.
    ///
    /// The first store creates the entry. Later stores only replace the payload
    /// when `is_contextual` is set; the credentials key never changes.
    async fn store_user_settings(
        &self,
        channel_label: &str,
        user_settings: UserSettings,
        credentials_key: &str,
        is_contextual: bool,
    ) -> StorageResult<()>;

    /// Unlink one subscriber; the entry is deleted when the last one leaves.
    async fn remove_user_settings(&self, channel_label: &str) -> StorageResult<()>;
    async fn get_user_settings(&self, channel_label: &str)
        -> StorageResult<Option<UserSettingsView>>;
    async fn get_all_user_settings(&self) -> StorageResult<Vec<UserSettingsView>>;

    // App settings (time limited)

    /// Create or renew app settings so they stay readable for `ttl_seconds`.
    async fn store_app_settings(
        &self,
        user_key: &str,
        user_settings: UserSettings,
        credentials_key: &str,
        ttl_seconds: u64,
    ) -> StorageResult<()>;
    async fn get_app_settings(&self, user_key: &str) -> StorageResult<Option<AppSettingsView>>;
    async fn get_all_app_settings(&self) -> StorageResult<Vec<AppSettingsView>>;

    /// Delete every expired app-settings entry and return what was removed.
    async fn remove_expired_app_settings(&self) -> StorageResult<Vec<AppSettingsView>>;

    // Storage information
    async fn get_storage_info(&self) -> StorageResult<StorageInfo>;
}

/// Information about the storage system
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageInfo {
    pub provider: String,
    pub auth_tokens: usize,
    pub user_settings: usize,
    pub app_settings: usize,
    /// App-settings entries that are past expiry but not yet swept
    pub expired_app_settings: usize,
}
