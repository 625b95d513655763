// ABOUTME: In-memory implementation of the SettingsStorage contract
// ABOUTME: Three hash tables behind one async lock, with reference counting and TTL expiry

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use watchstore_core::{
    AppSettingsEntry, AppSettingsView, AuthTokens, Clock, SystemClock, UserSettings,
    UserSettingsEntry, UserSettingsView,
};

use crate::{SettingsStorage, StorageError, StorageInfo, StorageResult};

const PROVIDER_NAME: &str = "memory";

#[derive(Debug, Default)]
struct Tables {
    auth: HashMap<String, AuthTokens>,
    user_settings: HashMap<String, UserSettingsEntry>,
    app_settings: HashMap<String, AppSettingsEntry>,
}

impl Tables {
    fn tokens_for(&self, credentials_key: &str) -> Option<AuthTokens> {
        self.auth.get(credentials_key).cloned()
    }

    fn user_view(&self, channel_label: &str, entry: &UserSettingsEntry) -> UserSettingsView {
        UserSettingsView {
            channel_label: channel_label.to_string(),
            user_settings: entry.user_settings.clone(),
            auth_tokens: self.tokens_for(&entry.credentials_key),
        }
    }

    fn app_view(&self, user_key: &str, entry: &AppSettingsEntry) -> AppSettingsView {
        AppSettingsView {
            user_key: user_key.to_string(),
            user_settings: entry.user_settings.clone(),
            auth_tokens: self.tokens_for(&entry.credentials_key),
        }
    }
}

/// Settings store that keeps every table in process memory.
///
/// Nothing survives a restart. All three tables sit behind a single lock so
/// that count updates, create-or-renew and the collect-then-delete sweep are
/// atomic with respect to each other and to the read-time token joins.
#[derive(Debug)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStorage {
    /// Create an empty store reading the system time.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store that asks `clock` for the current time.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn expiry_after(now: DateTime<Utc>, ttl_seconds: u64) -> StorageResult<DateTime<Utc>> {
    i64::try_from(ttl_seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            StorageError::InvalidInput(format!("TTL of {} seconds is out of range", ttl_seconds))
        })
}

#[async_trait]
impl SettingsStorage for InMemoryStorage {
    async fn store_auth_tokens(
        &self,
        credentials_key: &str,
        tokens: AuthTokens,
    ) -> StorageResult<()> {
        debug!("Storing auth tokens for credentials key: {}", credentials_key);
        let mut tables = self.tables.write().await;
        tables.auth.insert(credentials_key.to_string(), tokens);
        Ok(())
    }

    async fn get_auth_tokens_by_credentials_key(
        &self,
        credentials_key: &str,
    ) -> StorageResult<Option<AuthTokens>> {
        let tables = self.tables.read().await;
        Ok(tables.tokens_for(credentials_key))
    }

    async fn get_auth_tokens_by_channel_label(
        &self,
        channel_label: &str,
    ) -> StorageResult<Option<AuthTokens>> {
        let tables = self.tables.read().await;
        let tokens = match tables.user_settings.get(channel_label) {
            Some(entry) if !entry.credentials_key.is_empty() => {
                tables.tokens_for(&entry.credentials_key)
            }
            _ => None,
        };
        Ok(tokens)
    }

    async fn store_user_settings(
        &self,
        channel_label: &str,
        user_settings: UserSettings,
        credentials_key: &str,
        is_contextual: bool,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write().await;

        let entry = match tables.user_settings.entry(channel_label.to_string()) {
            Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                if is_contextual {
                    entry.user_settings = user_settings;
                }
                entry
            }
            Entry::Vacant(vacant) => {
                vacant.insert(UserSettingsEntry::new(user_settings, credentials_key))
            }
        };
        entry.reference_count = entry.reference_count.saturating_add(1);

        debug!(
            "Stored user settings for channel {} (contextual: {}, references: {})",
            channel_label, is_contextual, entry.reference_count
        );
        Ok(())
    }

    async fn remove_user_settings(&self, channel_label: &str) -> StorageResult<()> {
        let mut tables = self.tables.write().await;

        let Some(entry) = tables.user_settings.get_mut(channel_label) else {
            debug!("No user settings to remove for channel {}", channel_label);
            return Ok(());
        };

        if entry.reference_count == 0 {
            warn!(
                "User settings for channel {} had no references left; removing entry",
                channel_label
            );
        }
        entry.reference_count = entry.reference_count.saturating_sub(1);

        if entry.reference_count == 0 {
            tables.user_settings.remove(channel_label);
            debug!("Removed last reference to channel {}", channel_label);
        } else {
            debug!(
                "Unlinked channel {} ({} references left)",
                channel_label, entry.reference_count
            );
        }
        Ok(())
    }

    async fn get_user_settings(
        &self,
        channel_label: &str,
    ) -> StorageResult<Option<UserSettingsView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_settings
            .get(channel_label)
            .map(|entry| tables.user_view(channel_label, entry)))
    }

    async fn get_all_user_settings(&self) -> StorageResult<Vec<UserSettingsView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_settings
            .iter()
            .map(|(label, entry)| tables.user_view(label, entry))
            .collect())
    }

    async fn store_app_settings(
        &self,
        user_key: &str,
        user_settings: UserSettings,
        credentials_key: &str,
        ttl_seconds: u64,
    ) -> StorageResult<()> {
        let expires_at = expiry_after(self.clock.now(), ttl_seconds)?;
        let mut tables = self.tables.write().await;

        match tables.app_settings.get_mut(user_key) {
            Some(entry) => {
                entry.user_settings = user_settings;
                entry.credentials_key = credentials_key.to_string();
                entry.expires_at = expires_at;
                debug!("Renewed app settings for {} until {}", user_key, expires_at);
            }
            None => {
                tables.app_settings.insert(
                    user_key.to_string(),
                    AppSettingsEntry {
                        user_settings,
                        credentials_key: credentials_key.to_string(),
                        expires_at,
                    },
                );
                debug!("Stored app settings for {} until {}", user_key, expires_at);
            }
        }
        Ok(())
    }

    async fn get_app_settings(&self, user_key: &str) -> StorageResult<Option<AppSettingsView>> {
        let now = self.clock.now();
        let tables = self.tables.read().await;
        Ok(tables
            .app_settings
            .get(user_key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| tables.app_view(user_key, entry)))
    }

    async fn get_all_app_settings(&self) -> StorageResult<Vec<AppSettingsView>> {
        let now = self.clock.now();
        let tables = self.tables.read().await;
        Ok(tables
            .app_settings
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| tables.app_view(key, entry))
            .collect())
    }

    async fn remove_expired_app_settings(&self) -> StorageResult<Vec<AppSettingsView>> {
        let now = self.clock.now();
        let mut tables = self.tables.write().await;

        let expired: Vec<AppSettingsView> = tables
            .app_settings
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, entry)| tables.app_view(key, entry))
            .collect();

        for view in &expired {
            tables.app_settings.remove(&view.user_key);
        }

        if !expired.is_empty() {
            debug!("Removed {} expired app settings", expired.len());
        }
        Ok(expired)
    }

    async fn get_storage_info(&self) -> StorageResult<StorageInfo> {
        let now = self.clock.now();
        let tables = self.tables.read().await;
        Ok(StorageInfo {
            provider: PROVIDER_NAME.to_string(),
            auth_tokens: tables.auth.len(),
            user_settings: tables.user_settings.len(),
            app_settings: tables.app_settings.len(),
            expired_app_settings: tables
                .app_settings
                .values()
                .filter(|entry| entry.is_expired_at(now))
                .count(),
        })
    }
}
