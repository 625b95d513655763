// ABOUTME: Data model for the settings store tables and the views handed to callers
// ABOUTME: Payloads are opaque JSON values; views are value copies joined at read time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque payload. The store never inspects its contents.
pub type Payload = serde_json::Value;

/// Opaque OAuth-style token blob stored per credentials key
pub type AuthTokens = Payload;

/// Opaque per-channel or per-user settings blob
pub type UserSettings = Payload;

/// Row of the user-settings table, keyed by channel label.
///
/// Several subscribers to the same channel share one entry; `reference_count`
/// tracks how many of them are still linked. An entry with a zero count must
/// not stay in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsEntry {
    pub user_settings: UserSettings,
    pub credentials_key: String,
    pub reference_count: u32,
}

impl UserSettingsEntry {
    /// New entry with no subscribers yet; the caller links the first one.
    pub fn new(user_settings: UserSettings, credentials_key: impl Into<String>) -> Self {
        Self {
            user_settings,
            credentials_key: credentials_key.into(),
            reference_count: 0,
        }
    }
}

/// Row of the app-settings table, keyed by user key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettingsEntry {
    pub user_settings: UserSettings,
    pub credentials_key: String,
    pub expires_at: DateTime<Utc>,
}

impl AppSettingsEntry {
    /// An entry is expired once its expiry is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Channel settings joined with the auth tokens of their credentials key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsView {
    pub channel_label: String,
    pub user_settings: UserSettings,
    pub auth_tokens: Option<AuthTokens>,
}

/// App settings joined with the auth tokens of their credentials key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettingsView {
    pub user_key: String,
    pub user_settings: UserSettings,
    pub auth_tokens: Option<AuthTokens>,
}
