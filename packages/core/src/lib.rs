// ABOUTME: Core types and time source for watchstore
// ABOUTME: Foundational package shared by the config and storage packages

pub mod clock;
pub mod types;

// Re-export main types
pub use types::{
    AppSettingsEntry, AppSettingsView, AuthTokens, Payload, UserSettings, UserSettingsEntry,
    UserSettingsView,
};

// Re-export clocks
pub use clock::{Clock, SystemClock};

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
