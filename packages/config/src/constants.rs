// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across watchstore

// Storage Backend
pub const WATCHSTORE_STORAGE_PROVIDER: &str = "WATCHSTORE_STORAGE_PROVIDER";

// App Settings Expiry Sweep
pub const WATCHSTORE_SWEEP_ENABLED: &str = "WATCHSTORE_SWEEP_ENABLED";
pub const WATCHSTORE_SWEEP_INTERVAL_SECS: &str = "WATCHSTORE_SWEEP_INTERVAL_SECS";

// Defaults
pub const DEFAULT_STORAGE_PROVIDER: &str = "memory";
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const MIN_SWEEP_INTERVAL_SECS: u64 = 1;
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 3600;
