// ABOUTME: Integration tests for the storage manager lifecycle and shared access
// ABOUTME: Tests concurrent subscribers on one store and expiry notifications from the sweeper

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use serde_json::json;

use watchstore_core::FixedClock;
use watchstore_storage::{
    InMemoryStorage, SettingsStorage, SettingsStorageExt, StorageManager, StoreConfig,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subscribers_share_one_entry() {
    let manager = StorageManager::new(StoreConfig::default()).await.unwrap();
    let storage = manager.storage();

    let mut handles = Vec::new();
    for i in 0..32 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage
                .store_user_settings("ch1", json!({"subscriber": i}), "cred-1", false)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..31 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage.remove_user_settings("ch1").await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Exactly one subscriber left
    assert!(storage.channel_exists("ch1").await.unwrap());
    storage.remove_user_settings("ch1").await.unwrap();
    assert!(!storage.channel_exists("ch1").await.unwrap());
}

#[tokio::test]
async fn test_manager_sweeper_notifies_expiry() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let storage: Arc<dyn SettingsStorage> = Arc::new(InMemoryStorage::with_clock(clock.clone()));

    let config = StoreConfig {
        sweep_interval_secs: 1,
        ..StoreConfig::default()
    };
    let mut manager = StorageManager::with_storage(storage.clone(), config);
    assert!(manager.start());
    let mut expired_rx = manager.subscribe_expired().unwrap();

    storage
        .store_auth_tokens("cred-1", json!({"tok": "X"}))
        .await
        .unwrap();
    storage
        .store_app_settings("user-1", json!({"v": 1}), "cred-1", 30)
        .await
        .unwrap();

    clock.advance(Duration::seconds(31));

    let view = tokio::time::timeout(StdDuration::from_secs(10), expired_rx.recv())
        .await
        .expect("no expiry notification")
        .unwrap();
    assert_eq!(view.user_key, "user-1");
    assert_eq!(view.auth_tokens, Some(json!({"tok": "X"})));

    assert!(!storage.app_settings_active("user-1").await.unwrap());
    assert_eq!(storage.get_storage_info().await.unwrap().app_settings, 0);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_manager_manual_sweep_publishes() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let storage: Arc<dyn SettingsStorage> = Arc::new(InMemoryStorage::with_clock(clock.clone()));

    let mut manager = StorageManager::with_storage(storage.clone(), StoreConfig::default());
    manager.start();
    let mut expired_rx = manager.subscribe_expired().unwrap();

    storage
        .store_app_settings("user-1", json!({}), "cred-1", 5)
        .await
        .unwrap();
    clock.advance(Duration::seconds(5));

    let removed = manager.sweep_now().await.unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(expired_rx.recv().await.unwrap().user_key, "user-1");

    manager.shutdown().await;
}
