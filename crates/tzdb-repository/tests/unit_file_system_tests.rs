//! Unit tests for FileSystemProvider
//!
//! These tests focus on path resolution and reading a store's resources
//! from disk.

use tempfile::TempDir;
use tokio::fs;
use tzdb_codec::fixtures;
use tzdb_repository::{
    CacheableProvider, FetchError, FileSystemProvider, RegistryConfig, ResourceProvider,
    RuleStore, StoreError, ZoneRulesProvider,
};

/// Helper function to create a data directory with sample zone files
async fn create_test_data() -> (TempDir, FileSystemProvider) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    fs::create_dir_all(root.join("tzdb/America")).await.unwrap();
    fs::create_dir_all(root.join("tzdb/Etc")).await.unwrap();

    fs::write(
        root.join("tzdb/America/New_York.dat"),
        fixtures::zone_file(&fixtures::new_york()),
    )
    .await
    .unwrap();
    fs::write(
        root.join("tzdb/Etc/UTC.dat"),
        fixtures::zone_file(&fixtures::utc()),
    )
    .await
    .unwrap();
    fs::write(root.join("tzdb/Etc/Broken.dat"), b"not a zone file")
        .await
        .unwrap();

    let provider = FileSystemProvider::new(root).unwrap();
    (temp_dir, provider)
}

#[tokio::test]
async fn test_new_requires_directory() {
    let temp_dir = TempDir::new().unwrap();

    let missing = FileSystemProvider::new(temp_dir.path().join("nope"));
    assert!(matches!(missing, Err(FetchError::InvalidPath { .. })));

    let file = temp_dir.path().join("file.dat");
    std::fs::write(&file, b"x").unwrap();
    assert!(matches!(
        FileSystemProvider::new(&file),
        Err(FetchError::InvalidPath { .. })
    ));
}

#[tokio::test]
async fn test_root_is_absolute() {
    let (_temp_dir, provider) = create_test_data().await;

    assert!(provider.root_path().is_absolute());
}

#[tokio::test]
async fn test_fetch_existing() {
    let (_temp_dir, provider) = create_test_data().await;

    let data = provider.fetch("tzdb/Etc/UTC.dat").await.unwrap();

    assert_eq!(data.as_ref(), fixtures::zone_file(&fixtures::utc()).as_slice());
}

#[tokio::test]
async fn test_fetch_missing() {
    let (_temp_dir, provider) = create_test_data().await;

    let err = provider.fetch("tzdb/Europe/Paris.dat").await.unwrap_err();

    assert!(matches!(err, FetchError::NotFound { .. }));
    assert_eq!(err.path(), "tzdb/Europe/Paris.dat");
}

#[tokio::test]
async fn test_fetch_rejects_escape() {
    let (_temp_dir, provider) = create_test_data().await;

    for path in ["../outside.dat", "tzdb/../../outside.dat", "/etc/hosts", ""] {
        let err = provider.fetch(path).await.unwrap_err();
        assert!(
            matches!(err, FetchError::InvalidPath { .. }),
            "{path:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_fetch_directory_is_unreadable() {
    let (_temp_dir, provider) = create_test_data().await;

    let err = provider.fetch("tzdb/Etc").await.unwrap_err();

    assert!(matches!(err, FetchError::Io { .. }));
}

// ============================================================================
// Store over the file system
// ============================================================================

#[tokio::test]
async fn test_store_reads_from_disk() {
    let (_temp_dir, provider) = create_test_data().await;
    let config = RegistryConfig::new("2020a", ["America/New_York", "Etc/UTC"]);
    let store = RuleStore::new(config, provider).unwrap();

    let rules = store.rules_for("America/New_York").await.unwrap();
    assert_eq!(*rules, fixtures::new_york());

    assert_eq!(store.preload(None).await.unwrap(), 2);
    assert_eq!(store.cache_stats().fetches, 2);
}

#[tokio::test]
async fn test_store_classifies_disk_errors() {
    let (_temp_dir, provider) = create_test_data().await;
    let config = RegistryConfig::new("2020a", ["Etc/UTC"]);
    let store = RuleStore::new(config, provider).unwrap();

    let missing = store.rules_for("Europe/Paris").await.unwrap_err();
    assert!(missing.is_packaging_defect());

    let corrupt = store.rules_for("Etc/Broken").await.unwrap_err();
    assert!(matches!(corrupt, StoreError::CorruptFormat { .. }));

    let escape = store.rules_for("../../../etc/hosts").await.unwrap_err();
    assert!(matches!(escape, StoreError::InvalidZoneId { .. }));
    assert!(!escape.is_packaging_defect());
    assert_eq!(store.cache_stats().entries, 0);
}

#[tokio::test]
async fn test_cached_rules_survive_file_removal() {
    let (temp_dir, provider) = create_test_data().await;
    let config = RegistryConfig::new("2020a", ["Etc/UTC"]);
    let store = RuleStore::new(config, provider).unwrap();

    let first = store.rules_for("Etc/UTC").await.unwrap();
    fs::remove_file(temp_dir.path().join("tzdb/Etc/UTC.dat"))
        .await
        .unwrap();
    let second = store.rules_for("Etc/UTC").await.unwrap();

    assert_eq!(first, second);
}
