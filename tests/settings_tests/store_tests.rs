//! Settings Store Tests
//!
//! Persistence, first-run defaults and validated setters on real files.

use std::fs;

use meshgate::broker::QoS;
use meshgate::error::{GatewayError, ValidationError};
use meshgate::settings::{
    encode_record, ConnectionSettings, SettingKey, SettingsStore, RECORD_HEADER_SIZE,
    SETTINGS_MAGIC,
};
use tempfile::TempDir;

fn settings_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("settings.bin")
}

// =============================================================================
// First Run Tests
// =============================================================================

#[test]
fn test_missing_file_loads_and_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let path = settings_path(&dir);

    let store = SettingsStore::open(&path).unwrap();
    assert!(store.was_first_run());
    assert_eq!(store.settings(), &ConnectionSettings::default());

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &SETTINGS_MAGIC.to_le_bytes());
    assert!(bytes.len() > RECORD_HEADER_SIZE);

    let reopened = SettingsStore::open(&path).unwrap();
    assert!(!reopened.was_first_run());
}

#[test]
fn test_creates_missing_parent_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("settings.bin");

    SettingsStore::open(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_corrupted_magic_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = settings_path(&dir);

    let custom = ConnectionSettings {
        port: 1883,
        ..ConnectionSettings::default()
    };
    let mut record = encode_record(&custom).unwrap();
    record[0] ^= 0xFF;
    fs::write(&path, &record).unwrap();

    let store = SettingsStore::open(&path).unwrap();
    assert!(store.was_first_run());
    assert_eq!(store.settings().port, 8883);
}

#[test]
fn test_corrupted_checksum_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = settings_path(&dir);

    let custom = ConnectionSettings {
        device: "lamp-42".to_string(),
        ..ConnectionSettings::default()
    };
    let mut record = encode_record(&custom).unwrap();
    let last = record.len() - 1;
    record[last] ^= 0x01;
    fs::write(&path, &record).unwrap();

    let store = SettingsStore::open(&path).unwrap();
    assert!(store.was_first_run());
    assert_eq!(store.settings().device, "007");
}

#[test]
fn test_truncated_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = settings_path(&dir);
    fs::write(&path, [0xAA, 0xA3]).unwrap();

    let store = SettingsStore::open(&path).unwrap();
    assert!(store.was_first_run());
}

// =============================================================================
// Getter/Setter Tests
// =============================================================================

#[test]
fn test_set_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = settings_path(&dir);

    {
        let mut store = SettingsStore::open(&path).unwrap();
        store.set("mqtt.host", "broker.local").unwrap();
        store.set("mqtt.port", "1883").unwrap();
        store.set("mqtt.security", "0").unwrap();
        store.set("mqtt.qos", "1").unwrap();
    }

    let store = SettingsStore::open(&path).unwrap();
    assert!(!store.was_first_run());
    assert_eq!(store.get("mqtt.host").unwrap(), "broker.local");
    assert_eq!(store.get("mqtt.port").unwrap(), "1883");
    assert_eq!(store.get("mqtt.security").unwrap(), "0");
    assert_eq!(store.settings().qos, QoS::AtLeastOnce);
}

#[test]
fn test_qos_out_of_range_rejected() {
    let dir = TempDir::new().unwrap();
    let mut store = SettingsStore::open(&settings_path(&dir)).unwrap();

    let err = store.set("mqtt.qos", "5").unwrap_err();
    assert!(matches!(err, GatewayError::Validation(ValidationError::OutOfRange { .. })));
    assert_eq!(store.get("mqtt.qos").unwrap(), "0");

    store.set("mqtt.qos", "1").unwrap();
    assert_eq!(store.get("mqtt.qos").unwrap(), "1");
}

#[test]
fn test_rejected_value_is_not_persisted() {
    let dir = TempDir::new().unwrap();
    let path = settings_path(&dir);
    let mut store = SettingsStore::open(&path).unwrap();
    let before = fs::read(&path).unwrap();

    assert!(store.set("mqtt.device", &"d".repeat(51)).is_err());
    assert!(store.set("mqtt.token_sig", &"s".repeat(61)).is_err());
    assert!(store.set("mqtt.token_expiry", &"9".repeat(21)).is_err());

    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(store.settings(), &ConnectionSettings::default());
}

#[test]
fn test_unknown_key() {
    let store = SettingsStore::in_memory(ConnectionSettings::default());
    assert!(matches!(
        store.get("mqtt.password"),
        Err(GatewayError::Validation(ValidationError::UnknownKey(_)))
    ));
}

#[test]
fn test_list_covers_every_key_in_order() {
    let store = SettingsStore::in_memory(ConnectionSettings::default());
    let listing = store.list();

    let keys: Vec<SettingKey> = listing.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, SettingKey::ALL.to_vec());
    assert_eq!(listing[0].1, "ambient-hub.azure-devices.net");
    assert_eq!(listing[7].1, "120");
}

#[test]
fn test_in_memory_store_writes_nothing() {
    let mut store = SettingsStore::in_memory(ConnectionSettings::default());
    store.set("mqtt.keepalive", "30").unwrap();
    assert_eq!(store.get("mqtt.keepalive").unwrap(), "30");
    assert!(store.path().is_none());
}
