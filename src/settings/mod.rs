//! Settings Module
//!
//! Broker connection parameters, their getter/setter surface and their
//! persisted form.
//!
//! ## Keys
//! - `mqtt.host`          broker host name (max 40 bytes)
//! - `mqtt.port`          broker port (0-65535)
//! - `mqtt.device`        device identifier (max 50 bytes)
//! - `mqtt.token_expiry`  SAS token expiry (max 20 bytes)
//! - `mqtt.token_sig`     SAS token signature (max 60 bytes)
//! - `mqtt.qos`           QoS level (0-2)
//! - `mqtt.security`      TLS on/off (0/1)
//! - `mqtt.keepalive`     keepalive seconds (0-65535)

mod record;
mod store;

pub use record::{decode_record, encode_record, RecordError, SETTINGS_MAGIC, RECORD_HEADER_SIZE};
pub use store::SettingsStore;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::broker::QoS;
use crate::error::{Result, ValidationError};

pub const MAX_HOST_LEN: usize = 40;
pub const MAX_DEVICE_LEN: usize = 50;
pub const MAX_TOKEN_EXPIRY_LEN: usize = 20;
pub const MAX_TOKEN_SIG_LEN: usize = 60;

const DEFAULT_HOST: &str = "ambient-hub.azure-devices.net";
const DEFAULT_DEVICE: &str = "007";
const DEFAULT_TOKEN_EXPIRY: &str = "1540935986";
const DEFAULT_TOKEN_SIG: &str = "FIf1UT0wV7vbvKybRcMOyMH4%2B3BPqBPJEO0cOI%2FwFXk%3D";
const DEFAULT_PORT: u16 = 8883;
const DEFAULT_KEEPALIVE: u16 = 120;

/// Connection parameters consumed by the state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub device: String,
    pub token_expiry: String,
    pub token_sig: String,
    pub qos: QoS,
    pub security: bool,
    pub keepalive: u16,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            device: DEFAULT_DEVICE.to_string(),
            token_expiry: DEFAULT_TOKEN_EXPIRY.to_string(),
            token_sig: DEFAULT_TOKEN_SIG.to_string(),
            qos: QoS::AtMostOnce,
            security: true,
            keepalive: DEFAULT_KEEPALIVE,
        }
    }
}

/// Addressable setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Host,
    Port,
    Device,
    TokenExpiry,
    TokenSig,
    Qos,
    Security,
    Keepalive,
}

impl SettingKey {
    /// All keys in listing order
    pub const ALL: [SettingKey; 8] = [
        SettingKey::Host,
        SettingKey::Port,
        SettingKey::Device,
        SettingKey::TokenExpiry,
        SettingKey::TokenSig,
        SettingKey::Qos,
        SettingKey::Security,
        SettingKey::Keepalive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::Host => "mqtt.host",
            SettingKey::Port => "mqtt.port",
            SettingKey::Device => "mqtt.device",
            SettingKey::TokenExpiry => "mqtt.token_expiry",
            SettingKey::TokenSig => "mqtt.token_sig",
            SettingKey::Qos => "mqtt.qos",
            SettingKey::Security => "mqtt.security",
            SettingKey::Keepalive => "mqtt.keepalive",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SettingKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownKey(s.to_string()))
    }
}

impl ConnectionSettings {
    /// Current value of `key`, formatted as the console shows it
    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::Host => self.host.clone(),
            SettingKey::Port => self.port.to_string(),
            SettingKey::Device => self.device.clone(),
            SettingKey::TokenExpiry => self.token_expiry.clone(),
            SettingKey::TokenSig => self.token_sig.clone(),
            SettingKey::Qos => (self.qos as u8).to_string(),
            SettingKey::Security => u8::from(self.security).to_string(),
            SettingKey::Keepalive => self.keepalive.to_string(),
        }
    }

    /// Validate `value` and store it under `key`
    ///
    /// On error nothing is modified.
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<()> {
        let field = key.as_str();
        match key {
            SettingKey::Host => {
                ValidationError::check_len(field, value, MAX_HOST_LEN)?;
                self.host = value.to_string();
            }
            SettingKey::Device => {
                ValidationError::check_len(field, value, MAX_DEVICE_LEN)?;
                self.device = value.to_string();
            }
            SettingKey::TokenExpiry => {
                ValidationError::check_len(field, value, MAX_TOKEN_EXPIRY_LEN)?;
                self.token_expiry = value.to_string();
            }
            SettingKey::TokenSig => {
                ValidationError::check_len(field, value, MAX_TOKEN_SIG_LEN)?;
                self.token_sig = value.to_string();
            }
            SettingKey::Port => self.port = parse_in_range(field, value, 65_535)? as u16,
            SettingKey::Keepalive => self.keepalive = parse_in_range(field, value, 65_535)? as u16,
            SettingKey::Qos => {
                let level = parse_in_range(field, value, 2)? as u8;
                self.qos = QoS::try_from(level)?;
            }
            SettingKey::Security => self.security = parse_in_range(field, value, 1)? == 1,
        }
        Ok(())
    }
}

/// Parse a decimal integer and check it lies in `0..=max`
fn parse_in_range(field: &'static str, value: &str, max: u64) -> std::result::Result<u64, ValidationError> {
    let parsed: u64 = value.trim().parse().map_err(|_| ValidationError::InvalidNumber {
        field,
        value: value.to_string(),
    })?;
    if parsed > max {
        return Err(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
            min: 0,
            max,
        });
    }
    Ok(parsed)
}
