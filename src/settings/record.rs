//! Settings record
//!
//! On-disk form of [`ConnectionSettings`].
//!
//! ## Layout (little-endian)
//! ```text
//! ┌───────────┬───────────┬───────────┬──────────────────────────────┐
//! │ Magic (4) │ Len (4)   │ CRC32 (4) │ bincode(ConnectionSettings)  │
//! └───────────┴───────────┴───────────┴──────────────────────────────┘
//! ```
//! A record whose magic does not match was never initialized: the caller
//! falls back to the built-in defaults.

use thiserror::Error;

use super::ConnectionSettings;
use crate::error::{GatewayError, Result};

/// Marks an initialized settings record
pub const SETTINGS_MAGIC: u32 = 0xD5A8_A3AA;

/// Magic (4) + Len (4) + CRC (4)
pub const RECORD_HEADER_SIZE: usize = 12;

/// Upper bound on the payload; real records are a few hundred bytes
const MAX_PAYLOAD_SIZE: usize = 4096;

/// Reasons a stored record cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record truncated: {0} bytes")]
    Truncated(usize),

    #[error("magic mismatch: 0x{0:08X}")]
    BadMagic(u32),

    #[error("payload length {declared} does not match {actual} stored bytes")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("checksum mismatch: stored 0x{stored:08X}, computed 0x{computed:08X}")]
    Checksum { stored: u32, computed: u32 },

    #[error("undecodable payload: {0}")]
    Payload(String),
}

/// Serialize settings into a complete record
pub fn encode_record(settings: &ConnectionSettings) -> Result<Vec<u8>> {
    let payload =
        bincode::serialize(settings).map_err(|e| GatewayError::Serialization(e.to_string()))?;
    let crc = crc32fast::hash(&payload);

    let mut record = Vec::with_capacity(RECORD_HEADER_SIZE + payload.len());
    record.extend_from_slice(&SETTINGS_MAGIC.to_le_bytes());
    record.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    record.extend_from_slice(&crc.to_le_bytes());
    record.extend_from_slice(&payload);
    Ok(record)
}

/// Validate and deserialize a record
pub fn decode_record(bytes: &[u8]) -> std::result::Result<ConnectionSettings, RecordError> {
    if bytes.len() < RECORD_HEADER_SIZE {
        return Err(RecordError::Truncated(bytes.len()));
    }

    let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if magic != SETTINGS_MAGIC {
        return Err(RecordError::BadMagic(magic));
    }

    let declared = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let stored_crc = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let payload = &bytes[RECORD_HEADER_SIZE..];

    if declared > MAX_PAYLOAD_SIZE || declared != payload.len() {
        return Err(RecordError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    let computed = crc32fast::hash(payload);
    if computed != stored_crc {
        return Err(RecordError::Checksum {
            stored: stored_crc,
            computed,
        });
    }

    bincode::deserialize(payload).map_err(|e| RecordError::Payload(e.to_string()))
}
