//! # meshgate
//!
//! A gateway between a cloud message broker and a serial mesh controller:
//! - Text mesh commands from the broker or the local console
//! - Compact binary frames on a UART (115200 8N1, RTS/CTS)
//! - Broker connection life-cycle with immediate reconnect
//! - Connection settings persisted in a checksummed record
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐            ┌──────────────────────┐
//! │   Broker (rumqttc)   │            │   Console (stdin)    │
//! └──────────┬───────────┘            └──────────┬───────────┘
//!            │ BrokerEvent                       │ GatewayEvent
//! ┌──────────▼───────────────────────────────────▼───────────┐
//! │                  Runtime (single thread)                  │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               │
//! ┌─────────────────────────────▼─────────────────────────────┐
//! │                 Gateway (ingress dispatcher)              │
//! └──────┬───────────────────────┬────────────────────┬───────┘
//!        │                       │                    │
//!        ▼                       ▼                    ▼
//! ┌──────────────┐     ┌──────────────────┐   ┌──────────────┐
//! │  Connection  │     │  Protocol codec  │   │   Settings   │
//! │   Machine    │     │  text -> frame   │   │    Store     │
//! └──────────────┘     └────────┬─────────┘   └──────────────┘
//!                               │
//!                               ▼
//!                      ┌──────────────────┐
//!                      │ Serial transport │
//!                      └──────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod serial;
pub mod broker;
pub mod settings;
pub mod gateway;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{GatewayError, Result};
pub use config::GatewayConfig;
pub use gateway::{Gateway, GatewayEvent, Runtime};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of meshgate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
