//! Transport credentials derived from the connection settings

use crate::error::{Result, ValidationError};
use crate::settings::ConnectionSettings;

pub const MAX_USERNAME_LEN: usize = 100;
pub const MAX_PASSWORD_LEN: usize = 200;

const API_VERSION: &str = "2016-11-14";

/// Username/password pair for the session handshake
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Build the IoT-hub style username and shared access signature
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self> {
        let username = format!("{}/{}/api-version={}", settings.host, settings.device, API_VERSION);
        let password = format!(
            "SharedAccessSignature sr={}%2Fdevices%2F{}&sig={}&se={}",
            settings.host, settings.device, settings.token_sig, settings.token_expiry
        );

        ValidationError::check_len("username", &username, MAX_USERNAME_LEN)?;
        ValidationError::check_len("password", &password, MAX_PASSWORD_LEN)?;
        Ok(Self { username, password })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cloud-to-device topic subscribed after every successful connect
pub fn device_topic(device: &str) -> String {
    format!("devices/{}/messages/devicebound/#", device)
}
