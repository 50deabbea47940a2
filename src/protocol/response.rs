//! Response definitions
//!
//! Replies written back to the local console.

use crate::error::GatewayError;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    BadArgs = 0x01,
    Error = 0x02,
}

/// A reply to a console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (getter output, usage text, or error message)
    pub payload: Option<String>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<String>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create a BAD_ARGS response
    pub fn bad_args(message: &str) -> Self {
        Self {
            status: Status::BadArgs,
            payload: Some(message.to_string()),
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.to_string()),
        }
    }

    /// Map a dispatcher result onto a console response
    pub fn from_result(result: Result<Option<String>, GatewayError>) -> Self {
        match result {
            Ok(payload) => Response::ok(payload),
            Err(e @ (GatewayError::Parse(_) | GatewayError::Validation(_))) => {
                Response::bad_args(&e.to_string())
            }
            Err(e) => Response::error(&e.to_string()),
        }
    }

    /// True for [`Status::Ok`]
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Render as console text
    pub fn render(&self) -> String {
        match (self.status, &self.payload) {
            (Status::Ok, Some(p)) => p.clone(),
            (Status::Ok, None) => "OK".to_string(),
            (Status::BadArgs, Some(p)) => format!("BAD ARGS: {}", p),
            (Status::Error, Some(p)) => format!("ERROR: {}", p),
            (_, None) => "ERROR".to_string(),
        }
    }
}
