//! Protocol codec
//!
//! Parsing of command text and encoding of mesh frames.
//!
//! Parsing is a single pass over the line: prefix, code digit, discriminator,
//! then a token whose grammar depends on the discriminator.

use bytes::BufMut;

use crate::error::{ParseError, Result, ValidationError};
use super::{CommandType, MeshCommand};

/// Marker byte identifying a serial mesh command frame
pub const SERIAL_MESH_CMD: u8 = 0x20;

/// Total length of an order frame
pub const ORDER_FRAME_LEN: usize = 5;

/// Total length of a board frame
pub const BOARD_FRAME_LEN: usize = 4;

/// Capacity of the frame buffer
pub const MAX_FRAME_LEN: usize = 16;

/// Maximum hex digits in an order token
pub const ORDER_TOKEN_WIDTH: usize = 4;

/// Maximum decimal digits in a board token
pub const BOARD_TOKEN_WIDTH: usize = 3;

// =============================================================================
// Frame
// =============================================================================

/// A binary frame ready for the serial bus
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    buf: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl Frame {
    /// Frame bytes, length byte included
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Total length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Never true for an encoded frame
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hex rendering used in logs and by the CLI
    pub fn to_hex(&self) -> String {
        self.as_bytes()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame[{}]", self.to_hex())
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a command into its frame
///
/// Format: len (1) + marker (1) + code (1) + payload
pub fn encode_frame(command: &MeshCommand) -> Frame {
    let mut buf = [0u8; MAX_FRAME_LEN];
    let len = match command {
        MeshCommand::Order { .. } => ORDER_FRAME_LEN,
        MeshCommand::Board { .. } => BOARD_FRAME_LEN,
    };

    {
        let mut out = &mut buf[..len];
        // The length byte does not count itself
        out.put_u8((len - 1) as u8);
        out.put_u8(SERIAL_MESH_CMD);
        out.put_u8(command.code());
        match command {
            MeshCommand::Order { order, .. } => out.put_u16(*order),
            MeshCommand::Board { board, .. } => out.put_u8(*board),
        }
    }

    Frame { buf, len }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a command line such as `C6O1A2B` or `C3B007`
///
/// Surrounding whitespace and NUL padding are ignored. Anything else that
/// does not fit the grammar is an error; no field is ever defaulted.
pub fn parse_command(input: &str) -> Result<MeshCommand> {
    let line = input.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let mut chars = line.chars();

    match chars.next() {
        None => return Err(ParseError::Empty.into()),
        Some('C') => {}
        Some(other) => return Err(ParseError::MissingPrefix(other).into()),
    }

    let code = match chars.next() {
        None => return Err(ParseError::MissingCode.into()),
        Some(c) => c.to_digit(10).ok_or(ParseError::InvalidCode(c))? as u8,
    };

    let command_type = match chars.next() {
        None => return Err(ParseError::MissingDiscriminator.into()),
        Some(c) => CommandType::from_char(c).ok_or(ParseError::UnknownDiscriminator(c))?,
    };

    let token = chars.as_str();
    match command_type {
        CommandType::Order => {
            let order = parse_token(token, "order", 16, ORDER_TOKEN_WIDTH, u16::MAX as u32)? as u16;
            Ok(MeshCommand::Order { code, order })
        }
        CommandType::Board => {
            let board = parse_token(token, "board", 10, BOARD_TOKEN_WIDTH, u8::MAX as u32)? as u8;
            Ok(MeshCommand::Board { code, board })
        }
    }
}

/// Parse an unsigned token of at most `width` digits in `radix`, rejecting
/// values above `max`
fn parse_token(token: &str, field: &'static str, radix: u32, width: usize, max: u32) -> Result<u32> {
    if token.is_empty() {
        return Err(ParseError::MissingToken(field).into());
    }
    // Leading zeros count toward the width
    ValidationError::check_len(field, token, width)?;

    let mut value: u32 = 0;
    for c in token.chars() {
        let digit = c
            .to_digit(radix)
            .ok_or(ParseError::InvalidToken { field, found: c })?;
        value = value * radix + digit;
    }

    if value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value: token.to_string(),
            min: 0,
            max: max as u64,
        }
        .into());
    }

    Ok(value)
}
