//! Protocol Module
//!
//! Defines the text command grammar and the binary frames sent to the mesh
//! controller over the serial bus.
//!
//! ## Command Grammar
//! ```text
//! C<digit>O<hex>      order command   1-4 hex digits      e.g. C6O1A2B
//! C<digit>B<decimal>  board command   1-3 decimal digits  e.g. C3B007
//! ```
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬────────────┬──────────┬───────────────────────┐
//! │ Len (1)  │ Marker (1) │ Code (1) │ Payload (1 or 2)      │
//! └──────────┴────────────┴──────────┴───────────────────────┘
//! ```
//! - Len: total frame length minus the length byte itself
//! - Marker: 0x20 (serial mesh command)
//! - Order payload: u16 big-endian (5-byte frame)
//! - Board payload: board number (4-byte frame)

mod command;
mod response;
mod codec;

pub use command::{MeshCommand, CommandType};
pub use response::{Response, Status};
pub use codec::{
    parse_command, encode_frame, Frame, MAX_FRAME_LEN, ORDER_FRAME_LEN, BOARD_FRAME_LEN,
    ORDER_TOKEN_WIDTH, BOARD_TOKEN_WIDTH, SERIAL_MESH_CMD,
};
