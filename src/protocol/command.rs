//! Command definitions
//!
//! Represents mesh commands parsed from either ingress path.

/// Parameter type discriminator following the command code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Order = b'O',
    Board = b'B',
}

impl CommandType {
    /// Map a discriminator letter to its command type
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'O' => Some(CommandType::Order),
            'B' => Some(CommandType::Board),
            _ => None,
        }
    }
}

/// A parsed mesh command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshCommand {
    /// Reassign board ordering (order given as hex text)
    Order { code: u8, order: u16 },

    /// Address a single board with an action code
    Board { code: u8, board: u8 },
}

impl MeshCommand {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            MeshCommand::Order { .. } => CommandType::Order,
            MeshCommand::Board { .. } => CommandType::Board,
        }
    }

    /// Action code (0-9)
    pub fn code(&self) -> u8 {
        match self {
            MeshCommand::Order { code, .. } | MeshCommand::Board { code, .. } => *code,
        }
    }
}
