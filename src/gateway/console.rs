//! Console grammar
//!
//! Tokenises a local console line into a [`LocalCommand`]. Only shape is
//! checked here (verb and argument count); values are validated by the
//! component that consumes them.

use crate::error::ValidationError;

/// Printed for `cmd -...`
pub const CMD_USAGE: &str = "usage: cmd <cmd> <board#> - 0=off, 1=on, 2=toggle, 3=sparkle, 4=dazzle\n   \
                             or: cmd 6 <ABCD> to set order of boards to ABCD";

/// Printed for `help`
pub const HELP_TEXT: &str = "\
cmd <cmd> <board#>             send a mesh command (cmd - for usage)
mqtt_connect                   connect to the broker
mqtt_disconnect                disconnect from the broker
mqtt_publish <topic> <message> publish a message
mqtt_subscribe <topic>         subscribe to a topic
mqtt_unsubscribe <topic>       unsubscribe from a topic
get <key> | get mqtt           show one setting or every mqtt.* setting
set <key> <value>              change a setting
help                           this text";

/// Parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand<'a> {
    /// `cmd - ...`
    Usage,
    /// `cmd <code> <target>`
    Mesh { code: &'a str, target: &'a str },
    Connect,
    Disconnect,
    Publish { topic: &'a str, message: &'a str },
    Subscribe { topic: &'a str },
    Unsubscribe { topic: &'a str },
    /// `get mqtt`
    List,
    Get { key: &'a str },
    Set { key: &'a str, value: &'a str },
    Help,
    /// Blank line
    Empty,
}

impl<'a> LocalCommand<'a> {
    pub fn parse(line: &'a str) -> Result<Self, ValidationError> {
        let mut tokens = line.split_whitespace();
        let Some(verb) = tokens.next() else {
            return Ok(LocalCommand::Empty);
        };
        let args: Vec<&'a str> = tokens.collect();

        let command = match verb {
            "cmd" => {
                if args.first().is_some_and(|a| a.starts_with('-')) {
                    return Ok(LocalCommand::Usage);
                }
                expect_args("cmd", &args, 2)?;
                LocalCommand::Mesh {
                    code: args[0],
                    target: args[1],
                }
            }
            "mqtt_connect" => {
                expect_args("mqtt_connect", &args, 0)?;
                LocalCommand::Connect
            }
            "mqtt_disconnect" => {
                expect_args("mqtt_disconnect", &args, 0)?;
                LocalCommand::Disconnect
            }
            "mqtt_publish" => {
                expect_args("mqtt_publish", &args, 2)?;
                LocalCommand::Publish {
                    topic: args[0],
                    message: args[1],
                }
            }
            "mqtt_subscribe" => {
                expect_args("mqtt_subscribe", &args, 1)?;
                LocalCommand::Subscribe { topic: args[0] }
            }
            "mqtt_unsubscribe" => {
                expect_args("mqtt_unsubscribe", &args, 1)?;
                LocalCommand::Unsubscribe { topic: args[0] }
            }
            "get" => {
                expect_args("get", &args, 1)?;
                if args[0] == "mqtt" {
                    LocalCommand::List
                } else {
                    LocalCommand::Get { key: args[0] }
                }
            }
            "set" => {
                expect_args("set", &args, 2)?;
                LocalCommand::Set {
                    key: args[0],
                    value: args[1],
                }
            }
            "help" => LocalCommand::Help,
            other => return Err(ValidationError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

fn expect_args(command: &'static str, args: &[&str], expected: usize) -> Result<(), ValidationError> {
    if args.len() != expected {
        return Err(ValidationError::ArgCount {
            command,
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

/// Mesh command text for `cmd <code> <target>`
///
/// A code starting with `6` is a board-order request, everything else
/// addresses a board.
pub fn mesh_command_text(code: &str, target: &str) -> String {
    if code.starts_with('6') {
        format!("C{}O{}", code, target)
    } else {
        format!("C{}B{}", code, target)
    }
}
