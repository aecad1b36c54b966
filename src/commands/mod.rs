pub mod decr;
pub mod decrby;
pub mod executable;
pub mod get;
pub mod getset;
pub mod incr;
pub mod incrby;
pub mod mget;
pub mod mset;
pub mod ping;
pub mod set;
pub mod setex;
pub mod setnx;
pub mod strlen;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::engine::{parse_integer, StringEngine, StringError};
use crate::frame::Frame;
use crate::Error;

use decr::Decr;
use decrby::DecrBy;
use get::Get;
use getset::Getset;
use incr::Incr;
use incrby::IncrBy;
use mget::Mget;
use mset::Mset;
use ping::Ping;
use set::Set;
use setex::Setex;
use setnx::Setnx;
use strlen::Strlen;

#[derive(Debug, PartialEq)]
pub enum Command {
    Decr(Decr),
    DecrBy(DecrBy),
    Get(Get),
    Getset(Getset),
    Incr(Incr),
    IncrBy(IncrBy),
    Mget(Mget),
    Mset(Mset),
    Set(Set),
    Setex(Setex),
    Setnx(Setnx),
    Strlen(Strlen),

    Ping(Ping),
}

impl Executable for Command {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        match self {
            Command::Decr(cmd) => cmd.exec(engine),
            Command::DecrBy(cmd) => cmd.exec(engine),
            Command::Get(cmd) => cmd.exec(engine),
            Command::Getset(cmd) => cmd.exec(engine),
            Command::Incr(cmd) => cmd.exec(engine),
            Command::IncrBy(cmd) => cmd.exec(engine),
            Command::Mget(cmd) => cmd.exec(engine),
            Command::Mset(cmd) => cmd.exec(engine),
            Command::Ping(cmd) => cmd.exec(engine),
            Command::Set(cmd) => cmd.exec(engine),
            Command::Setex(cmd) => cmd.exec(engine),
            Command::Setnx(cmd) => cmd.exec(engine),
            Command::Strlen(cmd) => cmd.exec(engine),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = CommandParserError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the Redis server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                })
            }
        };

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        let command = match &command_name[..] {
            "decr" => Decr::try_from(&mut *parser).map(Command::Decr),
            "decrby" => DecrBy::try_from(&mut *parser).map(Command::DecrBy),
            "get" => Get::try_from(&mut *parser).map(Command::Get),
            "getset" => Getset::try_from(&mut *parser).map(Command::Getset),
            "incr" => Incr::try_from(&mut *parser).map(Command::Incr),
            "incrby" => IncrBy::try_from(&mut *parser).map(Command::IncrBy),
            "mget" => Mget::try_from(&mut *parser).map(Command::Mget),
            "mset" => Mset::try_from(&mut *parser).map(Command::Mset),
            "ping" => Ping::try_from(&mut *parser).map(Command::Ping),
            "set" => Set::try_from(&mut *parser).map(Command::Set),
            "setex" => Setex::try_from(&mut *parser).map(Command::Setex),
            "setnx" => Setnx::try_from(&mut *parser).map(Command::Setnx),
            "strlen" => Strlen::try_from(&mut *parser).map(Command::Strlen),
            _ => {
                return Err(CommandParserError::UnknownCommand {
                    command: command_name,
                })
            }
        };

        // Running out of arguments, or having some left over, means the arity is wrong.
        match command {
            Ok(command) if parser.is_empty() => Ok(command),
            Ok(_) | Err(CommandParserError::EndOfStream) => {
                Err(CommandParserError::WrongArity {
                    command: command_name,
                })
            }
            Err(err) => Err(err),
        }
    }
}

pub struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self.next()?;

        match command_name {
            Frame::Simple(s) => Ok(s.to_lowercase()),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next(&mut self) -> Result<Frame, CommandParserError> {
        self.parts.next().ok_or(CommandParserError::EndOfStream)
    }

    fn is_empty(&self) -> bool {
        self.parts.len() == 0
    }

    fn next_string(&mut self) -> Result<String, CommandParserError> {
        match self.next()? {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        match self.next()? {
            Frame::Integer(i) => Ok(i),
            Frame::Simple(string) => {
                parse_integer(string.as_bytes()).ok_or(CommandParserError::NotInteger)
            }
            Frame::Bulk(bytes) => parse_integer(&bytes).ok_or(CommandParserError::NotInteger),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "integer".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        match self.next()? {
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// A strictly positive expiration, in the unit of the option it belongs to. `0` is rejected,
    /// it would read as "no expiration" further down.
    fn next_expire(&mut self, command: &str) -> Result<u64, CommandParserError> {
        match self.next_integer()? {
            n if n > 0 => Ok(n as u64),
            _ => Err(CommandParserError::InvalidExpireTime {
                command: command.to_string(),
            }),
        }
    }
}

/// Errors detected while turning a frame into a [`Command`], before the engine is involved.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("ERR protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("ERR unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongArity { command: String },
    #[error("ERR syntax error")]
    Syntax,
    #[error("ERR invalid expire time in '{command}' command")]
    InvalidExpireTime { command: String },
    #[error("ERR value is not an integer or out of range")]
    NotInteger,
    #[error("ERR protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("ERR protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}

impl From<CommandParserError> for Frame {
    fn from(err: CommandParserError) -> Self {
        Frame::Error(err.to_string())
    }
}

/// The reply for an engine error. Condition failures are not errors and are handled by the
/// commands that have conditions.
pub(crate) fn error_frame(err: StringError) -> Frame {
    Frame::Error(err.to_string())
}
