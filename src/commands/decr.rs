use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::StringEngine;
use crate::frame::Frame;
use crate::Error;

/// Decrements the number stored at key by one. If the key does not exist, it is set to 0 before
/// performing the operation.
///
/// Ref: <https://redis.io/docs/latest/commands/decr/>
#[derive(Debug, PartialEq)]
pub struct Decr {
    pub key: Bytes,
}

impl Executable for Decr {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        match engine.incr(&self.key, -1) {
            Ok(value) => Ok(Frame::Integer(value)),
            Err(err) => Ok(error_frame(err)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Decr {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
