use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::StringEngine;
use crate::frame::Frame;
use crate::Error;

/// Increments the number stored at key by one. If the key does not exist, it is set to 0 before
/// performing the operation. An error is returned if the key contains a value of the wrong type or
/// contains a string that can not be represented as integer. This operation is limited to 64 bit
/// signed integers. The time to live of the key, if any, is kept.
///
/// Ref: <https://redis.io/docs/latest/commands/incr/>
#[derive(Debug, PartialEq)]
pub struct Incr {
    pub key: Bytes,
}

impl Executable for Incr {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        match engine.incr(&self.key, 1) {
            Ok(value) => Ok(Frame::Integer(value)),
            Err(err) => Ok(error_frame(err)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Incr {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
