use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::StringEngine;
use crate::frame::Frame;
use crate::Error;

/// Returns the length of the string value stored at key. An error is returned when key holds a
/// non-string value.
///
/// Ref: <https://redis.io/docs/latest/commands/strlen/>
#[derive(Debug, PartialEq)]
pub struct Strlen {
    pub key: Bytes,
}

impl Executable for Strlen {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        match engine.strlen(&self.key) {
            Ok(len) => Ok(Frame::Integer(len as i64)),
            Err(err) => Ok(error_frame(err)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Strlen {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
