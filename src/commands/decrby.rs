use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::{StringEngine, StringError};
use crate::frame::Frame;
use crate::Error;

/// Decrements the number stored at key by decrement. If the key does not exist, it is set to 0
/// before performing the operation.
///
/// Ref: <https://redis.io/docs/latest/commands/decrby/>
#[derive(Debug, PartialEq)]
pub struct DecrBy {
    pub key: Bytes,
    pub decrement: i64,
}

impl Executable for DecrBy {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        // i64::MIN has no positive counterpart.
        let step = match self.decrement.checked_neg() {
            Some(step) => step,
            None => return Ok(error_frame(StringError::Overflow)),
        };

        match engine.incr(&self.key, step) {
            Ok(value) => Ok(Frame::Integer(value)),
            Err(err) => Ok(error_frame(err)),
        }
    }
}

impl TryFrom<&mut CommandParser> for DecrBy {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let decrement = parser.next_integer()?;

        Ok(Self { key, decrement })
    }
}
