use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::StringEngine;
use crate::frame::Frame;
use crate::Error;

/// Returns the values of all specified keys. For every key that does not hold a string value or
/// does not exist, the special value `nil` is returned. Because of this, the operation never
/// fails on type.
///
/// Ref: <https://redis.io/docs/latest/commands/mget/>
#[derive(Debug, PartialEq)]
pub struct Mget {
    pub keys: Vec<Bytes>,
}

impl Executable for Mget {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        let values = match engine.mget(&self.keys) {
            Ok(values) => values,
            Err(err) => return Ok(error_frame(err)),
        };

        let frames = values
            .into_iter()
            .map(|value| value.map_or(Frame::Null, Frame::Bulk))
            .collect();

        Ok(Frame::Array(frames))
    }
}

impl TryFrom<&mut CommandParser> for Mget {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut keys = vec![];

        loop {
            match parser.next_bytes() {
                Ok(key) => keys.push(key),
                Err(CommandParserError::EndOfStream) if !keys.is_empty() => {
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Self { keys })
    }
}
