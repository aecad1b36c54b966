use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::StringEngine;
use crate::frame::Frame;
use crate::Error;

/// Atomically sets key to value and returns the old value stored at key. Returns `nil` when key
/// did not exist. The new value is stored without an expiration.
///
/// Ref: <https://redis.io/docs/latest/commands/getset/>
#[derive(Debug, PartialEq)]
pub struct Getset {
    pub key: Bytes,
    pub value: Bytes,
}

impl Executable for Getset {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        match engine.getset(&self.key, self.value) {
            Ok(Some(old)) => Ok(Frame::Bulk(old)),
            Ok(None) => Ok(Frame::Null),
            Err(err) => Ok(error_frame(err)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Getset {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let value = parser.next_bytes()?;

        Ok(Self { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{bulk, command, engine, ok, run};
    use crate::commands::Command;

    #[test]
    fn missing_key() {
        let engine = engine();

        let cmd = command(&["GETSET", "k", "v"]).unwrap();
        assert_eq!(
            cmd,
            Command::Getset(Getset {
                key: Bytes::from("k"),
                value: Bytes::from("v"),
            })
        );

        assert_eq!(cmd.exec(&engine).unwrap(), Frame::Null);
        assert_eq!(run(&engine, &["GET", "k"]), bulk("v"));
    }

    #[test]
    fn existing_key() {
        let engine = engine();

        assert_eq!(run(&engine, &["SET", "k", "old"]), ok());
        assert_eq!(run(&engine, &["GETSET", "k", "new"]), bulk("old"));
        assert_eq!(run(&engine, &["GET", "k"]), bulk("new"));
    }

    #[test]
    fn counter_reset() {
        let engine = engine();

        assert_eq!(run(&engine, &["INCR", "counter"]), Frame::Integer(1));
        assert_eq!(run(&engine, &["GETSET", "counter", "0"]), bulk("1"));
        assert_eq!(run(&engine, &["GET", "counter"]), bulk("0"));
    }
}
