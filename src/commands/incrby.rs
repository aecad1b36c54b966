use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::StringEngine;
use crate::frame::Frame;
use crate::Error;

/// Increments the number stored at key by increment. If the key does not exist, it is set to 0
/// before performing the operation. An error is returned if the key contains a value of the wrong
/// type or contains a string that can not be represented as integer. This operation is limited to
/// 64 bit signed integers.
///
/// Ref: <https://redis.io/docs/latest/commands/incrby/>
#[derive(Debug, PartialEq)]
pub struct IncrBy {
    pub key: Bytes,
    pub increment: i64,
}

impl Executable for IncrBy {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        match engine.incr(&self.key, self.increment) {
            Ok(value) => Ok(Frame::Integer(value)),
            Err(err) => Ok(error_frame(err)),
        }
    }
}

impl TryFrom<&mut CommandParser> for IncrBy {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let increment = parser.next_integer()?;

        Ok(Self { key, increment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{bulk, command, engine, ok, run};
    use crate::commands::Command;

    #[test]
    fn existing_key() {
        let engine = engine();
        assert_eq!(run(&engine, &["SET", "key1", "10"]), ok());

        let cmd = command(&["INCRBY", "key1", "5"]).unwrap();
        assert_eq!(
            cmd,
            Command::IncrBy(IncrBy {
                key: Bytes::from("key1"),
                increment: 5,
            })
        );

        assert_eq!(cmd.exec(&engine).unwrap(), Frame::Integer(15));
        assert_eq!(run(&engine, &["GET", "key1"]), bulk("15"));
    }

    #[test]
    fn negative_increment() {
        let engine = engine();

        assert_eq!(run(&engine, &["INCRBY", "key1", "-3"]), Frame::Integer(-3));
    }

    #[test]
    fn invalid_increment() {
        assert_eq!(
            command(&["INCRBY", "key1", "one"]),
            Err(CommandParserError::NotInteger)
        );
        assert_eq!(
            command(&["INCRBY", "key1", "99999999999999999999"]),
            Err(CommandParserError::NotInteger)
        );
    }

    #[test]
    fn overflow_leaves_value_untouched() {
        let engine = engine();
        assert_eq!(run(&engine, &["SET", "key1", "1"]), ok());

        assert_eq!(
            run(&engine, &["INCRBY", "key1", &i64::MAX.to_string()]),
            Frame::Error("ERR increment or decrement would overflow".to_string())
        );
        assert_eq!(run(&engine, &["GET", "key1"]), bulk("1"));
    }
}
