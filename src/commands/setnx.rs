use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::{SetOptions, StringEngine, StringError};
use crate::frame::Frame;
use crate::Error;

/// Set key to hold string value if key does not exist. In that case, it is equal to SET. When key
/// already holds a value, no operation is performed. SETNX is short for "SET if Not eXists".
///
/// Replies `1` if the key was set and `0` if it already existed. Any other failure, a write
/// conflict that could not be resolved included, is an error reply.
///
/// Ref: <https://redis.io/docs/latest/commands/setnx/>
#[derive(Debug, PartialEq)]
pub struct Setnx {
    pub key: Bytes,
    pub value: Bytes,
}

impl Executable for Setnx {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        let opts = SetOptions {
            nx: true,
            ..Default::default()
        };

        let res = match engine.set(&self.key, self.value, opts) {
            Ok(()) => Frame::Integer(1),
            Err(StringError::ConditionFailed) => Frame::Integer(0),
            Err(err) => error_frame(err),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Setnx {
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
    fn when_key_does_not_exists() {
        let engine = engine();

        let cmd = command(&["SETNX", "key1", "1"]).unwrap();

        assert_eq!(
            cmd,
            Command::Setnx(Setnx {
                key: Bytes::from("key1"),
                value: Bytes::from("1")
            })
        );

        let res = cmd.exec(&engine).unwrap();

        assert_eq!(res, Frame::Integer(1));
        assert_eq!(run(&engine, &["GET", "key1"]), bulk("1"));
    }

    #[test]
    fn when_key_already_exists() {
        let engine = engine();

        assert_eq!(run(&engine, &["SET", "key1", "1"]), ok());

        assert_eq!(run(&engine, &["SETNX", "key1", "2"]), Frame::Integer(0));
        assert_eq!(run(&engine, &["GET", "key1"]), bulk("1"));
    }
}
