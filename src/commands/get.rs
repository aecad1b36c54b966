use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::StringEngine;
use crate::frame::Frame;
use crate::Error;

/// Get the value of `key`. If the key does not exist the special value `nil` is returned. An error
/// is returned if the value stored at `key` is not a string.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: Bytes,
}

impl Executable for Get {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        match engine.get(&self.key) {
            Ok(Some(value)) => Ok(Frame::Bulk(value)),
            Ok(None) => Ok(Frame::Null),
            Err(err) => Ok(error_frame(err)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Get {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{bulk, command, engine, ok, run};
    use crate::commands::Command;

    #[test]
    fn existing_key() {
        let cmd = command(&["GET", "key1"]).unwrap();

        assert_eq!(
            cmd,
            Command::Get(Get {
                key: Bytes::from("key1")
            })
        );

        let engine = engine();
        assert_eq!(run(&engine, &["SET", "key1", "1"]), ok());

        let result = cmd.exec(&engine).unwrap();

        assert_eq!(result, bulk("1"));
    }

    #[test]
    fn missing_key() {
        let engine = engine();

        assert_eq!(run(&engine, &["GET", "key1"]), Frame::Null);
    }

    #[test]
    fn binary_key() {
        let engine = engine();
        let key = Bytes::from_static(b"\x00\xffkey");
        engine
            .set(&key, Bytes::from("v"), Default::default())
            .unwrap();

        let res = Get { key }.exec(&engine).unwrap();

        assert_eq!(res, bulk("v"));
    }
}
