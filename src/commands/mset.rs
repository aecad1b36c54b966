use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::StringEngine;
use crate::frame::Frame;
use crate::Error;

/// Sets the given keys to their respective values. MSET replaces existing values with new values,
/// just as regular SET. All keys are set in one transaction, so clients never see some of the keys
/// updated while others are unchanged. When a key is repeated the last value wins.
///
/// Ref: <https://redis.io/docs/latest/commands/mset/>
#[derive(Debug, PartialEq)]
pub struct Mset {
    pub pairs: Vec<(Bytes, Bytes)>,
}

impl Executable for Mset {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        match engine.mset(self.pairs) {
            Ok(()) => Ok(Frame::Simple("OK".to_string())),
            Err(err) => Ok(error_frame(err)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Mset {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut pairs = vec![];

        loop {
            let key = match parser.next_bytes() {
                Ok(key) => key,
                Err(CommandParserError::EndOfStream) if !pairs.is_empty() => {
                    break;
                }
                Err(err) => return Err(err),
            };

            // A key without a value surfaces as EndOfStream, which is reported as a wrong arity.
            let value = parser.next_bytes()?;

            pairs.push((key, value));
        }

        Ok(Self { pairs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{bulk, command, engine, run};
    use crate::commands::Command;

    #[test]
    fn parse() {
        assert_eq!(
            command(&["MSET", "a", "1", "b", "2"]),
            Ok(Command::Mset(Mset {
                pairs: vec![
                    (Bytes::from("a"), Bytes::from("1")),
                    (Bytes::from("b"), Bytes::from("2")),
                ]
            }))
        );
    }

    #[test]
    fn wrong_arity() {
        for parts in [&["MSET"][..], &["MSET", "a"][..], &["MSET", "a", "1", "b"][..]] {
            assert_eq!(
                command(parts),
                Err(CommandParserError::WrongArity {
                    command: "mset".to_string()
                })
            );
        }
    }

    #[test]
    fn odd_arguments_leave_keys_untouched() {
        let engine = engine();

        assert_eq!(
            run(&engine, &["MSET", "a", "1", "b"]),
            Frame::Error("ERR wrong number of arguments for 'mset' command".to_string())
        );
        assert_eq!(run(&engine, &["GET", "a"]), Frame::Null);
    }

    #[test]
    fn replaces_existing_values() {
        let engine = engine();

        assert_eq!(
            run(&engine, &["SET", "a", "old", "EX", "100"]),
            Frame::Simple("OK".to_string())
        );
        assert_eq!(
            run(&engine, &["MSET", "a", "new", "b", "2"]),
            Frame::Simple("OK".to_string())
        );
        assert_eq!(
            run(&engine, &["MGET", "a", "b"]),
            Frame::Array(vec![bulk("new"), bulk("2")])
        );
    }
}
