use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::{SetOptions, StringEngine, StringError};
use crate::frame::Frame;
use crate::guard;
use crate::Error;

/// Set key to hold the string value. If key already holds a string value, it is overwritten, and
/// any previous time to live is discarded. Keys holding another type are never overwritten.
///
/// Options:
///
/// * `EX seconds` -- Set the specified expire time, in seconds (a positive integer).
/// * `PX milliseconds` -- Set the specified expire time, in milliseconds (a positive integer).
/// * `NX` -- Only set the key if it does not already exist.
/// * `XX` -- Only set the key if it already exists.
///
/// Replies `OK`, or `nil` when the `NX` or `XX` condition was not met.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
    pub ttl: Option<Ttl>,
    pub condition: Option<Condition>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Ttl {
    Ex(u64),
    Px(u64),
}

impl Ttl {
    /// The absolute expiration, in epoch milliseconds, of a key set at `now_ms`.
    pub fn expire_at_ms(&self, now_ms: u64) -> u64 {
        match self {
            Ttl::Ex(seconds) => (now_ms / 1000)
                .saturating_add(*seconds)
                .saturating_mul(1000),
            Ttl::Px(millis) => now_ms.saturating_add(*millis),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Condition {
    Nx,
    Xx,
}

impl Set {
    pub(crate) fn options(&self) -> SetOptions {
        SetOptions {
            expire_at_ms: self
                .ttl
                .map_or(0, |ttl| ttl.expire_at_ms(guard::now_ms())),
            nx: self.condition == Some(Condition::Nx),
            xx: self.condition == Some(Condition::Xx),
        }
    }
}

impl Executable for Set {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        let opts = self.options();

        match engine.set(&self.key, self.value, opts) {
            Ok(()) => Ok(Frame::Simple("OK".to_string())),
            Err(StringError::ConditionFailed) => Ok(Frame::Null),
            Err(err) => Ok(error_frame(err)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let value = parser.next_bytes()?;

        let mut ttl = None;
        let mut condition = None;

        loop {
            let option = match parser.next_string() {
                Ok(option) => option,
                Err(CommandParserError::EndOfStream) => {
                    break;
                }
                Err(err) => return Err(err),
            };

            match option.to_uppercase().as_str() {
                "EX" if ttl.is_none() => {
                    ttl = Some(Ttl::Ex(expire_argument(parser)?));
                }
                "PX" if ttl.is_none() => {
                    ttl = Some(Ttl::Px(expire_argument(parser)?));
                }
                "NX" if condition.is_none() => {
                    condition = Some(Condition::Nx);
                }
                "XX" if condition.is_none() => {
                    condition = Some(Condition::Xx);
                }
                _ => return Err(CommandParserError::Syntax),
            }
        }

        Ok(Self {
            key,
            value,
            ttl,
            condition,
        })
    }
}

// A missing expire value is a syntax error, not an arity one.
fn expire_argument(parser: &mut CommandParser) -> Result<u64, CommandParserError> {
    match parser.next_expire("set") {
        Err(CommandParserError::EndOfStream) => Err(CommandParserError::Syntax),
        res => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{bulk, command, engine, ok, run};
    use crate::commands::Command;

    #[test]
    fn parse_plain() {
        assert_eq!(
            command(&["SET", "foo", "baz"]),
            Ok(Command::Set(Set {
                key: Bytes::from("foo"),
                value: Bytes::from("baz"),
                ttl: None,
                condition: None,
            }))
        );
    }

    #[test]
    fn parse_options() {
        assert_eq!(
            command(&["SET", "foo", "baz", "px", "1500", "NX"]),
            Ok(Command::Set(Set {
                key: Bytes::from("foo"),
                value: Bytes::from("baz"),
                ttl: Some(Ttl::Px(1500)),
                condition: Some(Condition::Nx),
            }))
        );
        assert_eq!(
            command(&["SET", "foo", "baz", "XX", "EX", "10"]),
            Ok(Command::Set(Set {
                key: Bytes::from("foo"),
                value: Bytes::from("baz"),
                ttl: Some(Ttl::Ex(10)),
                condition: Some(Condition::Xx),
            }))
        );
    }

    #[test]
    fn parse_conflicting_options() {
        for parts in [
            &["SET", "k", "v", "NX", "XX"][..],
            &["SET", "k", "v", "EX", "1", "PX", "1"][..],
            &["SET", "k", "v", "EX"][..],
            &["SET", "k", "v", "KEEPTTL"][..],
        ] {
            assert_eq!(command(parts), Err(CommandParserError::Syntax));
        }
    }

    #[test]
    fn parse_invalid_expire() {
        for ttl in ["0", "-5"] {
            for unit in ["EX", "PX"] {
                assert_eq!(
                    command(&["SET", "k", "v", unit, ttl]),
                    Err(CommandParserError::InvalidExpireTime {
                        command: "set".to_string()
                    })
                );
            }
        }

        assert_eq!(
            command(&["SET", "k", "v", "EX", "soon"]),
            Err(CommandParserError::NotInteger)
        );
    }

    #[test]
    fn expire_at() {
        let now = 1_700_000_000_123;

        assert_eq!(Ttl::Ex(10).expire_at_ms(now), 1_700_000_010_000);
        assert_eq!(Ttl::Px(10).expire_at_ms(now), 1_700_000_000_133);
        assert_eq!(Ttl::Px(u64::MAX).expire_at_ms(now), u64::MAX);
    }

    #[test]
    fn set_and_overwrite() {
        let engine = engine();

        assert_eq!(run(&engine, &["SET", "k", "1"]), ok());
        assert_eq!(run(&engine, &["SET", "k", "2"]), ok());
        assert_eq!(run(&engine, &["GET", "k"]), bulk("2"));
    }

    #[test]
    fn conditions() {
        let engine = engine();

        assert_eq!(run(&engine, &["SET", "k", "1", "XX"]), Frame::Null);
        assert_eq!(run(&engine, &["GET", "k"]), Frame::Null);
        assert_eq!(run(&engine, &["SET", "k", "2", "NX"]), ok());
        assert_eq!(run(&engine, &["SET", "k", "3", "NX"]), Frame::Null);
        assert_eq!(run(&engine, &["SET", "k", "4", "XX"]), ok());
        assert_eq!(run(&engine, &["GET", "k"]), bulk("4"));
    }

    #[test]
    fn with_ttl_is_readable() {
        let engine = engine();

        assert_eq!(run(&engine, &["SET", "k", "v", "EX", "100"]), ok());
        assert_eq!(run(&engine, &["GET", "k"]), bulk("v"));
    }

    #[test]
    fn expires() {
        let engine = engine();

        assert_eq!(run(&engine, &["SET", "k", "v", "PX", "1"]), ok());
        std::thread::sleep(std::time::Duration::from_millis(10));

        assert_eq!(run(&engine, &["GET", "k"]), Frame::Null);
        assert_eq!(run(&engine, &["SET", "k", "w", "NX"]), ok());
        assert_eq!(run(&engine, &["GET", "k"]), bulk("w"));
    }
}
