use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::set::Ttl;
use crate::commands::{error_frame, CommandParser, CommandParserError};
use crate::engine::{SetOptions, StringEngine};
use crate::frame::Frame;
use crate::guard;
use crate::Error;

/// Set key to hold the string value and set key to timeout after a given number of seconds.
///
/// Ref: <https://redis.io/docs/latest/commands/setex/>
#[derive(Debug, PartialEq)]
pub struct Setex {
    pub key: Bytes,
    pub seconds: u64,
    pub value: Bytes,
}

impl Executable for Setex {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error> {
        let opts = SetOptions {
            expire_at_ms: Ttl::Ex(self.seconds).expire_at_ms(guard::now_ms()),
            ..Default::default()
        };

        match engine.set(&self.key, self.value, opts) {
            Ok(()) => Ok(Frame::Simple("OK".to_string())),
            Err(err) => Ok(error_frame(err)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Setex {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let seconds = parser.next_expire("setex")?;
        let value = parser.next_bytes()?;

        Ok(Self {
            key,
            seconds,
            value,
        })
    }
}
