use crate::engine::StringEngine;
use crate::frame::Frame;
use crate::Error;

pub trait Executable {
    fn exec(self, engine: &StringEngine) -> Result<Frame, Error>;
}
