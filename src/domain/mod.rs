mod clock;
mod command;
mod tags;
mod timestamp;

pub use clock::*;
pub use command::*;
pub use tags::*;
pub use timestamp::*;
