mod logging;
mod paths;
mod transcript;

pub use logging::*;
pub use paths::*;
pub use transcript::*;
