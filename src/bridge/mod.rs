//! Process bridge: subprocess spawning, stdin/stdout wiring, timeout and
//! failure handling.

mod error;
mod invoke;
mod spec;

pub use error::*;
pub use invoke::*;
pub use spec::*;
