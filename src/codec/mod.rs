//! Payload codec: request encoding and process output decoding.

mod decode;
mod events;
mod payload;

pub use decode::*;
pub use events::*;
pub use payload::*;
