//! Generation request data model: messages, schema metadata, input values.

mod message;
mod schema;
mod types;
mod value;

pub use message::*;
pub use schema::*;
pub use types::*;
pub use value::*;
