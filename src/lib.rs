//! clibridge - run any CLI program as a text-generation backend.
//!
//! A generation request is encoded to a single stdin payload (structured JSON
//! or a plain role-tagged transcript), handed to a freshly spawned process,
//! and the process stdout is normalized back into completion strings or
//! structured field maps.

pub mod bridge;
pub mod client;
pub mod codec;
pub mod config;
pub mod request;
