//! Chat turn protocol: prompt building, reply parsing, the relay service and
//! the client-side workspace session.

pub mod prompt;
pub mod reply;
pub mod service;
pub mod session;
