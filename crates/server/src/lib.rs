//! HTTP boundary adapters for the nanolog storage core, split into a
//! library so integration tests can build an `actix-web` service directly
//! without going through the CLI entry point in `main.rs`.

pub mod api;
pub mod error;
pub mod state;
