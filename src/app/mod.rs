// logfind - app/mod.rs
//
// Application layer: find orchestration, named loggers, previews.
// Dependencies: core and platform layers.

pub mod find;
pub mod logger;
pub mod preview;
pub mod registry;
