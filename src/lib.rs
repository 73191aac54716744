// logfind - lib.rs
//
// Library entry point. The `logfind` binary is a thin CLI over these
// modules; integration tests use them directly.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
