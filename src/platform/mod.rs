// logfind - platform/mod.rs
//
// Platform layer: config directory resolution, config.toml, file handling.
// Dependencies: standard library, directories, serde/toml.

pub mod config;
pub mod fs;
