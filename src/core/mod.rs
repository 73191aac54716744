// logfind - core/mod.rs
//
// Core logic layer: levels, templates, timestamps, layouts, scanning.
// Works on strings and `BufRead`; must NOT open files or depend on app,
// platform, or the CLI.

pub mod export;
pub mod filter;
pub mod layout;
pub mod levels;
pub mod model;
pub mod scanner;
pub mod template;
pub mod timestamp;
pub mod window;
