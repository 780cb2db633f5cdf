//! Library half of the `provup` binary: config file handling and output rendering.

pub mod config;
pub mod render;
