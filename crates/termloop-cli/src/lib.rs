mod args;
mod commands;
pub mod config;
pub mod console;

pub use args::Cli;
pub use commands::run;
