mod args;
mod commands;
mod handlers;
mod logging;
mod views;

pub use args::{Cli, Commands, LogLevel};
pub use commands::run;
