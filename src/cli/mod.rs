pub mod args;
pub mod commands;

pub use args::{Cli, Commands, LocationSource};
pub use commands::run;
