pub mod commands;
pub mod deploy;
pub mod display;

pub use self::commands::{CliArgs, Commands};
