pub mod command_runner;
pub mod git;

pub use command_runner::{CommandError, CommandRunner};
pub use git::GitCli;
