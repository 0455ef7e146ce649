//! CommandRunner: whitelisted subprocess execution
//!
//! Only `npm` and `git` may be spawned, arguments are passed as a vector and
//! never interpolated into a shell string, and the working directory is
//! validated before each spawn. Commands run to completion; the caller owns
//! any timeout policy.

use crate::core::traits::{ProcessRunner, RunContext, StdioMode};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Allowed commands whitelist.
///
/// Everything this tool orchestrates goes through npm or git; anything else
/// is rejected before a process is spawned.
const ALLOWED_COMMANDS: &[&str] = &["npm", "git"];

/// How much trailing stderr to keep in failure messages
const STDERR_TAIL_BYTES: usize = 2048;

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// The process could not be spawned or awaited
    #[error("Failed to execute `{command}`: {message}")]
    ExecutionFailed { command: String, message: String },

    /// The process ran and exited unsuccessfully
    #[error("`{command}` exited with status {status}{stderr}")]
    ExitedWithFailure {
        command: String,
        status: i32,
        stderr: String,
    },
}

/// Subprocess runner used by the pipeline and the change detector
#[derive(Debug, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }

    fn validate(program: &str, ctx: &RunContext) -> Result<(), CommandError> {
        if !ALLOWED_COMMANDS.contains(&program) {
            return Err(CommandError::CommandNotAllowed(program.to_string()));
        }
        if !ctx.cwd.exists() {
            return Err(CommandError::InvalidWorkingDirectory(ctx.cwd.clone()));
        }
        Ok(())
    }

    // Windows-specific: npm is npm.cmd, not an .exe
    #[cfg(target_os = "windows")]
    fn program_name(program: &str) -> String {
        if program == "npm" {
            format!("{}.cmd", program)
        } else {
            program.to_string()
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn program_name(program: &str) -> String {
        program.to_string()
    }

    fn command_line(program: &str, args: &[String]) -> String {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn stderr_tail(stderr: &[u8]) -> String {
        let text = String::from_utf8_lossy(stderr);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        let mut start = trimmed.len().saturating_sub(STDERR_TAIL_BYTES);
        while start > 0 && !trimmed.is_char_boundary(start) {
            start -= 1;
        }
        format!(": {}", &trimmed[start..])
    }

    fn base_command(program: &str, args: &[String], ctx: &RunContext) -> Command {
        let mut command = Command::new(Self::program_name(program));
        command.args(args).current_dir(&ctx.cwd).envs(&ctx.env);
        command
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        ctx: &RunContext,
    ) -> Result<(), CommandError> {
        Self::validate(program, ctx)?;
        let command_line = Self::command_line(program, args);

        match ctx.stdio {
            StdioMode::Inherit => {
                let status = Self::base_command(program, args, ctx)
                    .status()
                    .await
                    .map_err(|e| CommandError::ExecutionFailed {
                        command: command_line.clone(),
                        message: e.to_string(),
                    })?;

                if !status.success() {
                    return Err(CommandError::ExitedWithFailure {
                        command: command_line,
                        status: status.code().unwrap_or(-1),
                        stderr: String::new(),
                    });
                }
            }
            StdioMode::Quiet => {
                let output = Self::base_command(program, args, ctx)
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .await
                    .map_err(|e| CommandError::ExecutionFailed {
                        command: command_line.clone(),
                        message: e.to_string(),
                    })?;

                if !output.status.success() {
                    return Err(CommandError::ExitedWithFailure {
                        command: command_line,
                        status: output.status.code().unwrap_or(-1),
                        stderr: Self::stderr_tail(&output.stderr),
                    });
                }
            }
        }

        Ok(())
    }

    async fn run_capture(
        &self,
        program: &str,
        args: &[String],
        ctx: &RunContext,
    ) -> Result<String, CommandError> {
        Self::validate(program, ctx)?;
        let command_line = Self::command_line(program, args);

        let output = Self::base_command(program, args, ctx)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CommandError::ExecutionFailed {
                command: command_line.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(CommandError::ExitedWithFailure {
                command: command_line,
                status: output.status.code().unwrap_or(-1),
                stderr: Self::stderr_tail(&output.stderr),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_rejected_command() {
        let temp_dir = TempDir::new().unwrap();
        let runner = CommandRunner::new();
        let ctx = RunContext::new(temp_dir.path());

        let result = runner.run("rm", &["-rf".to_string(), "/".to_string()], &ctx).await;
        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_rejected_shell() {
        let temp_dir = TempDir::new().unwrap();
        let runner = CommandRunner::new();
        let ctx = RunContext::new(temp_dir.path());

        let result = runner.run_capture("sh", &["-c".to_string(), "true".to_string()], &ctx).await;
        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_invalid_working_directory() {
        let runner = CommandRunner::new();
        let ctx = RunContext::new("/nonexistent/directory/that/does/not/exist");

        let result = runner.run("npm", &["--version".to_string()], &ctx).await;
        assert!(matches!(
            result,
            Err(CommandError::InvalidWorkingDirectory(_))
        ));
    }

    #[test]
    fn test_command_line_rendering() {
        let line = CommandRunner::command_line(
            "npm",
            &["version".to_string(), "patch".to_string()],
        );
        assert_eq!(line, "npm version patch");
    }

    #[test]
    fn test_stderr_tail_empty() {
        assert_eq!(CommandRunner::stderr_tail(b"  \n"), "");
    }

    #[test]
    fn test_stderr_tail_formats() {
        let tail = CommandRunner::stderr_tail(b"npm ERR! code E403\n");
        assert!(tail.starts_with(": "));
        assert!(tail.contains("E403"));
    }
}
