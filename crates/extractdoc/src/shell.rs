use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{ExtractError, ExtractResult};

/// Runs an external command and captures its standard output.
pub trait CommandRunner {
    fn run(&self, command: &str, working_dir: &Path) -> ExtractResult<String>;
}

/// Runs commands through the platform shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, working_dir: &Path) -> ExtractResult<String> {
        tracing::debug!(command, dir = %working_dir.display(), "running shell command");

        let output = shell(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ExtractError::CommandSpawn {
                command: command.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractError::CommandExecution {
                command: command.to_string(),
                working_dir: working_dir.to_path_buf(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
