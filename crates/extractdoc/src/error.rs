use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
    Usage = 2,
    Read = 3,
    Command = 4,
    Destination = 5,
    Pattern = 6,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    FileRead { path: PathBuf, source: io::Error },

    #[error("failed to list directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to spawn `{command}`: {source}")]
    CommandSpawn { command: String, source: io::Error },

    #[error("command `{command}` failed in {working_dir} ({}): {stderr}", describe_status(*.status))]
    CommandExecution {
        command: String,
        working_dir: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    #[error("cannot write destination {path}: {source}")]
    DestinationWrite { path: PathBuf, source: io::Error },

    #[error("invalid directive marker '{marker}': {source}")]
    Marker {
        marker: String,
        source: regex::Error,
    },

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
}

impl ExtractError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileRead { .. } | Self::DirectoryRead { .. } => ExitCode::Read,
            Self::CommandSpawn { .. } | Self::CommandExecution { .. } => ExitCode::Command,
            Self::DestinationWrite { .. } => ExitCode::Destination,
            Self::Pattern { .. } => ExitCode::Pattern,
            Self::Marker { .. } => ExitCode::Failure,
        }
    }
}

fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;
