use std::io;

use nix::errno::Errno;
use thiserror::Error;

/// Failures that abort the current line before or while its stages are
/// spawned. None of them end the shell.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Could not open file {path}: {source}")]
    Redirect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Pipe construction failed: {0}")]
    Pipe(Errno),
    #[error("Child process fork failed: {0}")]
    Spawn(Errno),
    #[error("invalid argument {0:?}: contains a NUL byte")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("cd: HOME not set")]
    HomeNotSet,
    #[error("cd: {path}: {source}")]
    ChangeDir {
        path: String,
        #[source]
        source: io::Error,
    },
}
