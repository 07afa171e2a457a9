use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;

use log::{debug, error, warn};
use nix::fcntl::OFlag;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{self, dup2, execvp, fork, pipe2, setpgid, ForkResult, Pid};

use super::builtins::{builtin_cd, Builtin};
use super::error::ExecError;
use super::job_manager::{CommandResult, Job, JobManager};
use crate::shell::parser::{Command, Direction, Program};

/// What the shell loop should do once a line has been executed.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Foreground pipeline finished (or the line only ran built-ins).
    Completed(CommandResult),
    /// Pipeline left running in process group `pgid` as job `index`.
    Background { index: usize, pgid: i32 },
    /// The `exit` built-in was reached.
    Exit,
}

/// Files named by the line's redirections, opened once before any stage is
/// spawned.
struct Redirections {
    input: Option<File>,
    output: Option<File>,
}

impl Redirections {
    fn open(command: &Command) -> Result<Self, ExecError> {
        let input = match command.redirection(Direction::Input) {
            Some(path) => Some(
                File::open(expand_path(path)).map_err(|source| ExecError::Redirect {
                    path: path.to_string(),
                    source,
                })?,
            ),
            None => None,
        };
        let output = match command.redirection(Direction::Output) {
            Some(path) => Some(
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(0o644)
                    .open(expand_path(path))
                    .map_err(|source| ExecError::Redirect {
                        path: path.to_string(),
                        source,
                    })?,
            ),
            None => None,
        };
        Ok(Self { input, output })
    }
}

fn expand_path(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}

/// Everything a child needs after `fork`, built beforehand so the child
/// only duplicates descriptors and calls `execvp`.
struct PreparedStage {
    argv: Vec<CString>,
    not_found: Vec<u8>,
}

impl PreparedStage {
    fn new(program: &Program) -> Result<Self, ExecError> {
        let argv = program
            .argv
            .iter()
            .map(|arg| CString::new(arg.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ExecError::InvalidArgument(program.argv.join(" ")))?;
        let not_found = format!("Command not found: {}\n", program.name()).into_bytes();
        Ok(Self { argv, not_found })
    }
}

/// Writes `message` straight to fd 2 and terminates a forked child. Nothing
/// buffered in the parent's image is flushed.
fn child_fail(message: &[u8], status: i32) -> ! {
    let _ = unistd::write(io::stderr(), message);
    unsafe { libc::_exit(status) }
}

/// Both ends are close-on-exec; `dup2` onto fd 0 or 1 clears the flag for
/// the copy a stage actually uses.
fn open_pipe() -> Result<(OwnedFd, OwnedFd), ExecError> {
    pipe2(OFlag::O_CLOEXEC).map_err(ExecError::Pipe)
}

/// A pipe whose write end is already closed; reading it yields end of file.
fn closed_pipe() -> Result<OwnedFd, ExecError> {
    let (read, write) = open_pipe()?;
    drop(write);
    Ok(read)
}

pub struct Executor {
    jobs: JobManager,
}

impl Executor {
    pub fn new(jobs: JobManager) -> Self {
        Self { jobs }
    }

    /// Reaps finished background jobs.
    pub fn reap_background(&mut self) -> Vec<Job> {
        self.jobs.reap()
    }

    pub fn execute(&mut self, command: &Command) -> Result<Outcome, ExecError> {
        debug!("executing {:?}", command);

        let redirections = Redirections::open(command)?;
        let stages = command
            .programs
            .iter()
            .map(PreparedStage::new)
            .collect::<Result<Vec<_>, _>>()?;

        let mut spawned = Vec::new();
        let mut pgid = Pid::from_raw(0);
        let result = self.spawn_pipeline(command, &stages, &redirections, &mut spawned, &mut pgid);
        drop(redirections);

        match result {
            Ok(true) => Ok(Outcome::Exit),
            Ok(false) if spawned.is_empty() => Ok(Outcome::Completed(CommandResult::new())),
            Ok(false) if command.background => {
                let index = self
                    .jobs
                    .add_job(pgid.as_raw(), spawned, command.to_string());
                Ok(Outcome::Background {
                    index,
                    pgid: pgid.as_raw(),
                })
            }
            Ok(false) => {
                let result = self.jobs.wait_fg(spawned[0], &spawned);
                debug!(
                    "foreground pipeline `{}` (pgid {}) finished with {}",
                    command, result.pgid, result.status
                );
                Ok(Outcome::Completed(result))
            }
            Err(e) => {
                error!("`{}` aborted: {}", command, e);
                if !spawned.is_empty() {
                    // stages already running still have to be reaped
                    self.jobs
                        .add_job(spawned[0], spawned, command.to_string());
                }
                Err(e)
            }
        }
    }

    /// Spawns every stage left to right. Returns `Ok(true)` when the `exit`
    /// built-in was reached. Pids of spawned stages are pushed onto
    /// `spawned` as they start, so the caller sees them even on error.
    fn spawn_pipeline(
        &self,
        command: &Command,
        stages: &[PreparedStage],
        redirections: &Redirections,
        spawned: &mut Vec<i32>,
        pgid: &mut Pid,
    ) -> Result<bool, ExecError> {
        let last = command.programs.len().saturating_sub(1);
        let mut prev_read: Option<OwnedFd> = None;

        for (i, (program, stage)) in command.programs.iter().zip(stages).enumerate() {
            match Builtin::lookup(program) {
                Some(Builtin::Exit) => {
                    debug!("builtin exit");
                    return Ok(true);
                }
                Some(Builtin::Cd) => {
                    debug!("builtin {:?}", program.argv);
                    if let Err(e) = builtin_cd(program) {
                        warn!("{}", e);
                        eprintln!("{}", e);
                    }
                    drop(prev_read.take());
                    if i < last {
                        prev_read = Some(closed_pipe()?);
                    }
                    continue;
                }
                None => {}
            }

            let (next_read, next_write) = if i < last {
                let (read, write) = open_pipe()?;
                (Some(read), Some(write))
            } else {
                (None, None)
            };

            let stdin_fd: Option<RawFd> = match &prev_read {
                Some(fd) => Some(fd.as_raw_fd()),
                None if i == 0 => redirections.input.as_ref().map(AsRawFd::as_raw_fd),
                None => None,
            };
            let stdout_fd: Option<RawFd> = match &next_write {
                Some(fd) => Some(fd.as_raw_fd()),
                None if i == last => redirections.output.as_ref().map(AsRawFd::as_raw_fd),
                None => None,
            };

            match unsafe { fork() }.map_err(ExecError::Spawn)? {
                ForkResult::Child => {
                    if command.background {
                        let _ = setpgid(Pid::from_raw(0), *pgid);
                    }
                    if let Some(fd) = stdin_fd {
                        if dup2(fd, libc::STDIN_FILENO).is_err() {
                            child_fail(b"Pipe read end failed\n", 1);
                        }
                    }
                    if let Some(fd) = stdout_fd {
                        if dup2(fd, libc::STDOUT_FILENO).is_err() {
                            child_fail(b"Pipe write end failed\n", 1);
                        }
                    }
                    // only fds 0, 1 and 2 survive into the new image
                    drop(prev_read);
                    drop(next_read);
                    drop(next_write);

                    // the shell runs with SIGPIPE ignored; stages must not inherit that
                    let _ = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) };

                    let _ = execvp(&stage.argv[0], &stage.argv);
                    child_fail(&stage.not_found, 127);
                }
                ForkResult::Parent { child } => {
                    if command.background {
                        if pgid.as_raw() == 0 {
                            *pgid = child;
                        }
                        // either side may lose the race against exec
                        let _ = setpgid(child, *pgid);
                    }
                    debug!("spawned {} for {:?}", child, program.argv);
                    spawned.push(child.as_raw());

                    drop(next_write);
                    prev_read = next_read;
                }
            }
        }

        Ok(false)
    }
}
