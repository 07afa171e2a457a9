use std::fmt;

use log::{debug, error};
use nix::errno::Errno;
use nix::sys::wait::waitpid;
use nix::sys::wait::WaitPidFlag as WF;
use nix::sys::wait::WaitStatus as WS;
use nix::unistd::Pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Done,
    Killed,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub pgid: i32,
    /// Stages that have not been reaped yet, in pipeline order.
    pub pids: Vec<i32>,
    pub index: usize,
    pub command: String,
    pub status: JobStatus,
    pub is_current: bool,
    pub is_previous: bool,
}

impl Job {
    fn new(pgid: i32, pids: Vec<i32>, index: usize, command: String) -> Self {
        Self {
            pgid,
            pids,
            index,
            command,
            status: JobStatus::Running,
            is_current: false,
            is_previous: false,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Killed => "killed",
        };
        let mark = if self.is_current {
            "+"
        } else if self.is_previous {
            "-"
        } else {
            " "
        };
        write!(f, "[{}]{} {} {}", self.index, mark, status, self.command)
    }
}

/// Outcome of waiting for a foreground pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub pgid: i32,
    pub status: i32,
}

impl CommandResult {
    pub fn new() -> CommandResult {
        CommandResult::default()
    }

    pub fn from_status(pgid: i32, status: i32) -> CommandResult {
        CommandResult { pgid, status }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Exit code of a finished child, shell style: the exit status, or 128 plus
/// the signal number. `None` while the child is still running.
fn finished_status(ws: WS) -> Option<i32> {
    match ws {
        WS::Exited(_, status) => Some(status),
        WS::Signaled(_, sig, _) => Some(128 + sig as i32),
        _ => None,
    }
}

/// Status reported for a pid that could not be waited for.
const WAIT_FAILED: i32 = 1;

/// Registry of background pipelines. Every pid handed to it is eventually
/// reaped by `reap`, so finished background stages never linger as zombies.
#[derive(Default)]
pub struct JobManager {
    jobs: Vec<Job>,
}

impl JobManager {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    fn find_available_index(&self) -> usize {
        let mut index = 1;
        while self.jobs.iter().any(|job| job.index == index) {
            index += 1;
        }
        index
    }

    pub fn add_job(&mut self, pgid: i32, pids: Vec<i32>, command: String) -> usize {
        let index = self.find_available_index();
        debug!("job [{}] pgid {} pids {:?}: {}", index, pgid, pids, command);
        self.jobs.push(Job::new(pgid, pids, index, command));
        self.update_marks(index);
        index
    }

    fn remove_job(&mut self, index: usize) -> Option<Job> {
        let pos = self.jobs.iter().position(|job| job.index == index)?;
        let job = self.jobs.remove(pos);

        if job.is_current && !self.jobs.is_empty() {
            if let Some(prev_job) = self.jobs.iter_mut().find(|job| job.is_previous) {
                prev_job.is_current = true;
                prev_job.is_previous = false;
            } else if let Some(last) = self.jobs.last_mut() {
                last.is_current = true;
            }
        }
        Some(job)
    }

    fn update_marks(&mut self, current_job_index: usize) {
        for job in self.jobs.iter_mut() {
            if job.index == current_job_index {
                job.is_current = true;
                job.is_previous = false;
            } else if job.is_current {
                job.is_current = false;
                job.is_previous = true;
            } else {
                job.is_previous = false;
            }
        }
    }

    /// Polls every tracked pid without blocking and returns the jobs whose
    /// stages have all finished. Those jobs are no longer tracked.
    pub fn reap(&mut self) -> Vec<Job> {
        let mut finished = Vec::new();

        for job in self.jobs.iter_mut() {
            let last_pid = job.pids.last().copied();
            let mut killed = false;
            job.pids.retain(|&pid| {
                match waitpid(Pid::from_raw(pid), Some(WF::WNOHANG)) {
                    Ok(WS::StillAlive) => true,
                    Ok(ws) => match finished_status(ws) {
                        Some(status) => {
                            debug!("reaped background pid {} with status {}", pid, status);
                            if Some(pid) == last_pid && matches!(ws, WS::Signaled(..)) {
                                killed = true;
                            }
                            false
                        }
                        None => true,
                    },
                    Err(Errno::ECHILD) => false,
                    Err(e) => {
                        error!("waitpid {} failed: {}", pid, e);
                        false
                    }
                }
            });
            if killed {
                job.status = JobStatus::Killed;
            }
            if job.pids.is_empty() {
                if job.status == JobStatus::Running {
                    job.status = JobStatus::Done;
                }
                finished.push(job.index);
            }
        }

        finished
            .into_iter()
            .filter_map(|index| self.remove_job(index))
            .collect()
    }

    /// Blocks until every pid of a foreground pipeline has terminated. Only
    /// the given pids are waited for, so background children stay with
    /// `reap`. The result carries the status of the last stage.
    pub fn wait_fg(&self, pgid: i32, pids: &[i32]) -> CommandResult {
        let mut cmd_result = CommandResult::from_status(pgid, 0);

        for &pid in pids {
            let status = loop {
                match waitpid(Pid::from_raw(pid), None) {
                    Ok(ws) => {
                        if let Some(status) = finished_status(ws) {
                            break status;
                        }
                    }
                    Err(Errno::EINTR) => continue,
                    Err(e) => {
                        if e != Errno::ECHILD {
                            error!("waitpid {} failed: {}", pid, e);
                        }
                        break WAIT_FAILED;
                    }
                }
            };
            debug!("foreground pid {} finished with status {}", pid, status);
            cmd_result.status = status;
        }
        cmd_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::thread;
    use std::time::{Duration, Instant};

    #[allow(clippy::unwrap_used)]
    fn spawn(program: &str, args: &[&str]) -> i32 {
        let child = Command::new(program).args(args).spawn().unwrap();
        child.id() as i32
    }

    #[test]
    fn test_indexes_and_marks() {
        let mut jobs = JobManager::new();
        assert_eq!(jobs.add_job(10, vec![10], "a &".into()), 1);
        assert_eq!(jobs.add_job(20, vec![20], "b &".into()), 2);

        let marks: Vec<(usize, bool, bool)> = jobs
            .jobs
            .iter()
            .map(|j| (j.index, j.is_current, j.is_previous))
            .collect();
        assert_eq!(marks, vec![(1, false, true), (2, true, false)]);

        let removed = jobs.remove_job(2);
        assert!(removed.is_some());
        assert!(jobs.jobs[0].is_current);
        assert_eq!(jobs.add_job(30, vec![30], "c &".into()), 2);
        assert_eq!(jobs.remove_job(7).map(|j| j.index), None);
    }

    #[test]
    fn test_display() {
        let mut job = Job::new(42, vec![42], 3, "sleep 5 &".to_string());
        job.is_current = true;
        job.status = JobStatus::Done;
        assert_eq!(job.to_string(), "[3]+ done sleep 5 &");
    }

    #[test]
    fn test_wait_fg_reports_last_status() {
        let jobs = JobManager::new();
        let first = spawn("true", &[]);
        let last = spawn("sh", &["-c", "exit 3"]);
        let result = jobs.wait_fg(first, &[first, last]);
        assert_eq!(result, CommandResult::from_status(first, 3));
        assert!(!result.success());
    }

    #[test]
    fn test_reap_collects_finished_background_jobs() {
        let mut jobs = JobManager::new();
        let pid = spawn("sleep", &["0.2"]);
        jobs.add_job(pid, vec![pid], "sleep 0.2 &".to_string());

        assert!(jobs.reap().is_empty());
        assert_eq!(jobs.jobs.len(), 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut finished = Vec::new();
        while finished.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
            finished = jobs.reap();
        }

        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].status, JobStatus::Done);
        assert_eq!(finished[0].command, "sleep 0.2 &");
        assert!(jobs.jobs.is_empty());
    }

    fn reap_one(jobs: &mut JobManager) -> Job {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let mut finished = jobs.reap();
            if let Some(job) = finished.pop() {
                return job;
            }
            assert!(Instant::now() < deadline, "job was never reaped");
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_high_exit_code_is_done_not_killed() {
        let mut jobs = JobManager::new();
        let pid = spawn("sh", &["-c", "exit 130"]);
        jobs.add_job(pid, vec![pid], "sh -c exit130 &".to_string());
        assert_eq!(reap_one(&mut jobs).status, JobStatus::Done);
    }

    #[test]
    fn test_signalled_last_stage_is_killed() {
        let mut jobs = JobManager::new();
        let pid = spawn("sh", &["-c", "kill -9 $$"]);
        jobs.add_job(pid, vec![pid], "sh -c kill &".to_string());
        assert_eq!(reap_one(&mut jobs).status, JobStatus::Killed);
    }

    #[test]
    fn test_wait_fg_on_foreign_pid_reports_failure() {
        let jobs = JobManager::new();
        // pid 1 is never a child of the test process
        let result = jobs.wait_fg(1, &[1]);
        assert_eq!(result.status, WAIT_FAILED);
    }
}
