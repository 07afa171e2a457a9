use log::{debug, error, warn};
use std::error::Error;
use std::io::Write;

use crate::shell::executor::{Executor, JobManager, Outcome};
use crate::shell::parser;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::utils::config::Config;
use crate::utils::theme::Theme;

/// Whether the loop keeps reading lines.
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Shell<'a> {
    theme: Theme,
    readline: ReadlineManager<'a>,
    executor: Executor,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config, theme: Theme) -> Result<Self, ReadlineError> {
        Ok(Self {
            theme,
            readline: ReadlineManager::new(config)?,
            executor: Executor::new(JobManager::new()),
        })
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        debug!("starting shell");
        self.readline.load_history();

        self.run_loop()?;
        self.readline.save_history();

        debug!("leaving shell");
        Ok(())
    }

    fn run_loop(&mut self) -> Result<(), Box<dyn Error>> {
        loop {
            self.report_finished_jobs();
            std::io::stdout().flush()?;

            match self.readline.readline(&self.theme.prompt) {
                Ok(line) => {
                    if self.handle_input(&line)? == Flow::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Eof) => {
                    debug!("EOF on input");
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("prompt interrupted");
                }
                Err(err) => {
                    error!("readline failed: {}", err);
                    eprintln!("{}", self.theme.error(&format!("error: {}", err)));
                }
            }
        }
        Ok(())
    }

    fn report_finished_jobs(&mut self) {
        for job in self.executor.reap_background() {
            debug!("job [{}] pgid {} finished", job.index, job.pgid);
            println!("{}", self.theme.notice(&job.to_string()));
        }
    }

    fn handle_input(&mut self, line: &str) -> Result<Flow, Box<dyn Error>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        if let Err(err) = self.readline.add_history(line) {
            warn!("could not record history: {}", err);
        }

        let command = match parser::parse(line) {
            Ok(command) => command,
            Err(e) => {
                debug!("parse failed for {:?}: {}", line, e);
                eprintln!("{}", self.theme.error(&e.to_string()));
                println!("{}", self.theme.error("Parse ERROR"));
                return Ok(Flow::Continue);
            }
        };
        debug!("parsed: {}", command);

        match self.executor.execute(&command) {
            Ok(Outcome::Exit) => Ok(Flow::Exit),
            Ok(Outcome::Background { index, pgid }) => {
                println!("[{}] {}", index, pgid);
                Ok(Flow::Continue)
            }
            Ok(Outcome::Completed(result)) => {
                if !result.success() {
                    debug!("exit status {}", result.status);
                }
                Ok(Flow::Continue)
            }
            Err(e) => {
                eprintln!("{}", self.theme.error(&e.to_string()));
                Ok(Flow::Continue)
            }
        }
    }
}
