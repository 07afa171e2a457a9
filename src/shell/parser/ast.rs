use std::fmt;

/// One pipeline stage. `argv[0]` is the executable name and is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub argv: Vec<String>,
}

impl Program {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn arguments(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }
}

/// The parse result for one input line. Stages are stored left to right, so
/// `programs[0]` feeds `programs[1]` and so on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    pub programs: Vec<Program>,
    pub rstdin: Option<String>,
    pub rstdout: Option<String>,
    /// Reserved; the grammar has no way to set it yet.
    pub rstderr: Option<String>,
    pub background: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "stdin"),
            Direction::Output => write!(f, "stdout"),
        }
    }
}

impl Command {
    pub fn redirection(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Input => self.rstdin.as_deref(),
            Direction::Output => self.rstdout.as_deref(),
        }
    }

    pub fn redirection_mut(&mut self, direction: Direction) -> &mut Option<String> {
        match direction {
            Direction::Input => &mut self.rstdin,
            Direction::Output => &mut self.rstdout,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<String> = self.programs.iter().map(|p| p.argv.join(" ")).collect();
        write!(f, "{}", stages.join(" | "))?;
        if let Some(path) = &self.rstdin {
            write!(f, " < {}", path)?;
        }
        if let Some(path) = &self.rstdout {
            write!(f, " > {}", path)?;
        }
        if self.background {
            write!(f, " &")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(argv: &[&str]) -> Program {
        Program::new(argv.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_program_accessors() {
        let p = program(&["grep", "-v", "foo"]);
        assert_eq!(p.name(), "grep");
        assert_eq!(p.arguments(), ["-v", "foo"]);
        assert!(program(&["ls"]).arguments().is_empty());
    }

    #[test]
    fn test_display_renders_canonical_line() {
        let command = Command {
            programs: vec![program(&["cat"]), program(&["sort", "-r"])],
            rstdin: Some("in.txt".to_string()),
            rstdout: Some("out.txt".to_string()),
            rstderr: None,
            background: true,
        };
        assert_eq!(command.to_string(), "cat | sort -r < in.txt > out.txt &");
    }
}
