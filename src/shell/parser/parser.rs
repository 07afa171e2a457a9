use super::ast::{Command, Direction, Program};
use super::error::ParseError;
use super::lexer::{Lexer, Token};

const IDENTIFIER_PUNCTUATION: &str = "_-.,/~+";

/// Whether `name` is acceptable as a redirection target.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || IDENTIFIER_PUNCTUATION.contains(c))
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    fn next_token(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Builds the whole pipeline for the line. Redirections and the
    /// background marker attach to the pipeline, not to the stage they
    /// follow.
    pub fn parse_command(&mut self) -> Result<Command, ParseError> {
        let mut command = Command::default();

        loop {
            let program = self.parse_stage()?;
            command.programs.push(program);

            loop {
                match self.current_token {
                    Token::Pipe => {
                        self.next_token();
                        break;
                    }
                    Token::Background => {
                        self.next_token();
                        if self.current_token != Token::Eof {
                            return Err(ParseError::IllegalBackgrounding);
                        }
                        command.background = true;
                        return Ok(command);
                    }
                    Token::InputRedirect => {
                        self.parse_redirection(&mut command, Direction::Input)?
                    }
                    Token::OutputRedirect => {
                        self.parse_redirection(&mut command, Direction::Output)?
                    }
                    Token::Eof => return Ok(command),
                    Token::Word(word) => {
                        return Err(ParseError::UnexpectedToken(word.to_string()))
                    }
                }
            }
        }
    }

    fn parse_stage(&mut self) -> Result<Program, ParseError> {
        let mut argv = Vec::new();
        while let Token::Word(word) = self.current_token {
            argv.push(word.to_string());
            self.next_token();
        }

        if argv.is_empty() {
            return Err(ParseError::EmptyCommand);
        }
        Ok(Program::new(argv))
    }

    fn parse_redirection(
        &mut self,
        command: &mut Command,
        direction: Direction,
    ) -> Result<(), ParseError> {
        let target = command.redirection_mut(direction);
        if target.is_some() {
            return Err(ParseError::DuplicateRedirection(direction));
        }

        self.next_token();
        let filename = match self.current_token {
            Token::Word(word) => word,
            Token::Eof => return Err(ParseError::MissingFilename(direction)),
            other => return Err(ParseError::IllegalFilename(other.as_str().to_string())),
        };
        if !is_identifier(filename) {
            return Err(ParseError::IllegalFilename(filename.to_string()));
        }

        *target = Some(filename.to_string());
        self.next_token();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, ParseError> {
        Parser::new(line).parse_command()
    }

    fn argvs(command: &Command) -> Vec<Vec<&str>> {
        command
            .programs
            .iter()
            .map(|p| p.argv.iter().map(String::as_str).collect())
            .collect()
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let cmd = parse("ls -l").unwrap();
        assert_eq!(argvs(&cmd), vec![vec!["ls", "-l"]]);
        assert_eq!(cmd.rstdin, None);
        assert_eq!(cmd.rstdout, None);
        assert!(!cmd.background);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_pipeline_keeps_left_to_right_order() {
        let cmd = parse("a | b x | c").unwrap();
        assert_eq!(argvs(&cmd), vec![vec!["a"], vec!["b", "x"], vec!["c"]]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirections() {
        let cmd = parse("cat < in.txt").unwrap();
        assert_eq!(cmd.rstdin.as_deref(), Some("in.txt"));
        assert_eq!(cmd.rstdout, None);

        let cmd = parse("echo hello > out.txt").unwrap();
        assert_eq!(cmd.rstdin, None);
        assert_eq!(cmd.rstdout.as_deref(), Some("out.txt"));
        assert_eq!(argvs(&cmd), vec![vec!["echo", "hello"]]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirections_attach_to_the_whole_pipeline() {
        let cmd = parse("sort < in.txt | uniq > out.txt &").unwrap();
        assert_eq!(argvs(&cmd), vec![vec!["sort"], vec!["uniq"]]);
        assert_eq!(cmd.rstdin.as_deref(), Some("in.txt"));
        assert_eq!(cmd.rstdout.as_deref(), Some("out.txt"));
        assert!(cmd.background);

        let cmd = parse("wc > ~/out-1.txt < ./a,b+c").unwrap();
        assert_eq!(cmd.rstdin.as_deref(), Some("./a,b+c"));
        assert_eq!(cmd.rstdout.as_deref(), Some("~/out-1.txt"));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_background() {
        let cmd = parse("sleep 10 &").unwrap();
        assert_eq!(argvs(&cmd), vec![vec!["sleep", "10"]]);
        assert!(cmd.background);

        let cmd = parse("sleep 10&   ").unwrap();
        assert!(cmd.background);
    }

    #[test]
    fn test_background_must_be_last() {
        assert_eq!(parse("sleep 1 & x"), Err(ParseError::IllegalBackgrounding));
        assert_eq!(parse("sleep 1 & | cat"), Err(ParseError::IllegalBackgrounding));
        assert_eq!(parse("sleep 1 & &"), Err(ParseError::IllegalBackgrounding));
    }

    #[test]
    fn test_duplicate_redirection() {
        assert_eq!(
            parse("cat < f < g"),
            Err(ParseError::DuplicateRedirection(Direction::Input))
        );
        assert_eq!(
            parse("ls > f | wc > g"),
            Err(ParseError::DuplicateRedirection(Direction::Output))
        );
    }

    #[test]
    fn test_illegal_filename() {
        assert_eq!(
            parse(r#"cmd > "bad name""#),
            Err(ParseError::IllegalFilename("\"bad".to_string()))
        );
        assert_eq!(
            parse("cmd > a*b"),
            Err(ParseError::IllegalFilename("a*b".to_string()))
        );
        assert_eq!(
            parse("cmd < | wc"),
            Err(ParseError::IllegalFilename("|".to_string()))
        );
    }

    #[test]
    fn test_missing_filename() {
        assert_eq!(
            parse("cmd >"),
            Err(ParseError::MissingFilename(Direction::Output))
        );
        assert_eq!(
            parse("cmd <   "),
            Err(ParseError::MissingFilename(Direction::Input))
        );
    }

    #[test]
    fn test_empty_stages() {
        assert_eq!(parse(""), Err(ParseError::EmptyCommand));
        assert_eq!(parse("   "), Err(ParseError::EmptyCommand));
        assert_eq!(parse("| wc"), Err(ParseError::EmptyCommand));
        assert_eq!(parse("ls |"), Err(ParseError::EmptyCommand));
        assert_eq!(parse("ls | | wc"), Err(ParseError::EmptyCommand));
        assert_eq!(parse("&"), Err(ParseError::EmptyCommand));
        assert_eq!(parse("> out.txt"), Err(ParseError::EmptyCommand));
    }

    #[test]
    fn test_word_after_redirection_is_unexpected() {
        assert_eq!(
            parse("cat < in.txt extra"),
            Err(ParseError::UnexpectedToken("extra".to_string()))
        );
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("out.txt"));
        assert!(is_identifier("/tmp/dir_1/a-b,c+d~"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier("x$y"));
        assert!(!is_identifier("naïve"));
    }
}
