#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Token<'a> {
    Word(&'a str),
    Pipe,
    Background,
    InputRedirect,
    OutputRedirect,
    Eof,
}

impl Token<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(word) => *word,
            Token::Pipe => "|",
            Token::Background => "&",
            Token::InputRedirect => "<",
            Token::OutputRedirect => ">",
            Token::Eof => "",
        }
    }
}

/// Characters that always form a token of their own.
pub fn is_special(c: char) -> bool {
    matches!(c, '|' | '&' | '<' | '>')
}

/// Scans one input line. Word tokens borrow from the line itself, so every
/// token stays valid for as long as the line does and no two tokens share
/// storage.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        let (token, consumed) = scan(&self.input[self.pos..]);
        self.pos += consumed;
        token
    }
}

/// Produces the next token of `rest` and the number of bytes it consumed,
/// leading whitespace included. A blank remainder yields `Token::Eof` with
/// zero consumption.
pub fn scan(rest: &str) -> (Token<'_>, usize) {
    let start = match rest.find(|c: char| !c.is_whitespace()) {
        Some(start) => start,
        None => return (Token::Eof, 0),
    };

    let tail = &rest[start..];
    let mut chars = tail.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return (Token::Eof, 0),
    };

    let token = match first {
        '|' => Token::Pipe,
        '&' => Token::Background,
        '<' => Token::InputRedirect,
        '>' => Token::OutputRedirect,
        _ => {
            let len = tail
                .find(|c: char| c.is_whitespace() || is_special(c))
                .unwrap_or(tail.len());
            return (Token::Word(&tail[..len]), start + len);
        }
    };

    (token, start + first.len_utf8())
}
