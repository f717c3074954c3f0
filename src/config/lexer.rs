//! Tokenizer for the hotkey config grammar
//!
//! The grammar nests exactly three levels deep (file, mode body, command
//! block) and what counts as a token depends on the level:
//!
//! - top level: mode names and `{`
//! - mode body: key names, `+`, `--flag`, `{` and the closing `}`
//! - command block: one command per line, terminated by LF or `}`
//!
//! The lexer tracks the nesting itself so the parser sees a flat token stream.
//! Whitespace (space, tab, CR, LF) separates tokens everywhere except inside a
//! command, where only CR is dropped.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use super::error::{ParseError, ParseErrorKind};
use crate::constants::grammar::{MAX_COMMAND_LEN, MAX_FLAG_LEN, MAX_KEY_LEN, MAX_NAME_LEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Mode name, modifier or key name
    Word(String),
    Plus,
    /// Flag text without the leading `--`
    Flag(String),
    OpenBrace,
    CloseBrace,
    Command(String),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Word(word) => write!(f, "'{word}'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Flag(flag) => write!(f, "flag '--{flag}'"),
            TokenKind::OpenBrace => write!(f, "'{{'"),
            TokenKind::CloseBrace => write!(f, "'}}'"),
            TokenKind::Command(_) => write!(f, "command"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Line the token starts on
    pub line: u32,
}

/// Nesting level the lexer is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Depth {
    TopLevel,
    ModeBody,
    CommandBlock,
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
    depth: Depth,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            depth: Depth::TopLevel,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.line, kind)
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();
        let line = self.line;

        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
            });
        };

        let kind = match (self.depth, c) {
            (Depth::TopLevel, '{') => {
                self.bump();
                self.depth = Depth::ModeBody;
                TokenKind::OpenBrace
            }
            (Depth::TopLevel, '}') => return Err(self.error(ParseErrorKind::UnexpectedChar(c))),
            (Depth::TopLevel, _) => {
                TokenKind::Word(self.read_word(|c| c == '{' || c == '}', "mode name", MAX_NAME_LEN)?)
            }

            (Depth::ModeBody, '{') => {
                self.bump();
                self.depth = Depth::CommandBlock;
                TokenKind::OpenBrace
            }
            (Depth::ModeBody, '}') => {
                self.bump();
                self.depth = Depth::TopLevel;
                TokenKind::CloseBrace
            }
            (Depth::ModeBody, '+') => {
                self.bump();
                TokenKind::Plus
            }
            (Depth::ModeBody, '-') => TokenKind::Flag(self.read_flag()?),
            (Depth::ModeBody, _) => TokenKind::Word(self.read_key_name()?),

            (Depth::CommandBlock, '}') => {
                self.bump();
                self.depth = Depth::ModeBody;
                TokenKind::CloseBrace
            }
            (Depth::CommandBlock, _) => TokenKind::Command(self.read_command()?),
        };

        Ok(Token { kind, line })
    }

    /// Read up to whitespace or a character accepted by `stop`, which is left unread
    fn read_word(
        &mut self,
        stop: impl Fn(char) -> bool,
        what: &'static str,
        max: usize,
    ) -> Result<String, ParseError> {
        let mut word = String::new();

        while let Some(c) = self.peek() {
            if is_whitespace(c) || stop(c) {
                break;
            }
            word.push(c);
            if word.len() > max {
                return Err(self.error(ParseErrorKind::TokenTooLong { what, max }));
            }
            self.bump();
        }

        Ok(word)
    }

    /// Key or modifier name. `U+<hex>` stays one token instead of splitting at `+`.
    fn read_key_name(&mut self) -> Result<String, ParseError> {
        let stop = |c: char| matches!(c, '+' | '-' | '{' | '}');
        let mut name = self.read_word(stop, "key name", MAX_KEY_LEN)?;

        if name.eq_ignore_ascii_case("u") && self.at_unicode_suffix() {
            self.bump();
            name.push('+');
            name.push_str(&self.read_word(stop, "key name", MAX_KEY_LEN)?);
            if name.len() > MAX_KEY_LEN {
                return Err(self.error(ParseErrorKind::TokenTooLong {
                    what: "key name",
                    max: MAX_KEY_LEN,
                }));
            }
        }

        Ok(name)
    }

    /// Next two characters are `+` and a hex digit
    fn at_unicode_suffix(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next() == Some('+') && ahead.next().is_some_and(|c| c.is_ascii_hexdigit())
    }

    fn read_flag(&mut self) -> Result<String, ParseError> {
        for _ in 0..2 {
            match self.bump() {
                Some('-') => {}
                Some(c) => return Err(self.error(ParseErrorKind::UnexpectedChar(c))),
                None => return Err(self.error(ParseErrorKind::UnexpectedEof)),
            }
        }

        let flag = self.read_word(|c| c == '{' || c == '}', "flag", MAX_FLAG_LEN)?;
        if flag.is_empty() {
            return Err(self.error(ParseErrorKind::EmptyFlag));
        }
        Ok(flag)
    }

    /// Read one command line. LF is consumed; `}` is left for the next token.
    fn read_command(&mut self) -> Result<String, ParseError> {
        let mut command = String::new();

        loop {
            match self.peek() {
                None => return Err(self.error(ParseErrorKind::UnexpectedEof)),
                Some('}') => break,
                Some('\n') => {
                    self.bump();
                    break;
                }
                Some('\r') => {
                    self.bump();
                }
                Some(c) => {
                    command.push(c);
                    if command.len() > MAX_COMMAND_LEN {
                        return Err(self.error(ParseErrorKind::TokenTooLong {
                            what: "command",
                            max: MAX_COMMAND_LEN,
                        }));
                    }
                    self.bump();
                }
            }
        }

        command.truncate(command.trim_end().len());
        Ok(command)
    }
}
