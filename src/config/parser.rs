//! Recursive-descent parser for the hotkey config file
//!
//! ```text
//! config_file   = { mode_entry } ;
//! mode_entry    = mode_name, "{", { hotkey_entry }, "}" ;
//! hotkey_entry  = keycombo, { flag }, "{", command_list, "}" ;
//! keycombo      = { modifier, "+" }, keyname ;
//! modifier      = "shift" | "lock" | "ctrl" | "mod1" | ... | "mod5" ;
//! flag          = "--", name ;
//! command_list  = command, { NEWLINE, command } ;
//! ```
//!
//! Parsing produces a [`ConfigFile`] syntax tree and touches nothing else;
//! the first grammar violation aborts the whole parse.

use super::error::{ParseError, ParseErrorKind};
use super::lexer::{Lexer, Token, TokenKind};
use crate::constants::grammar::MAX_COMBO_PARTS;
use crate::keymap::Modifiers;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub modes: Vec<ModeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeEntry {
    pub name: String,
    pub line: u32,
    pub hotkeys: Vec<HotkeyEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyEntry {
    pub modifiers: Modifiers,
    /// Key name exactly as written; resolved against the layout later
    pub key: String,
    /// Parsed but carry no meaning yet
    pub flags: Vec<String>,
    pub commands: Vec<String>,
    pub line: u32,
}

/// Parse a complete config file
pub fn parse(source: &str) -> Result<ConfigFile, ParseError> {
    Parser::new(source).config_file()
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
}

fn unexpected(kind: TokenKind, line: u32, expected: &'static str) -> ParseError {
    let kind = match kind {
        TokenKind::Eof => ParseErrorKind::UnexpectedEof,
        found => ParseErrorKind::UnexpectedToken {
            expected,
            found: found.to_string(),
        },
    };
    ParseError::new(line, kind)
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            peeked: None,
        }
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn config_file(mut self) -> Result<ConfigFile, ParseError> {
        let mut config = ConfigFile::default();

        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Word(name) => {
                    let mode = self.mode_entry(name, token.line)?;
                    config.modes.push(mode);
                }
                other => return Err(unexpected(other, token.line, "mode name")),
            }
        }

        Ok(config)
    }

    fn mode_entry(&mut self, name: String, line: u32) -> Result<ModeEntry, ParseError> {
        let token = self.next()?;
        if token.kind != TokenKind::OpenBrace {
            return Err(unexpected(token.kind, token.line, "'{' after mode name"));
        }

        let mut hotkeys = Vec::new();
        loop {
            if self.peek()?.kind == TokenKind::CloseBrace {
                self.next()?;
                break;
            }
            hotkeys.push(self.hotkey_entry()?);
        }

        Ok(ModeEntry {
            name,
            line,
            hotkeys,
        })
    }

    fn hotkey_entry(&mut self) -> Result<HotkeyEntry, ParseError> {
        let (modifiers, key, line) = self.keycombo()?;

        let mut flags = Vec::new();
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Flag(flag) => flags.push(flag),
                TokenKind::OpenBrace => break,
                other => return Err(unexpected(other, token.line, "flag or '{'")),
            }
        }

        let mut commands = Vec::new();
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Command(command) => commands.push(command),
                TokenKind::CloseBrace => break,
                other => return Err(unexpected(other, token.line, "command or '}'")),
            }
        }

        if commands.is_empty() {
            return Err(ParseError::new(line, ParseErrorKind::EmptyCommandBlock));
        }

        Ok(HotkeyEntry {
            modifiers,
            key,
            flags,
            commands,
            line,
        })
    }

    /// `{ modifier "+" } keyname`, folding the modifiers into one mask
    fn keycombo(&mut self) -> Result<(Modifiers, String, u32), ParseError> {
        let first = self.next()?;
        let line = first.line;
        let mut parts = match first.kind {
            TokenKind::Word(word) => vec![word],
            other => return Err(unexpected(other, line, "key combination")),
        };

        while self.peek()?.kind == TokenKind::Plus {
            self.next()?;
            let token = self.next()?;
            match token.kind {
                TokenKind::Word(word) => parts.push(word),
                other => return Err(unexpected(other, token.line, "key name after '+'")),
            }

            if parts.len() > MAX_COMBO_PARTS {
                return Err(ParseError::new(
                    line,
                    ParseErrorKind::TooManyComboParts(MAX_COMBO_PARTS),
                ));
            }
        }

        let key = parts.pop().unwrap_or_default();
        let mut modifiers = Modifiers::NONE;
        for part in parts {
            match Modifiers::from_name(&part) {
                Some(modifier) => modifiers |= modifier,
                None => {
                    return Err(ParseError::new(line, ParseErrorKind::UnknownModifier(part)));
                }
            }
        }

        Ok((modifiers, key, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_hotkey() {
        let config = parse("default {\n  ctrl+a { echo hi }\n}\n").unwrap();

        assert_eq!(config.modes.len(), 1);
        let mode = &config.modes[0];
        assert_eq!(mode.name, "default");
        assert_eq!(mode.hotkeys.len(), 1);

        let hotkey = &mode.hotkeys[0];
        assert_eq!(hotkey.modifiers, Modifiers::CONTROL);
        assert_eq!(hotkey.key, "a");
        assert_eq!(hotkey.commands, vec!["echo hi".to_string()]);
        assert_eq!(hotkey.line, 2);
    }

    #[test]
    fn test_multiple_modes_commands_and_flags() {
        let source = "\
default {
    mod4 + shift + Return --repeat --silent {
        xterm
        notify-send 'terminal'
    }
    XF86AudioMute { pactl set-sink-mute @DEFAULT_SINK@ toggle }
}

gaming {}
";
        let config = parse(source).unwrap();
        assert_eq!(config.modes.len(), 2);
        assert_eq!(config.modes[1].name, "gaming");
        assert_eq!(config.modes[1].line, 9);
        assert!(config.modes[1].hotkeys.is_empty());

        let terminal = &config.modes[0].hotkeys[0];
        assert_eq!(terminal.modifiers, Modifiers::MOD4 | Modifiers::SHIFT);
        assert_eq!(terminal.key, "Return");
        assert_eq!(terminal.flags, vec!["repeat", "silent"]);
        assert_eq!(terminal.commands, vec!["xterm", "notify-send 'terminal'"]);

        let mute = &config.modes[0].hotkeys[1];
        assert_eq!(mute.modifiers, Modifiers::NONE);
        assert_eq!(mute.line, 6);
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
        assert_eq!(parse(" \n\t\n").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_unterminated_command_block() {
        let err = parse("default {\n  ctrl+a {\n    echo hi\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(err.line, 4);
    }

    #[test]
    fn test_unterminated_mode() {
        let err = parse("default {\n  a { true }\n").unwrap_err();
        assert_eq!(err, ParseError::new(3, ParseErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_unknown_modifier() {
        let err = parse("m {\n\n alt+a { true } }").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.kind, ParseErrorKind::UnknownModifier("alt".to_string()));
    }

    #[test]
    fn test_empty_command_block() {
        let err = parse("m { ctrl+a { } }").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyCommandBlock);
    }

    #[test]
    fn test_mode_name_must_be_single_word() {
        let err = parse("my mode { }").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
    }

    #[test]
    fn test_dangling_plus() {
        let err = parse("m { ctrl+ { true } }").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                expected: "key name after '+'",
                ..
            }
        ));
    }

    #[test]
    fn test_too_many_combo_parts() {
        let err = parse("m { shift+lock+ctrl+mod1+mod2+mod3+mod4+mod5+a { true } }").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooManyComboParts(MAX_COMBO_PARTS));

        let ok = parse("m { shift+lock+ctrl+mod1+mod2+mod3+mod4+a { true } }").unwrap();
        assert_eq!(ok.modes[0].hotkeys[0].modifiers.bits(), 0x7f);
    }

    #[test]
    fn test_unicode_key_name_with_modifier() {
        let config = parse("m { mod4+U+0444 { true } }").unwrap();
        let hotkey = &config.modes[0].hotkeys[0];
        assert_eq!(hotkey.modifiers, Modifiers::MOD4);
        assert_eq!(hotkey.key, "U+0444");
    }

    #[test]
    fn test_error_display() {
        let err = parse("m { alt+a { true } }").unwrap_err();
        assert_eq!(err.to_string(), "line 1: unknown modifier 'alt'");
    }
}
