//! Tokenizer for configuration text.
//!
//! The whole lexical state (input buffer, read position, token boundaries,
//! lookahead buffer, backtracking marks, file name, line counter) lives in
//! one [`Scanner`] value. Suspending a scan for an `include` is therefore a
//! matter of moving the scanner out and moving it back later.
//!
//! # Tokens
//!
//! - punctuation: `[ ] , ; = .`
//! - integers: decimal or `0x` hex, optional leading `-`
//! - floats: `1.5`, `-2.0e3`, `1e9`
//! - strings: double quoted, escapes `\n \r \t \\ \" \'`
//! - identifiers `[A-Za-z_][A-Za-z0-9_]*`; `include` is a keyword
//!
//! Comments run from `#` or `//` to the end of the line, or between `/*`
//! and `*/`. Right after a `.` a number never takes a fraction, so `a.1.2`
//! scans as three keys.
//!
//! Sources read from bytes that are not valid UTF-8 are decoded lossily:
//! each invalid sequence becomes U+FFFD and the first one is kept as an
//! [`InvalidUtf8`] for the parser to report.

use crate::value::Value;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Assign,
    Dot,
    Integer(i64),
    Float(f64),
    String(String),
    Ident(String),
    Include,
    /// Malformed input; the message says what is wrong.
    Error(String),
    Eof,
}

/// A token with its position in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset after the last character.
    pub end: usize,
    /// Line the token starts on, 1-based.
    pub line: usize,
}

#[derive(Debug, Clone)]
struct Mark {
    pos: usize,
    line: usize,
    begin: usize,
    end: usize,
    after_dot: bool,
    pending: VecDeque<Token>,
}

/// Where a byte source first stopped being valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidUtf8 {
    /// Byte offset in the decoded text of the first replacement character.
    pub offset: usize,
    /// Line of that offset, 1-based.
    pub line: usize,
}

/// Lexical state of one source file.
#[derive(Debug, Clone)]
pub struct Scanner {
    file: String,
    source: String,
    /// Next byte to scan.
    pos: usize,
    /// Line of `pos`.
    line: usize,
    /// Boundaries of the last consumed token.
    begin: usize,
    end: usize,
    /// The last scanned token was a `.`.
    after_dot: bool,
    /// Tokens scanned ahead but not consumed.
    pending: VecDeque<Token>,
    /// Saved positions for backtracking.
    marks: Vec<Mark>,
    /// First invalid UTF-8 sequence of a byte source, until reported.
    invalid_utf8: Option<InvalidUtf8>,
}

impl Scanner {
    pub fn new(file: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            source: source.into(),
            pos: 0,
            line: 1,
            begin: 0,
            end: 0,
            after_dot: false,
            pending: VecDeque::new(),
            marks: Vec::new(),
            invalid_utf8: None,
        }
    }

    /// Scan a byte source, replacing invalid UTF-8 with U+FFFD.
    pub fn from_bytes(file: impl Into<String>, bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::new(file, text),
            Err(err) => {
                let offset = err.utf8_error().valid_up_to();
                let bytes = err.into_bytes();
                let line = 1 + bytes[..offset].iter().filter(|b| **b == b'\n').count();
                let text = String::from_utf8_lossy(&bytes).into_owned();
                let mut scanner = Self::new(file, text);
                scanner.invalid_utf8 = Some(InvalidUtf8 { offset, line });
                scanner
            }
        }
    }

    /// The first invalid UTF-8 sequence, once.
    pub fn take_invalid_utf8(&mut self) -> Option<InvalidUtf8> {
        self.invalid_utf8.take()
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Line of the next unconsumed token.
    pub fn line(&mut self) -> usize {
        self.peek().line
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> &Token {
        self.peek_nth(0)
    }

    /// Look `n` tokens ahead (`0` is the next token).
    pub fn peek_nth(&mut self, n: usize) -> &Token {
        while self.pending.len() <= n {
            let token = self.scan();
            self.pending.push_back(token);
        }
        &self.pending[n]
    }

    /// Consume the next token.
    pub fn advance(&mut self) -> Token {
        self.peek();
        let token = self
            .pending
            .pop_front()
            .unwrap_or_else(|| self.eof_token());
        self.begin = token.start;
        self.end = token.end;
        token
    }

    /// Source text of `token`.
    pub fn text(&self, token: &Token) -> &str {
        &self.source[token.start..token.end]
    }

    /// Source text of the last consumed token.
    pub fn previous(&self) -> &str {
        &self.source[self.begin..self.end]
    }

    /// Rest of the line after `token`.
    pub fn context_after(&self, token: &Token) -> &str {
        self.line_from(token.end)
    }

    /// Source text from byte `offset` to the end of its line.
    pub fn line_from(&self, offset: usize) -> &str {
        let rest = self.source.get(offset..).unwrap_or_default();
        let stop = rest.find(['\n', '\r']).unwrap_or(rest.len());
        &rest[..stop]
    }

    /// Remember the current position for [`Scanner::reset`].
    pub fn mark(&mut self) {
        self.marks.push(Mark {
            pos: self.pos,
            line: self.line,
            begin: self.begin,
            end: self.end,
            after_dot: self.after_dot,
            pending: self.pending.clone(),
        });
    }

    /// Return to the most recent mark.
    pub fn reset(&mut self) {
        if let Some(mark) = self.marks.pop() {
            self.pos = mark.pos;
            self.line = mark.line;
            self.begin = mark.begin;
            self.end = mark.end;
            self.after_dot = mark.after_dot;
            self.pending = mark.pending;
        }
    }

    /// Scan the next token from the input.
    fn scan(&mut self) -> Token {
        if let Err(message) = self.skip_trivia() {
            return self.finish(self.pos, self.line, TokenKind::Error(message));
        }

        let start = self.pos;
        let line = self.line;
        let Some(c) = self.bump() else {
            return self.eof_token();
        };

        let kind = match c {
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '=' => TokenKind::Assign,
            '.' => TokenKind::Dot,
            '"' => self.scan_string(),
            '-' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => self.scan_number(start),
            '0'..='9' => self.scan_number(start),
            c if c.is_ascii_alphabetic() || c == '_' => {
                while self
                    .peek_char()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    self.bump();
                }
                match &self.source[start..self.pos] {
                    "include" => TokenKind::Include,
                    name => TokenKind::Ident(name.to_string()),
                }
            }
            other => TokenKind::Error(format!("unexpected character '{}'", other.escape_default())),
        };
        self.finish(start, line, kind)
    }

    fn finish(&mut self, start: usize, line: usize, kind: TokenKind) -> Token {
        self.after_dot = kind == TokenKind::Dot;
        Token {
            kind,
            start,
            end: self.pos,
            line,
        }
    }

    fn eof_token(&self) -> Token {
        Token {
            kind: TokenKind::Eof,
            start: self.source.len(),
            end: self.source.len(),
            line: self.line,
        }
    }

    fn skip_trivia(&mut self) -> Result<(), String> {
        loop {
            let rest = &self.source[self.pos..];
            if rest.starts_with('#') || rest.starts_with("//") {
                while self.peek_char().is_some_and(|c| c != '\n') {
                    self.bump();
                }
            } else if rest.starts_with("/*") {
                let line = self.line;
                self.pos += 2;
                loop {
                    if self.source[self.pos..].starts_with("*/") {
                        self.pos += 2;
                        break;
                    }
                    if self.bump().is_none() {
                        return Err(format!("unterminated comment starting on line {line}"));
                    }
                }
            } else if self.peek_char().is_some_and(char::is_whitespace) {
                self.bump();
            } else {
                return Ok(());
            }
        }
    }

    fn scan_string(&mut self) -> TokenKind {
        let mut value = String::new();
        let mut nul = false;
        loop {
            match self.bump() {
                None => return TokenKind::Error("unterminated string".to_string()),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some(c @ ('\\' | '"' | '\'')) => value.push(c),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return TokenKind::Error("unterminated string".to_string()),
                },
                Some('\0') => nul = true,
                Some(c) => value.push(c),
            }
        }
        if nul {
            return TokenKind::Error("NUL character in string".to_string());
        }
        TokenKind::String(value)
    }

    fn scan_number(&mut self, start: usize) -> TokenKind {
        self.pos = start;
        let negative = self.source[start..].starts_with('-');
        if negative {
            self.bump();
        }

        let rest = &self.source[self.pos..];
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            let hex_start = self.pos;
            while self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.source[hex_start..self.pos];
            if digits.is_empty() {
                return TokenKind::Error("hex literal without digits".to_string());
            }
            return match i64::from_str_radix(digits, 16) {
                Ok(n) => integer_token(if negative { -n } else { n }),
                Err(_) => TokenKind::Error("integer literal out of range".to_string()),
            };
        }

        self.eat_digits();
        let mut float = false;
        if !self.after_dot {
            let bytes = self.source.as_bytes();
            if bytes.get(self.pos) == Some(&b'.')
                && bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit)
            {
                float = true;
                self.bump();
                self.eat_digits();
            }
            let bytes = self.source.as_bytes();
            if matches!(bytes.get(self.pos), Some(b'e' | b'E')) {
                let sign = matches!(bytes.get(self.pos + 1), Some(b'+' | b'-'));
                let digit_at = self.pos + 1 + usize::from(sign);
                if bytes.get(digit_at).is_some_and(u8::is_ascii_digit) {
                    float = true;
                    self.pos = digit_at;
                    self.eat_digits();
                }
            }
        }

        let text = &self.source[start..self.pos];
        if float {
            match text.parse::<f64>() {
                Ok(f) => TokenKind::Float(f),
                Err(_) => TokenKind::Error(format!("malformed number '{text}'")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => integer_token(n),
                Err(_) => TokenKind::Error("integer literal out of range".to_string()),
            }
        }
    }

    fn eat_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }
}

fn integer_token(n: i64) -> TokenKind {
    match Value::integer(n) {
        Some(_) => TokenKind::Integer(n),
        None => TokenKind::Error("integer literal out of range".to_string()),
    }
}
