//! Grammar driver: turns the token stream into [`Session`] events.
//!
//! ```text
//! file      := statement* EOF
//! array     := '[' statement* ']'
//! statement := ( 'include' STRING | entry ) (',' | ';')?
//! entry     := lvalue '=' value | value
//! lvalue    := key ('.' key)*
//! key       := IDENT | STRING | INTEGER | FLOAT | '[' value ']'
//! value     := INTEGER | FLOAT | array | operand operand*
//! operand   := STRING | IDENT
//! ```
//!
//! # Key design decisions
//!
//! - **Two-token lookahead**: an identifier or string starts an lvalue when
//!   the token after it is `=` or `.`; the same test ends a concatenation,
//!   so separators between statements are optional.
//! - **Bracketed keys**: `[` starts a key only when the matching `]` is
//!   followed by `=` or `.`. The scanner is marked, run to the bracket and
//!   reset.
//! - **Value before lvalue**: the value of a dotted assignment is parsed
//!   before any `dot` event, so nested arrays in the value cannot move the
//!   lvalue target.
//! - **Recovery**: a syntax error is reported at the offending token, then
//!   tokens are skipped up to the next separator or closing bracket at the
//!   same nesting level.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::engine::Session;
use crate::error::{ConfigError, Result};
use crate::include;
use crate::options::ReadOptions;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::value::Value;

/// Parse everything `scanner` yields into `session`'s global array.
///
/// Returns the diagnostics found on the way. `Err` means the engine lost
/// its stack, never that the text was malformed.
pub fn parse(
    session: &mut Session,
    scanner: Scanner,
    options: &ReadOptions,
) -> Result<Vec<Diagnostic>> {
    let mut parser = Parser {
        session,
        scanner,
        options,
        diagnostics: Vec::new(),
        nesting: 0,
        includes: 0,
    };
    parser.report_encoding();
    parser.statements()?;
    Ok(parser.diagnostics)
}

struct Parser<'a> {
    session: &'a mut Session,
    scanner: Scanner,
    options: &'a ReadOptions,
    diagnostics: Vec<Diagnostic>,
    /// Open `[` arrays.
    nesting: usize,
    /// Active include files.
    includes: usize,
}

impl Parser<'_> {
    /// Statements up to the end of the current scanner's input.
    fn statements(&mut self) -> Result<()> {
        loop {
            match self.scanner.peek().kind {
                TokenKind::Eof => return Ok(()),
                TokenKind::RBracket => {
                    self.error(DiagnosticKind::Syntax, "unbalanced ']'");
                    self.scanner.advance();
                }
                _ => self.statement()?,
            }
        }
    }

    fn statement(&mut self) -> Result<()> {
        match self.scanner.peek().kind {
            TokenKind::Include => self.include()?,
            _ => self.entry()?,
        }
        if matches!(
            self.scanner.peek().kind,
            TokenKind::Comma | TokenKind::Semicolon
        ) {
            self.scanner.advance();
        }
        Ok(())
    }

    fn include(&mut self) -> Result<()> {
        let keyword = self.scanner.advance();
        let name = match &self.scanner.peek().kind {
            TokenKind::String(name) => name.clone(),
            _ => {
                self.expected("file name");
                return Ok(());
            }
        };
        self.scanner.advance();

        if self.includes >= self.options.max_include_depth {
            self.error_at(
                &keyword,
                DiagnosticKind::Io,
                format!(
                    "include of '{name}' skipped, includes nested deeper than {}",
                    self.options.max_include_depth
                ),
            );
            return Ok(());
        }

        let source = match include::load(self.scanner.file(), &name) {
            Ok(source) => source,
            Err(err) => {
                self.error_at(
                    &keyword,
                    DiagnosticKind::Io,
                    format!("can't open include file '{name}': {err}"),
                );
                return Ok(());
            }
        };

        let file = source.path.display().to_string();
        tracing::debug!(file = %file, depth = self.includes + 1, "including");
        let included = Scanner::from_bytes(file, source.bytes);
        let outer = std::mem::replace(&mut self.scanner, included);
        self.report_encoding();
        self.includes += 1;
        let result = self.statements();
        self.includes -= 1;
        let included = std::mem::replace(&mut self.scanner, outer);
        tracing::debug!(file = included.file(), "include finished");
        result
    }

    fn entry(&mut self) -> Result<()> {
        if !self.at_lvalue() {
            if let Some(value) = self.value()? {
                self.session.next_item(value);
            }
            return Ok(());
        }

        let start = self.scanner.peek().clone();
        let mut keys = Vec::new();
        loop {
            match self.key()? {
                Some(key) => keys.push(key),
                None => {
                    self.discard_all(keys);
                    return Ok(());
                }
            }
            if !matches!(self.scanner.peek().kind, TokenKind::Dot) {
                break;
            }
            self.scanner.advance();
        }

        if !matches!(self.scanner.peek().kind, TokenKind::Assign) {
            self.discard_all(keys);
            self.expected("'='");
            return Ok(());
        }
        self.scanner.advance();

        match self.value()? {
            Some(value) => self.assign(&start, keys, value),
            None => {
                self.discard_all(keys);
                Ok(())
            }
        }
    }

    /// Store `value` under the key path `keys`, which starts at `start`.
    fn assign(&mut self, start: &Token, keys: Vec<Value>, value: Value) -> Result<()> {
        let mut keys = keys.into_iter();
        let first = keys
            .next()
            .ok_or_else(|| ConfigError::Internal("assignment without a key".to_string()))?;

        if keys.len() == 0 {
            self.session.add_item(first, value);
            self.report_problems(start);
            return Ok(());
        }

        self.session.begin_lvalue();
        let mut pending = first;
        for next in keys {
            self.session.dot(pending, next);
            pending = self.session.pop()?;
        }
        self.session.assign(pending, value);
        self.report_problems(start);
        Ok(())
    }

    fn key(&mut self) -> Result<Option<Value>> {
        let key = match &self.scanner.peek().kind {
            TokenKind::Ident(name) | TokenKind::String(name) => self.session.intern(name),
            TokenKind::Integer(n) => Value::Integer(*n),
            TokenKind::Float(f) => Value::float(*f),
            TokenKind::LBracket => {
                self.scanner.advance();
                let Some(key) = self.value()? else {
                    return Ok(None);
                };
                if !matches!(self.scanner.peek().kind, TokenKind::RBracket) {
                    self.session.discard(key);
                    self.expected("']'");
                    return Ok(None);
                }
                self.scanner.advance();
                return Ok(Some(key));
            }
            _ => {
                self.expected("key");
                return Ok(None);
            }
        };
        self.scanner.advance();
        Ok(Some(key))
    }

    fn value(&mut self) -> Result<Option<Value>> {
        let value = match &self.scanner.peek().kind {
            TokenKind::Integer(n) => Value::Integer(*n),
            TokenKind::Float(f) => Value::float(*f),
            TokenKind::LBracket => return self.array(),
            TokenKind::String(_) | TokenKind::Ident(_) => return self.operands().map(Some),
            _ => {
                self.expected("value");
                return Ok(None);
            }
        };
        self.scanner.advance();
        Ok(Some(value))
    }

    fn array(&mut self) -> Result<Option<Value>> {
        let open = self.scanner.advance();
        if self.nesting >= self.options.max_nesting_depth {
            self.error_at(
                &open,
                DiagnosticKind::Syntax,
                format!(
                    "arrays nested deeper than {} levels",
                    self.options.max_nesting_depth
                ),
            );
            self.skip_array();
            return Ok(None);
        }

        self.nesting += 1;
        self.session.begin_array();
        loop {
            match self.scanner.peek().kind {
                TokenKind::RBracket => {
                    self.scanner.advance();
                    break;
                }
                TokenKind::Eof => {
                    self.expected("']'");
                    break;
                }
                _ => self.statement()?,
            }
        }
        self.session.end_array()?;
        self.nesting -= 1;
        self.session.pop().map(Some)
    }

    /// One operand, or several joined by concatenation.
    fn operands(&mut self) -> Result<Value> {
        let mut joined = self.operand()?;
        while self.at_operand() {
            let at = self.scanner.peek().clone();
            let next = self.operand()?;
            self.session.concat(joined, next);
            joined = self.session.pop()?;
            self.report_problems(&at);
        }
        Ok(joined)
    }

    fn operand(&mut self) -> Result<Value> {
        let token = self.scanner.advance();
        match token.kind {
            TokenKind::String(text) => Ok(self.session.intern(&text)),
            TokenKind::Ident(name) => {
                let name = self.session.intern(&name);
                self.session.lookup_variable(name);
                self.session.pop()
            }
            other => Err(ConfigError::Internal(format!(
                "operand expected, found {other:?}"
            ))),
        }
    }

    fn at_operand(&mut self) -> bool {
        matches!(
            self.scanner.peek().kind,
            TokenKind::String(_) | TokenKind::Ident(_)
        ) && !matches!(
            self.scanner.peek_nth(1).kind,
            TokenKind::Assign | TokenKind::Dot
        )
    }

    fn at_lvalue(&mut self) -> bool {
        match self.scanner.peek().kind {
            TokenKind::Ident(_)
            | TokenKind::String(_)
            | TokenKind::Integer(_)
            | TokenKind::Float(_) => matches!(
                self.scanner.peek_nth(1).kind,
                TokenKind::Assign | TokenKind::Dot
            ),
            TokenKind::LBracket => self.at_bracketed_key(),
            _ => false,
        }
    }

    /// `[ ... ]` followed by `=` or `.`.
    fn at_bracketed_key(&mut self) -> bool {
        self.scanner.mark();
        let mut depth = 0usize;
        let found = loop {
            match self.scanner.advance().kind {
                TokenKind::LBracket => depth += 1,
                TokenKind::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        break matches!(
                            self.scanner.peek().kind,
                            TokenKind::Assign | TokenKind::Dot
                        );
                    }
                }
                TokenKind::Eof => break false,
                _ => {}
            }
        };
        self.scanner.reset();
        found
    }

    /// Skip the rest of an array whose `[` was just consumed.
    fn skip_array(&mut self) {
        let mut depth = 1usize;
        loop {
            match self.scanner.advance().kind {
                TokenKind::LBracket => depth += 1,
                TokenKind::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
        }
    }

    /// Skip to the next separator or closing bracket at this level.
    fn recover(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.scanner.peek().kind {
                TokenKind::Eof => return,
                TokenKind::Comma | TokenKind::Semicolon | TokenKind::RBracket if depth == 0 => {
                    return
                }
                TokenKind::LBracket => depth += 1,
                TokenKind::RBracket => depth -= 1,
                _ => {}
            }
            self.scanner.advance();
        }
    }

    fn discard_all(&mut self, values: Vec<Value>) {
        for value in values {
            self.session.discard(value);
        }
    }

    /// Report a syntax error at the next token and recover.
    fn expected(&mut self, what: &str) {
        let message = match &self.scanner.peek().kind {
            TokenKind::Error(message) => message.clone(),
            _ => match self.scanner.previous() {
                "" => format!("syntax error, expected {what}"),
                previous => format!("syntax error, expected {what} after '{previous}'"),
            },
        };
        self.error(DiagnosticKind::Syntax, message);
        self.recover();
    }

    /// Report the first invalid UTF-8 sequence of the current source.
    fn report_encoding(&mut self) {
        let Some(invalid) = self.scanner.take_invalid_utf8() else {
            return;
        };
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::Encoding,
            file: self.scanner.file().to_string(),
            line: invalid.line,
            message: "invalid UTF-8 replaced with U+FFFD".to_string(),
            token: String::new(),
            context: self.scanner.line_from(invalid.offset).to_string(),
        };
        tracing::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    fn report_problems(&mut self, at: &Token) {
        for problem in self.session.take_problems() {
            self.error_at(at, problem.kind, problem.message);
        }
    }

    fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let token = self.scanner.peek().clone();
        self.error_at(&token, kind, message);
    }

    fn error_at(&mut self, token: &Token, kind: DiagnosticKind, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            kind,
            file: self.scanner.file().to_string(),
            line: token.line,
            message: message.into(),
            token: self.scanner.text(token).to_string(),
            context: self.scanner.context_after(token).to_string(),
        };
        tracing::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}
