//! Diagnostics reported while reading a configuration.
//!
//! None of these stop a parse. They are collected on the resulting
//! [`Config`](crate::Config) and logged through `tracing` as they happen.

use serde::Serialize;
use std::fmt;

/// What kind of problem a [`Diagnostic`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The text does not match the grammar.
    Syntax,
    /// An operation got a value of the wrong kind (string concatenation of a
    /// non-string, dotted assignment through a non-array).
    TypeMismatch,
    /// An include file could not be read.
    Io,
    /// The source was not valid UTF-8; invalid sequences were replaced.
    Encoding,
}

/// A located problem in configuration text.
///
/// Displays as
/// `<file>:<line>: <message> near token '<token>' before text "<context>"`,
/// leaving out the token and context parts when they are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: String,
    pub line: usize,
    pub message: String,
    /// Text of the token the scanner was looking at.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Rest of the source line after that token.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub context: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)?;
        if !self.token.is_empty() {
            write!(f, " near token '{}'", self.token)?;
        }
        if !self.context.is_empty() {
            write!(f, " before text \"{}\"", self.context)?;
        }
        Ok(())
    }
}
