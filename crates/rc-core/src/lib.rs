//! # rc-core
//!
//! Runtime for a small configuration language: nested arrays of
//! `key = value` entries, string concatenation, variables and includes.
//!
//! ## Quick start
//!
//! ```rust
//! use rc_core::Config;
//!
//! let text = r#"
//!     server = [ host = "localhost", port = 8080 ]
//!     server.tls = 1
//!     # positional entries get the next free integer key
//!     modules = [ "core", "net" ]
//! "#;
//! let config = Config::read_str(&[], text).unwrap();
//!
//! assert_eq!(config.get_integer(&["server", "port"]).unwrap(), 8080);
//! assert!(config.get_boolean(&["server", "tls"]).unwrap());
//! let modules = config.get_array(&["modules"]).unwrap();
//! assert_eq!(config.elements(modules).count(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`config`]: `Config`, with reading, typed lookups, iteration, output
//! - [`engine`]: `Session`, the construction engine grammar events drive
//! - [`scanner`]: tokenizer; the whole lexical state in one value
//! - [`include`]: include file resolution
//! - [`value`]: `Value` and its tagged single-word form `Word`
//! - [`pool`]: string interning over a chunk-keyed trie
//! - [`arena`]: single-owner storage for array objects
//! - [`assoc`]: the insertion-ordered `Word → Word` map behind arrays
//! - [`diagnostic`]: located, non-fatal problems found while reading
//! - [`error`]: error types for reads, writes and lookups

pub mod arena;
pub mod assoc;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod include;
pub mod options;
mod parser;
pub mod pool;
pub mod scanner;
pub mod value;
mod writer;

pub use arena::ArrayId;
pub use assoc::Cursor;
pub use config::{Config, FreeStats};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use engine::Session;
pub use error::{ConfigError, LookupError, Result};
pub use options::ReadOptions;
pub use pool::{StringPool, Symbol};
pub use value::{Kind, Value, Word};
