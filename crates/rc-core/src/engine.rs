//! Parse construction engine.
//!
//! A [`Session`] turns grammar events into a value tree. It owns everything
//! a parse mutates: the string pool, the array arena, the value stack, the
//! current array with its auto-index, the lvalue target for dotted
//! assignments and the global array that variables resolve against.
//!
//! The grammar driver in this crate is one client; a host with its own
//! grammar can drive a session directly:
//!
//! ```
//! use rc_core::{Session, Value};
//!
//! let mut session = Session::new();
//! // [10, 20]
//! session.begin_array();
//! session.next_item(Value::Integer(10));
//! session.next_item(Value::Integer(20));
//! session.end_array().unwrap();
//! let list = session.pop().unwrap();
//! let key = session.intern("list");
//! session.add_item(key, list);
//!
//! let config = session.finish(Vec::new());
//! assert_eq!(config.lookup(&["list"]).unwrap().kind(), rc_core::Kind::Array);
//! ```
//!
//! # Ownership
//!
//! Stores follow last-write-wins. When a slot is overwritten, an array it
//! held is released on the spot, and an array passed as a key that does not
//! end up stored is released too. Variable references copy arrays, so no
//! array is ever reachable from two slots.

use crate::arena::{ArrayArena, ArrayId};
use crate::config::Config;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::{ConfigError, Result};
use crate::pool::StringPool;
use crate::value::{Value, Word, INTEGER_MAX, INTEGER_MIN};

/// String pushed in place of a failed concatenation.
pub const ERROR_SENTINEL: &str = "error";

/// A problem found by the engine, before the grammar driver attaches a
/// source location to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// State of one configuration read.
#[derive(Debug)]
pub struct Session {
    pool: StringPool,
    arrays: ArrayArena,
    stack: Vec<Value>,
    global: ArrayId,
    current: ArrayId,
    /// Next positional index in `current`.
    index: i64,
    lvalue: ArrayId,
    problems: Vec<Problem>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Start a session with an empty global array.
    pub fn new() -> Self {
        let mut arrays = ArrayArena::new();
        let global = arrays.alloc();
        arrays.attach(global);
        Self {
            pool: StringPool::new(),
            arrays,
            stack: Vec::with_capacity(16),
            global,
            current: global,
            index: 0,
            lvalue: global,
            problems: Vec::new(),
        }
    }

    /// Start a session whose global array holds the given string constants.
    pub fn with_imports(imports: &[(&str, &str)]) -> Self {
        let mut session = Self::new();
        for (name, value) in imports {
            session.import(name, value);
        }
        session
    }

    /// Store the string constant `value` under `name` in the global array.
    pub fn import(&mut self, name: &str, value: &str) {
        let key = self.intern(name);
        let value = self.intern(value);
        self.store(self.global, key, value);
    }

    /// Intern `string` in this session's pool.
    pub fn intern(&mut self, string: &str) -> Value {
        Value::String(self.pool.intern(string))
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    pub fn arrays(&self) -> &ArrayArena {
        &self.arrays
    }

    /// The top-level array.
    pub fn global(&self) -> ArrayId {
        self.global
    }

    /// The array entries are currently added to.
    pub fn current(&self) -> ArrayId {
        self.current
    }

    /// Next positional index of the current array.
    pub fn auto_index(&self) -> i64 {
        self.index
    }

    /// Number of values on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push_literal(&mut self, value: Value) {
        tracing::trace!(?value, "push");
        self.stack.push(value);
    }

    /// Pop the top of the value stack.
    ///
    /// An empty stack means the events arrived out of order, which is an
    /// engine or grammar bug.
    pub fn pop(&mut self) -> Result<Value> {
        self.stack
            .pop()
            .ok_or_else(|| ConfigError::Internal("no objects on stack".to_string()))
    }

    /// Save the current array and auto-index, then start a fresh array.
    pub fn begin_array(&mut self) {
        self.push_literal(Value::Array(self.current));
        self.push_literal(Value::Integer(self.index));
        self.current = self.arrays.alloc();
        self.index = 0;
    }

    /// Finish the current array, push it, and resume the enclosing one.
    pub fn end_array(&mut self) -> Result<()> {
        let index = match self.pop()? {
            Value::Integer(index) => index,
            other => {
                return Err(ConfigError::Internal(format!(
                    "expected saved index on stack, found {}",
                    other.kind()
                )))
            }
        };
        let outer = match self.pop()? {
            Value::Array(outer) => outer,
            other => {
                return Err(ConfigError::Internal(format!(
                    "expected saved array on stack, found {}",
                    other.kind()
                )))
            }
        };
        let built = std::mem::replace(&mut self.current, outer);
        self.index = index;
        self.push_literal(Value::Array(built));
        Ok(())
    }

    /// Store `value` at `key` in the current array.
    ///
    /// An integer key moves the auto-index past it, so positional entries
    /// continue after explicit ones.
    pub fn add_item(&mut self, key: Value, value: Value) {
        let key = self.checked(key);
        let value = self.checked(value);
        if let Value::Integer(n) = key {
            self.index = n.saturating_add(1).min(INTEGER_MAX);
        }
        self.store(self.current, key, value);
    }

    /// Store `value` at the next positional index.
    pub fn next_item(&mut self, value: Value) {
        self.add_item(Value::Integer(self.index), value);
    }

    /// Start a dotted assignment rooted at the current array.
    pub fn begin_lvalue(&mut self) {
        self.lvalue = self.current;
    }

    /// Descend the lvalue target into `container`, creating an empty array
    /// there if needed, and push `next` as the pending index.
    pub fn dot(&mut self, container: Value, next: Value) {
        let container = self.checked(container);
        let found = self
            .arrays
            .get(self.lvalue)
            .map(|map| Value::from(map.get(Word::from(container))))
            .unwrap_or_default();

        match found {
            Value::Array(id) => {
                self.discard(container);
                self.lvalue = id;
            }
            Value::Nil => {
                let child = self.arrays.alloc();
                self.store(self.lvalue, container, Value::Array(child));
                self.lvalue = child;
            }
            other => {
                tracing::trace!(found = %other.kind(), "dot through non-array");
                self.discard(container);
                self.problem(DiagnosticKind::TypeMismatch, "lvalue required");
            }
        }
        self.push_literal(next);
    }

    /// Store `value` at `index` in the lvalue target.
    pub fn assign(&mut self, index: Value, value: Value) {
        let index = self.checked(index);
        let value = self.checked(value);
        self.store(self.lvalue, index, value);
    }

    /// Push the concatenation of two strings.
    ///
    /// Anything else is reported and replaced by [`ERROR_SENTINEL`] so the
    /// parse can go on.
    pub fn concat(&mut self, a: Value, b: Value) {
        let joined = match (a, b) {
            (Value::String(a), Value::String(b)) => {
                let mut joined = String::with_capacity(
                    self.pool.resolve(a).len() + self.pool.resolve(b).len(),
                );
                joined.push_str(self.pool.resolve(a));
                joined.push_str(self.pool.resolve(b));
                joined
            }
            _ => {
                self.problem(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "wrong types for string-cat operator ({} and {})",
                        a.kind(),
                        b.kind()
                    ),
                );
                self.discard(a);
                self.discard(b);
                ERROR_SENTINEL.to_string()
            }
        };
        let value = self.intern(&joined);
        self.push_literal(value);
    }

    /// Push the global value named `name`, or nil if there is none.
    ///
    /// Arrays are pushed as fresh copies.
    pub fn lookup_variable(&mut self, name: Value) {
        let found = self
            .arrays
            .get(self.global)
            .map(|map| Value::from(map.get(Word::from(name))))
            .unwrap_or_default();
        let value = match found {
            Value::Array(id) => Value::Array(self.arrays.deep_copy(id)),
            other => other,
        };
        self.push_literal(value);
    }

    /// Release `value` if it is an array that no slot owns.
    pub fn discard(&mut self, value: Value) {
        if let Value::Array(id) = value {
            if !self.arrays.is_attached(id) {
                self.arrays.release(id);
            }
        }
    }

    /// Problems recorded since the last call.
    pub fn take_problems(&mut self) -> Vec<Problem> {
        std::mem::take(&mut self.problems)
    }

    /// Finalize the tree and wrap it as a [`Config`].
    ///
    /// Values left on the stack and arrays no slot owns are released; with
    /// a well-behaved grammar there are none.
    pub fn finish(mut self, diagnostics: Vec<Diagnostic>) -> Config {
        if !self.stack.is_empty() {
            tracing::debug!(values = self.stack.len(), "values left on stack");
        }
        for value in std::mem::take(&mut self.stack) {
            self.discard(value);
        }
        let swept = self.arrays.sweep_detached(self.global);
        if swept > 0 {
            tracing::debug!(arrays = swept, "released stranded arrays");
        }
        Config::from_parts(self.pool, self.arrays, self.global, diagnostics)
    }

    /// Clamp an integer that does not fit in 63 bits, recording a problem.
    ///
    /// The parser never produces one; a host building values by hand can.
    fn checked(&mut self, value: Value) -> Value {
        match value {
            Value::Integer(n) if Value::integer(n).is_none() => {
                let clamped = n.clamp(INTEGER_MIN, INTEGER_MAX);
                self.problem(
                    DiagnosticKind::TypeMismatch,
                    format!("integer {n} out of range, stored as {clamped}"),
                );
                Value::Integer(clamped)
            }
            other => other,
        }
    }

    fn problem(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.problems.push(Problem {
            kind,
            message: message.into(),
        });
    }

    /// Store `value` at `key` in `target`, last write wins.
    fn store(&mut self, target: ArrayId, key: Value, value: Value) {
        let Some(map) = self.arrays.get_mut(target) else {
            tracing::debug!(array = target.index(), "store into released array");
            self.discard(key);
            self.discard(value);
            return;
        };
        let key_word = Word::from(key);
        let value_word = Word::from(value);
        let previous = map.set(key_word, value_word);

        if let Value::Array(id) = key {
            self.arrays.attach(id);
        }
        if let Value::Array(id) = value {
            self.arrays.attach(id);
        }
        if let Some(previous) = previous.filter(|previous| *previous != value_word) {
            tracing::debug!("overwriting existing value");
            self.arrays.release_value(Value::from(previous));
        }
    }
}
