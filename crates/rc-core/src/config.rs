//! The parsed configuration and its query API.

use crate::arena::{ArrayArena, ArrayId};
use crate::assoc::Cursor;
use crate::diagnostic::Diagnostic;
use crate::engine::Session;
use crate::error::{ConfigError, LookupError, Result};
use crate::options::ReadOptions;
use crate::parser;
use crate::pool::StringPool;
use crate::scanner::Scanner;
use crate::value::{Kind, Value, Word};
use crate::writer;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Counters reported by [`Config::free`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FreeStats {
    /// Arrays released, the root included.
    pub arrays: usize,
    /// Interned strings released.
    pub strings: usize,
    /// Strings that lived outside the pool's arena blocks.
    pub oversized: usize,
    /// String trie levels released.
    pub levels: usize,
}

/// A configuration tree together with the pool and arena backing it.
///
/// ```
/// use rc_core::Config;
///
/// let config = Config::read_str(&[("home", "/srv")], r#"
///     name = "demo"
///     paths = [ home "/data", home "/log" ]
///     limits.open = 64
/// "#).unwrap();
///
/// assert_eq!(config.get_string(&["name"]).unwrap(), "demo");
/// let paths = config.get_array(&["paths"]).unwrap();
/// let (_, log) = config.elements(paths).nth(1).unwrap();
/// assert_eq!(config.resolve(log), Some("/srv/log"));
/// assert_eq!(config.get_integer(&["limits", "open"]).unwrap(), 64);
/// assert!(config.diagnostics().is_empty());
/// ```
#[derive(Debug)]
pub struct Config {
    pool: StringPool,
    arrays: ArrayArena,
    root: ArrayId,
    diagnostics: Vec<Diagnostic>,
}

impl Config {
    pub(crate) fn from_parts(
        pool: StringPool,
        arrays: ArrayArena,
        root: ArrayId,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            pool,
            arrays,
            root,
            diagnostics,
        }
    }

    /// Read a configuration from `reader` with default options.
    ///
    /// `imports` are `(name, value)` string constants visible to the text as
    /// variables.
    pub fn read<R: Read>(imports: &[(&str, &str)], reader: R) -> Result<Self> {
        Self::read_with(&ReadOptions::default(), imports, reader)
    }

    /// Read a configuration from `reader`.
    ///
    /// Malformed text still produces a configuration; the problems are in
    /// [`Config::diagnostics`]. Bytes that are not valid UTF-8 are replaced
    /// with U+FFFD and reported there too. `Err` means the stream itself
    /// failed.
    pub fn read_with<R: Read>(
        options: &ReadOptions,
        imports: &[(&str, &str)],
        mut reader: R,
    ) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let scanner = Scanner::from_bytes(options.source_name.clone(), bytes);
        Self::parse(options, imports, scanner)
    }

    /// Read a configuration from a string.
    pub fn read_str(imports: &[(&str, &str)], text: &str) -> Result<Self> {
        let options = ReadOptions::default();
        let scanner = Scanner::new(options.source_name.clone(), text);
        Self::parse(&options, imports, scanner)
    }

    /// Read a configuration file; `-` reads standard input.
    pub fn read_file(imports: &[(&str, &str)], path: impl AsRef<Path>) -> Result<Self> {
        Self::read_file_with(&ReadOptions::default(), imports, path)
    }

    /// Read a configuration file with explicit options.
    ///
    /// The file name replaces `options.source_name` in diagnostics.
    pub fn read_file_with(
        options: &ReadOptions,
        imports: &[(&str, &str)],
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new("-") {
            let options = options.clone().with_source_name("-");
            return Self::read_with(&options, imports, io::stdin().lock());
        }

        let name = path.display().to_string();
        let file = File::open(path).map_err(|source| ConfigError::Open {
            path: name.clone(),
            source,
        })?;
        let options = options.clone().with_source_name(name);
        Self::read_with(&options, imports, file)
    }

    fn parse(options: &ReadOptions, imports: &[(&str, &str)], scanner: Scanner) -> Result<Self> {
        let mut session = Session::with_imports(imports);
        let diagnostics = parser::parse(&mut session, scanner, options)?;
        tracing::debug!(
            source = %options.source_name,
            diagnostics = diagnostics.len(),
            "configuration read"
        );
        Ok(session.finish(diagnostics))
    }

    /// The top-level array.
    pub fn root(&self) -> ArrayId {
        self.root
    }

    /// Problems found while reading, in source order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    /// Number of arrays in the tree.
    pub fn live_arrays(&self) -> usize {
        self.arrays.live()
    }

    /// Text of a string value.
    pub fn resolve(&self, value: Value) -> Option<&str> {
        value.as_symbol().map(|symbol| self.pool.resolve(symbol))
    }

    /// Walk `path` from the root array.
    pub fn lookup(&self, path: &[&str]) -> std::result::Result<Value, LookupError> {
        self.lookup_in(self.root, path)
    }

    /// Walk `path` from `array`. An empty path yields `array` itself.
    ///
    /// Path segments are looked up, never interned: a segment the pool has
    /// never seen cannot be a key.
    pub fn lookup_in(
        &self,
        array: ArrayId,
        path: &[&str],
    ) -> std::result::Result<Value, LookupError> {
        let mut value = Value::Array(array);
        for key in path {
            let map = value
                .as_array()
                .and_then(|id| self.arrays.get(id))
                .ok_or_else(|| {
                    tracing::debug!(key = *key, "array required for index");
                    LookupError::NotAnArray {
                        key: key.to_string(),
                    }
                })?;
            value = self
                .pool
                .find(key)
                .map(|symbol| Value::from(map.get(Word::from(Value::String(symbol)))))
                .unwrap_or_default();
            if value.is_nil() {
                return Err(LookupError::Missing {
                    key: key.to_string(),
                });
            }
        }
        Ok(value)
    }

    /// Value of any kind at `path`.
    pub fn get_object(&self, path: &[&str]) -> std::result::Result<Value, LookupError> {
        self.lookup(path)
    }

    pub fn get_integer(&self, path: &[&str]) -> std::result::Result<i64, LookupError> {
        let value = self.lookup(path)?;
        value.as_integer().ok_or_else(|| wrong_kind(Kind::Integer, value))
    }

    /// A non-negative integer at `path`.
    pub fn get_unsigned(&self, path: &[&str]) -> std::result::Result<u64, LookupError> {
        let value = self.lookup(path)?;
        value
            .as_integer()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| wrong_kind(Kind::Integer, value))
    }

    /// An integer at `path`, read as `n != 0`.
    pub fn get_boolean(&self, path: &[&str]) -> std::result::Result<bool, LookupError> {
        self.get_integer(path).map(|n| n != 0)
    }

    pub fn get_double(&self, path: &[&str]) -> std::result::Result<f64, LookupError> {
        let value = self.lookup(path)?;
        value.as_float().ok_or_else(|| wrong_kind(Kind::Float, value))
    }

    pub fn get_string(&self, path: &[&str]) -> std::result::Result<&str, LookupError> {
        let value = self.lookup(path)?;
        self.resolve(value)
            .ok_or_else(|| wrong_kind(Kind::String, value))
    }

    pub fn get_array(&self, path: &[&str]) -> std::result::Result<ArrayId, LookupError> {
        let value = self.lookup(path)?;
        value.as_array().ok_or_else(|| wrong_kind(Kind::Array, value))
    }

    /// First entry of `array` as `(key, value, cursor)`.
    pub fn array_first(&self, array: ArrayId) -> Option<(Value, Value, Cursor)> {
        let (key, value, cursor) = self.arrays.get(array)?.first()?;
        Some((Value::from(key), Value::from(value), cursor))
    }

    /// Entry of `array` after `cursor`.
    pub fn array_next(&self, array: ArrayId, cursor: Cursor) -> Option<(Value, Value, Cursor)> {
        let (key, value, cursor) = self.arrays.get(array)?.next(cursor)?;
        Some((Value::from(key), Value::from(value), cursor))
    }

    /// First entry of `array` with an integer key.
    pub fn array_first_fixed_key(&self, array: ArrayId) -> Option<(i64, Value, Cursor)> {
        let first = self.array_first(array)?;
        self.skip_to_fixed_key(array, first)
    }

    /// Next entry of `array` after `cursor` with an integer key.
    pub fn array_next_fixed_key(
        &self,
        array: ArrayId,
        cursor: Cursor,
    ) -> Option<(i64, Value, Cursor)> {
        let next = self.array_next(array, cursor)?;
        self.skip_to_fixed_key(array, next)
    }

    fn skip_to_fixed_key(
        &self,
        array: ArrayId,
        mut entry: (Value, Value, Cursor),
    ) -> Option<(i64, Value, Cursor)> {
        loop {
            let (key, value, cursor) = entry;
            if let Value::Integer(n) = key {
                return Some((n, value, cursor));
            }
            entry = self.array_next(array, cursor)?;
        }
    }

    /// All entries of `array` in insertion order.
    pub fn entries(&self, array: ArrayId) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.arrays
            .get(array)
            .into_iter()
            .flat_map(|map| map.iter())
            .map(|(key, value)| (Value::from(key), Value::from(value)))
    }

    /// Integer-keyed entries of `array` in insertion order.
    pub fn elements(&self, array: ArrayId) -> impl Iterator<Item = (i64, Value)> + '_ {
        self.entries(array)
            .filter_map(|(key, value)| key.as_integer().map(|n| (n, value)))
    }

    /// Write the configuration as text that reads back into the same tree.
    pub fn write<W: Write>(&self, mut out: W) -> io::Result<()> {
        out.write_all(self.to_text().as_bytes())?;
        out.flush()
    }

    /// Write the configuration to `path`; `-` writes standard output.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let result = if path == Path::new("-") {
            self.write(io::stdout().lock())
        } else {
            File::create(path).and_then(|file| self.write(io::BufWriter::new(file)))
        };
        result.map_err(|source| ConfigError::Write { path: name, source })
    }

    pub fn to_text(&self) -> String {
        writer::render(self)
    }

    /// Export the tree as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&writer::json(self))?)
    }

    /// JSON form of a single value; arrays are converted recursively.
    pub fn value_to_json(&self, value: Value) -> serde_json::Value {
        writer::json_value(self, value)
    }

    /// Release every array reachable from the root, then the string pool.
    pub fn free(mut self) -> FreeStats {
        let arrays = self.arrays.release(self.root);
        if self.arrays.live() != 0 {
            tracing::debug!(arrays = self.arrays.live(), "arrays outside the tree");
        }
        let pool = self.pool.teardown();
        FreeStats {
            arrays,
            strings: pool.strings,
            oversized: pool.oversized,
            levels: pool.levels,
        }
    }
}

fn wrong_kind(expected: Kind, found: Value) -> LookupError {
    tracing::debug!(expected = %expected, found = %found.kind(), "value of wrong kind");
    LookupError::WrongKind {
        expected,
        found: found.kind(),
    }
}
