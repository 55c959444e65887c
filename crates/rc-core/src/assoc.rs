//! Word-keyed associative arrays.
//!
//! [`WordMap`] is the storage behind every array object and every level of
//! the string trie. Keys and values are [`Word`]s; lookups are exact-key only
//! and iteration follows insertion order.

use crate::value::Word;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Position of an entry during cursor-style iteration.
///
/// A cursor stays usable as long as no entry is removed from the map, which
/// never happens while a configuration is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(usize);

/// Insertion-ordered `Word → Word` map.
#[derive(Debug, Clone, Default)]
pub struct WordMap {
    entries: IndexMap<Word, Word, FxBuildHasher>,
}

impl WordMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the slot for `key`, creating it with `default` if absent.
    /// An existing slot is returned unmodified.
    pub fn insert(&mut self, key: Word, default: Word) -> &mut Word {
        self.entries.entry(key).or_insert(default)
    }

    /// Store `value` at `key`, returning the word it replaced.
    pub fn set(&mut self, key: Word, value: Word) -> Option<Word> {
        self.entries.insert(key, value)
    }

    /// The word at `key`, or [`Word::NIL`] if there is none.
    pub fn get(&self, key: Word) -> Word {
        self.entries.get(&key).copied().unwrap_or(Word::NIL)
    }

    pub fn contains(&self, key: Word) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry and a cursor to continue from.
    pub fn first(&self) -> Option<(Word, Word, Cursor)> {
        self.at(0)
    }

    /// Entry after `cursor`.
    pub fn next(&self, cursor: Cursor) -> Option<(Word, Word, Cursor)> {
        self.at(cursor.0 + 1)
    }

    fn at(&self, position: usize) -> Option<(Word, Word, Cursor)> {
        self.entries
            .get_index(position)
            .map(|(key, value)| (*key, *value, Cursor(position)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Word, Word)> + '_ {
        self.entries.iter().map(|(key, value)| (*key, *value))
    }

    /// All values, in insertion order.
    pub fn values(&self) -> impl Iterator<Item = Word> + '_ {
        self.entries.values().copied()
    }
}
