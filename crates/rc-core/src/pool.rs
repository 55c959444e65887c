//! String interning pool.
//!
//! Every string in a configuration, keys included, is stored exactly once.
//! Interning returns a [`Symbol`], so string equality anywhere else in the
//! crate is a word comparison.
//!
//! # Storage
//!
//! Strings shorter than [`OVERSIZED_LEN`] bytes are appended to the newest
//! 8 KiB arena block, or to a fresh one when they do not fit, and blocks are
//! released in bulk. Longer strings get their own
//! allocation.
//!
//! # Lookup
//!
//! The index is a trie whose branching key is the next 8-byte chunk of the
//! string, packed big-endian into a [`Word`]; the final chunk holds the
//! remaining 0-7 bytes, zero padded. Each trie level is a [`WordMap`] whose
//! slots hold either a string leaf or a reference to a deeper level. Two
//! strings only share a path for as long as their chunks agree, so interning
//! costs one map operation per 8 bytes and at most one suffix comparison.
//!
//! Interned strings never contain NUL: input is cut at the first NUL byte.
//! That keeps chunk keys unambiguous, since a full chunk never has a zero
//! byte while a short final chunk is padded with zeros.

use crate::assoc::WordMap;
use crate::value::{Kind, Word};

/// Strings of this many bytes or more bypass the arena.
pub const OVERSIZED_LEN: usize = 4096;

/// Size of one arena block.
pub const BLOCK_SIZE: usize = 8192;

const CHUNK: usize = std::mem::size_of::<u64>();

/// Handle of an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub(crate) fn from_index(index: u32) -> Self {
        Symbol(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
enum Storage {
    Arena { block: u32, start: u32, len: u32 },
    Oversized(Box<str>),
}

/// Counters reported by [`StringPool::stats`] and [`StringPool::teardown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Distinct strings.
    pub strings: usize,
    /// Strings stored outside the arena.
    pub oversized: usize,
    /// Arena blocks.
    pub blocks: usize,
    /// Trie levels, the root included.
    pub levels: usize,
}

/// Interning pool for configuration strings.
#[derive(Debug)]
pub struct StringPool {
    blocks: Vec<String>,
    strings: Vec<Storage>,
    /// `levels[0]` is the trie root.
    levels: Vec<WordMap>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            strings: Vec::new(),
            levels: vec![WordMap::new()],
        }
    }

    /// Intern `string`, returning the symbol shared by every equal string.
    pub fn intern(&mut self, string: &str) -> Symbol {
        let string = until_nul(string);
        let bytes = string.as_bytes();
        let mut level = 0;
        let mut offset = 0;

        loop {
            let key = chunk_key(bytes, offset);
            let slot = self.levels[level].get(key);

            if slot.is_nil() {
                let symbol = self.store(string);
                self.levels[level].set(key, Word::symbol(symbol));
                return symbol;
            }

            if let Some(symbol) = slot.as_symbol() {
                if self.suffix(symbol, offset) == bytes.get(offset..) {
                    return symbol;
                }
                // Same chunk, different string: push the old leaf one level
                // down, keyed by its own next chunk.
                let next = offset + CHUNK;
                let old_key = chunk_key(self.resolve(symbol).as_bytes(), next);
                let mut split = WordMap::new();
                split.set(old_key, slot);
                let index = self.levels.len();
                self.levels.push(split);
                self.levels[level].set(key, level_word(index));
                level = index;
                offset = next;
                continue;
            }

            match level_index(slot) {
                Some(index) => {
                    level = index;
                    offset += CHUNK;
                }
                // Trie slots only ever hold leaves and levels.
                None => unreachable!("corrupt string trie slot {slot:?}"),
            }
        }
    }

    /// Find `string` without interning it.
    pub fn find(&self, string: &str) -> Option<Symbol> {
        let bytes = until_nul(string).as_bytes();
        let mut level = 0;
        let mut offset = 0;

        loop {
            let slot = self.levels[level].get(chunk_key(bytes, offset));
            if slot.is_nil() {
                return None;
            }
            if let Some(symbol) = slot.as_symbol() {
                return (self.suffix(symbol, offset) == bytes.get(offset..)).then_some(symbol);
            }
            level = level_index(slot)?;
            offset += CHUNK;
        }
    }

    /// The text of an interned string.
    pub fn resolve(&self, symbol: Symbol) -> &str {
        match &self.strings[symbol.0 as usize] {
            Storage::Arena { block, start, len } => {
                let start = *start as usize;
                &self.blocks[*block as usize][start..start + *len as usize]
            }
            Storage::Oversized(string) => string,
        }
    }

    /// Number of distinct strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            strings: self.strings.len(),
            oversized: self
                .strings
                .iter()
                .filter(|s| matches!(s, Storage::Oversized(_)))
                .count(),
            blocks: self.blocks.len(),
            levels: self.levels.len(),
        }
    }

    /// Release the pool, walking the trie from the root.
    ///
    /// Oversized strings are released leaf by leaf; arena blocks go in bulk
    /// afterwards. The returned counters describe what was released.
    pub fn teardown(mut self) -> PoolStats {
        let mut released = PoolStats {
            blocks: self.blocks.len(),
            ..PoolStats::default()
        };
        let mut pending = vec![0usize];

        while let Some(level) = pending.pop() {
            let map = std::mem::take(&mut self.levels[level]);
            for slot in map.values() {
                if let Some(symbol) = slot.as_symbol() {
                    released.strings += 1;
                    let storage = &mut self.strings[symbol.0 as usize];
                    if let Storage::Oversized(string) = storage {
                        released.oversized += 1;
                        drop(std::mem::take(string));
                    }
                } else if let Some(index) = level_index(slot) {
                    pending.push(index);
                }
            }
            released.levels += 1;
        }

        tracing::trace!(
            strings = released.strings,
            oversized = released.oversized,
            blocks = released.blocks,
            "string pool released"
        );
        released
    }

    fn suffix(&self, symbol: Symbol, offset: usize) -> Option<&[u8]> {
        self.resolve(symbol).as_bytes().get(offset..)
    }

    fn store(&mut self, string: &str) -> Symbol {
        let symbol = Symbol(self.strings.len() as u32);
        if string.len() >= OVERSIZED_LEN {
            self.strings.push(Storage::Oversized(string.into()));
            return symbol;
        }

        // Only the newest block takes strings; older ones stay as they are.
        let fits = self
            .blocks
            .last()
            .is_some_and(|b| BLOCK_SIZE - b.len() >= string.len());
        if !fits {
            self.blocks.push(String::with_capacity(BLOCK_SIZE));
        }
        let block = self.blocks.len() - 1;
        let start = self.blocks[block].len();
        self.blocks[block].push_str(string);
        self.strings.push(Storage::Arena {
            block: block as u32,
            start: start as u32,
            len: string.len() as u32,
        });
        symbol
    }
}

fn until_nul(string: &str) -> &str {
    match string.find('\0') {
        Some(end) => &string[..end],
        None => string,
    }
}

/// Pack up to 8 bytes starting at `offset` big-endian, zero padded.
fn chunk_key(bytes: &[u8], offset: usize) -> Word {
    let rest = bytes.get(offset..).unwrap_or_default();
    let n = rest.len().min(CHUNK);
    let mut chunk = [0u8; CHUNK];
    chunk[..n].copy_from_slice(&rest[..n]);
    Word::from_raw(u64::from_be_bytes(chunk))
}

fn level_word(index: usize) -> Word {
    Word::reference(index as u32)
}

fn level_index(slot: Word) -> Option<usize> {
    if slot.kind() != Kind::Array {
        return None;
    }
    slot.reference_index().map(|index| index as usize)
}
