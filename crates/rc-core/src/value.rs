//! Tagged configuration values.
//!
//! A [`Value`] is one of integer, float, string, array or nil. Scalars are
//! stored inline; strings and arrays are small handles into the owning
//! [`StringPool`](crate::StringPool) and [`ArrayArena`](crate::ArrayArena).
//!
//! Every value also has a one-word encoding, [`Word`], which is what array
//! objects and the string trie actually store:
//!
//! ```text
//! ...xxxx1   integer  63-bit payload
//! ...xxx10   float    f64 bits, low two mantissa bits replaced by the tag
//! ...xx100   string   symbol index << 3
//! ...xx000   array    (arena index + 1) << 3
//! 00...000   nil
//! ```
//!
//! # Float precision
//!
//! The float tag lives in the two lowest mantissa bits, so floats are
//! truncated on construction ([`truncate_float`]). At most two bits of the
//! 52-bit mantissa are lost; in exchange a float literal never needs its own
//! allocation.

use crate::arena::ArrayId;
use crate::pool::Symbol;
use std::fmt;

/// Largest integer a [`Value`] can hold (one bit is used by the tag).
pub const INTEGER_MAX: i64 = i64::MAX >> 1;

/// Smallest integer a [`Value`] can hold.
pub const INTEGER_MIN: i64 = i64::MIN >> 1;

const INTEGER_TAG: u64 = 0b1;
const FLOAT_TAG: u64 = 0b10;
const FLOAT_MASK: u64 = 0b11;
const STRING_TAG: u64 = 0b100;
const REFERENCE_MASK: u64 = 0b111;
const REFERENCE_SHIFT: u32 = 3;

/// Clear the two low mantissa bits of `number`.
///
/// This is the lossy step applied to every float stored in a configuration.
/// Values that already have those bits clear (all small integers, halves,
/// quarters, ...) pass through unchanged.
pub fn truncate_float(number: f64) -> f64 {
    f64::from_bits(number.to_bits() & !FLOAT_MASK)
}

/// The kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Nil,
    Integer,
    Float,
    String,
    Array,
}

impl Kind {
    /// Lowercase name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Nil => "nil",
            Kind::Integer => "an integer",
            Kind::Float => "a double",
            Kind::String => "a string",
            Kind::Array => "an array",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configuration value.
///
/// `Float` always holds an already truncated number when built through
/// [`Value::float`]; [`Word`] encoding truncates again regardless.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Integer(i64),
    Float(f64),
    String(Symbol),
    Array(ArrayId),
}

impl Value {
    /// Build an integer value, or `None` if `n` needs all 64 bits.
    pub fn integer(n: i64) -> Option<Self> {
        if (INTEGER_MIN..=INTEGER_MAX).contains(&n) {
            Some(Value::Integer(n))
        } else {
            None
        }
    }

    /// Build a float value, truncating two mantissa bits.
    pub fn float(number: f64) -> Self {
        Value::Float(truncate_float(number))
    }

    pub fn string(symbol: Symbol) -> Self {
        Value::String(symbol)
    }

    pub fn array(id: ArrayId) -> Self {
        Value::Array(id)
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Integer(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Value::String(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<ArrayId> {
        match self {
            Value::Array(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<ArrayId> for Value {
    fn from(id: ArrayId) -> Self {
        Value::Array(id)
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::String(symbol)
    }
}

/// One-word encoding of a [`Value`].
///
/// Classification is a handful of bit tests; decoding an integer or a float
/// never leaves the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Word(u64);

impl Word {
    /// The nil word. Maps also return it for absent keys.
    pub const NIL: Word = Word(0);

    /// Wrap raw bits, e.g. a string-trie chunk key.
    pub const fn from_raw(bits: u64) -> Self {
        Word(bits)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub fn is_nil(self) -> bool {
        self.0 == 0
    }

    /// Classify without decoding.
    pub fn kind(self) -> Kind {
        if self.0 & INTEGER_TAG != 0 {
            Kind::Integer
        } else if self.0 & FLOAT_MASK == FLOAT_TAG {
            Kind::Float
        } else if self.0 & REFERENCE_MASK == STRING_TAG {
            Kind::String
        } else if self.0 == 0 {
            Kind::Nil
        } else {
            Kind::Array
        }
    }

    /// An untagged reference to slot `index` of some table.
    ///
    /// Array values use it for arena slots; the string pool uses it for trie
    /// levels. Never nil.
    pub(crate) fn reference(index: u32) -> Self {
        Word((u64::from(index) + 1) << REFERENCE_SHIFT)
    }

    /// Inverse of [`Word::reference`]; `None` unless the word is a reference.
    pub(crate) fn reference_index(self) -> Option<u32> {
        if self.kind() != Kind::Array {
            return None;
        }
        u32::try_from((self.0 >> REFERENCE_SHIFT) - 1).ok()
    }

    /// A leaf word for `symbol`.
    pub(crate) fn symbol(symbol: Symbol) -> Self {
        Word((u64::from(symbol.index()) << REFERENCE_SHIFT) | STRING_TAG)
    }

    pub(crate) fn as_symbol(self) -> Option<Symbol> {
        if self.kind() != Kind::String {
            return None;
        }
        u32::try_from(self.0 >> REFERENCE_SHIFT)
            .ok()
            .map(Symbol::from_index)
    }
}

impl From<Value> for Word {
    fn from(value: Value) -> Self {
        match value {
            Value::Nil => Word::NIL,
            // Out-of-range integers built by hand lose their top bit here.
            Value::Integer(n) => Word(((n as u64) << 1) | INTEGER_TAG),
            Value::Float(f) => Word((f.to_bits() & !FLOAT_MASK) | FLOAT_TAG),
            Value::String(symbol) => Word::symbol(symbol),
            Value::Array(id) => Word::reference(id.index()),
        }
    }
}

impl From<Word> for Value {
    fn from(word: Word) -> Self {
        match word.kind() {
            Kind::Nil => Value::Nil,
            Kind::Integer => Value::Integer((word.0 as i64) >> 1),
            Kind::Float => Value::Float(f64::from_bits(word.0 & !FLOAT_MASK)),
            Kind::String => word.as_symbol().map_or(Value::Nil, Value::String),
            Kind::Array => word
                .reference_index()
                .map_or(Value::Nil, |index| Value::Array(ArrayId::from_index(index))),
        }
    }
}
