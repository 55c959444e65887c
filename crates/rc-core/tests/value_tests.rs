use rc_core::value::{truncate_float, INTEGER_MAX, INTEGER_MIN};
use rc_core::{Config, Kind, StringPool, Value, Word};

// ============================================================================
// Classification
// ============================================================================

#[test]
fn nil_is_the_zero_word() {
    assert_eq!(Word::NIL.raw(), 0);
    assert_eq!(Word::NIL.kind(), Kind::Nil);
    assert_eq!(Value::default(), Value::Nil);
    assert_eq!(Word::from(Value::Nil), Word::NIL);
}

#[test]
fn integer_word_has_low_bit_set() {
    let word = Word::from(Value::Integer(3));
    assert_eq!(word.raw(), 0b111);
    assert_eq!(word.kind(), Kind::Integer);
    assert_eq!(Value::from(word), Value::Integer(3));
}

#[test]
fn negative_integer_keeps_its_sign() {
    let word = Word::from(Value::Integer(-42));
    assert_eq!(word.kind(), Kind::Integer);
    assert_eq!(Value::from(word), Value::Integer(-42));
}

#[test]
fn integer_range_excludes_the_tag_bit() {
    assert_eq!(Value::integer(INTEGER_MAX), Some(Value::Integer(INTEGER_MAX)));
    assert_eq!(Value::integer(INTEGER_MIN), Some(Value::Integer(INTEGER_MIN)));
    assert_eq!(Value::integer(INTEGER_MAX + 1), None);
    assert_eq!(Value::integer(INTEGER_MIN - 1), None);

    for n in [INTEGER_MAX, INTEGER_MIN, 0, -1, 1] {
        assert_eq!(Value::from(Word::from(Value::Integer(n))), Value::Integer(n));
    }
}

#[test]
fn float_word_has_float_tag() {
    let word = Word::from(Value::float(1.5));
    assert_eq!(word.raw() & 0b11, 0b10);
    assert_eq!(word.kind(), Kind::Float);
    assert_eq!(Value::from(word), Value::Float(1.5));
}

#[test]
fn float_truncation_drops_two_mantissa_bits() {
    assert_eq!(truncate_float(1.0 + f64::EPSILON), 1.0);
    assert_eq!(truncate_float(0.25), 0.25);
    assert_eq!(truncate_float(-2000.0), -2000.0);

    let third = 1.0 / 3.0;
    let stored = Value::from(Word::from(Value::float(third))).as_float().unwrap();
    assert_ne!(stored, third);
    assert!((stored - third).abs() < 1e-15);
}

#[test]
fn string_word_has_string_tag() {
    let mut pool = StringPool::new();
    let symbol = pool.intern("hello");
    let word = Word::from(Value::String(symbol));
    assert_eq!(word.raw() & 0b111, 0b100);
    assert_eq!(word.kind(), Kind::String);
    assert_eq!(Value::from(word).as_symbol(), Some(symbol));
}

#[test]
fn array_word_is_never_nil() {
    let config = Config::read_str(&[], "").unwrap();
    let word = Word::from(Value::Array(config.root()));
    assert_ne!(word, Word::NIL);
    assert_eq!(word.raw() & 0b111, 0);
    assert_eq!(word.kind(), Kind::Array);
    assert_eq!(Value::from(word), Value::Array(config.root()));
}

// ============================================================================
// Accessors
// ============================================================================

#[test]
fn accessors_match_kind() {
    let value = Value::Integer(9);
    assert_eq!(value.kind(), Kind::Integer);
    assert_eq!(value.as_integer(), Some(9));
    assert_eq!(value.as_float(), None);
    assert_eq!(value.as_symbol(), None);
    assert_eq!(value.as_array(), None);
    assert!(!value.is_nil());
    assert!(Value::Nil.is_nil());
}

#[test]
fn kind_names_read_as_phrases() {
    assert_eq!(Kind::Integer.to_string(), "an integer");
    assert_eq!(Kind::Float.to_string(), "a double");
    assert_eq!(Kind::String.to_string(), "a string");
    assert_eq!(Kind::Array.to_string(), "an array");
    assert_eq!(Kind::Nil.to_string(), "nil");
}
