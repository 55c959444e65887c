use rc_core::pool::OVERSIZED_LEN;
use rc_core::{Config, FreeStats, Kind, LookupError, Value};

const SAMPLE: &str = r#"
    name = "demo"
    port = 8080
    offset = -3
    ratio = 0.5
    debug = 0
    verbose = 3
    server = [ host = "localhost", tls = [ enabled = 1 ] ]
    mixed = [ label = "x", 10, 20, flag = 1, 30 ]
"#;

fn sample() -> Config {
    let config = Config::read_str(&[], SAMPLE).unwrap();
    assert!(config.diagnostics().is_empty(), "{:?}", config.diagnostics());
    config
}

// ============================================================================
// Typed getters
// ============================================================================

#[test]
fn getters_return_typed_values() {
    let config = sample();
    assert_eq!(config.get_string(&["name"]), Ok("demo"));
    assert_eq!(config.get_integer(&["port"]), Ok(8080));
    assert_eq!(config.get_unsigned(&["port"]), Ok(8080));
    assert_eq!(config.get_double(&["ratio"]), Ok(0.5));
    assert_eq!(config.get_boolean(&["debug"]), Ok(false));
    assert_eq!(config.get_boolean(&["verbose"]), Ok(true));
    assert_eq!(config.get_string(&["server", "host"]), Ok("localhost"));
    assert_eq!(config.get_boolean(&["server", "tls", "enabled"]), Ok(true));
    assert_eq!(config.get_array(&["server"]).map(|_| ()), Ok(()));
}

#[test]
fn get_object_returns_any_kind() {
    let config = sample();
    assert_eq!(config.get_object(&["port"]), Ok(Value::Integer(8080)));
    assert_eq!(config.get_object(&["server"]).unwrap().kind(), Kind::Array);
}

#[test]
fn empty_path_yields_root() {
    let config = sample();
    assert_eq!(config.lookup(&[]), Ok(Value::Array(config.root())));
}

#[test]
fn lookup_in_starts_from_sub_array() {
    let config = sample();
    let server = config.get_array(&["server"]).unwrap();
    assert_eq!(
        config.lookup_in(server, &["tls", "enabled"]),
        Ok(Value::Integer(1))
    );
}

#[test]
fn missing_key_is_distinct_error() {
    let config = sample();
    assert_eq!(
        config.get_integer(&["nope"]),
        Err(LookupError::Missing { key: "nope".into() })
    );
    assert_eq!(
        config.get_integer(&["server", "port"]),
        Err(LookupError::Missing { key: "port".into() })
    );
}

#[test]
fn indexing_a_scalar_is_distinct_error() {
    let config = sample();
    let err = config.get_integer(&["name", "length"]).unwrap_err();
    assert_eq!(
        err,
        LookupError::NotAnArray {
            key: "length".into()
        }
    );
    assert_eq!(err.to_string(), "array required for index 'length'");
}

#[test]
fn wrong_kind_is_distinct_error() {
    let config = sample();
    assert_eq!(
        config.get_integer(&["name"]),
        Err(LookupError::WrongKind {
            expected: Kind::Integer,
            found: Kind::String
        })
    );
    assert_eq!(
        config.get_string(&["port"]),
        Err(LookupError::WrongKind {
            expected: Kind::String,
            found: Kind::Integer
        })
    );
    assert_eq!(
        config.get_double(&["port"]).unwrap_err().to_string(),
        "value isn't a double, found an integer"
    );
    assert!(config.get_array(&["name"]).is_err());
}

#[test]
fn unsigned_rejects_negative_integers() {
    let config = sample();
    assert_eq!(config.get_integer(&["offset"]), Ok(-3));
    assert!(matches!(
        config.get_unsigned(&["offset"]),
        Err(LookupError::WrongKind { .. })
    ));
}

#[test]
fn lookups_do_not_intern_path_segments() {
    let config = sample();
    let before = config.pool().len();
    let _ = config.get_integer(&["some", "unseen", "path"]);
    assert_eq!(config.pool().len(), before);
}

// ============================================================================
// Iteration
// ============================================================================

#[test]
fn cursor_iteration_visits_all_entries_in_order() {
    let config = sample();
    let mixed = config.get_array(&["mixed"]).unwrap();

    let mut seen = Vec::new();
    let mut entry = config.array_first(mixed);
    while let Some((key, value, cursor)) = entry {
        seen.push((key.kind(), value));
        entry = config.array_next(mixed, cursor);
    }
    assert_eq!(seen.len(), 5);
    assert_eq!(seen[0].0, Kind::String);
    assert_eq!(seen[1], (Kind::Integer, Value::Integer(10)));
    assert_eq!(seen[3], (Kind::String, Value::Integer(1)));
    assert_eq!(seen[4], (Kind::Integer, Value::Integer(30)));
}

#[test]
fn fixed_key_iteration_skips_named_entries() {
    let config = sample();
    let mixed = config.get_array(&["mixed"]).unwrap();

    let mut seen = Vec::new();
    let mut entry = config.array_first_fixed_key(mixed);
    while let Some((index, value, cursor)) = entry {
        seen.push((index, value));
        entry = config.array_next_fixed_key(mixed, cursor);
    }
    assert_eq!(
        seen,
        [
            (0, Value::Integer(10)),
            (1, Value::Integer(20)),
            (2, Value::Integer(30))
        ]
    );
}

#[test]
fn fixed_key_iteration_of_named_only_array_is_empty() {
    let config = sample();
    let server = config.get_array(&["server"]).unwrap();
    assert_eq!(config.array_first_fixed_key(server), None);
    assert_eq!(config.elements(server).count(), 0);
}

#[test]
fn entries_and_elements_agree_with_cursors() {
    let config = sample();
    let mixed = config.get_array(&["mixed"]).unwrap();
    assert_eq!(config.entries(mixed).count(), 5);
    let values: Vec<Value> = config.elements(mixed).map(|(_, v)| v).collect();
    assert_eq!(
        values,
        [Value::Integer(10), Value::Integer(20), Value::Integer(30)]
    );
}

#[test]
fn resolve_only_applies_to_strings() {
    let config = sample();
    let name = config.get_object(&["name"]).unwrap();
    assert_eq!(config.resolve(name), Some("demo"));
    assert_eq!(config.resolve(Value::Integer(1)), None);
}

// ============================================================================
// Release
// ============================================================================

#[test]
fn free_releases_every_array_and_string_once() {
    let config = Config::read_str(&[], "a = [ b = [ c = 1 ] ]\nd = [1, 2]\n").unwrap();
    assert_eq!(config.live_arrays(), 4);

    let stats = config.free();
    assert_eq!(
        stats,
        FreeStats {
            arrays: 4,
            strings: 4,
            oversized: 0,
            levels: 1,
        }
    );
}

#[test]
fn free_follows_array_keys() {
    let config = Config::read_str(&[], "[[1]] = [2]\n").unwrap();
    assert_eq!(config.live_arrays(), 3);
    assert_eq!(config.free().arrays, 3);
}

#[test]
fn free_counts_oversized_strings() {
    let text = format!("big = \"{}\"\n", "x".repeat(OVERSIZED_LEN + 1));
    let config = Config::read_str(&[], &text).unwrap();
    let stats = config.free();
    assert_eq!(stats.oversized, 1);
    assert_eq!(stats.strings, 2);
}

#[test]
fn diagnostics_serialize_to_json() {
    let config = Config::read_str(&[], "x = =\n").unwrap();
    let json = serde_json::to_value(&config.diagnostics()[0]).unwrap();
    assert_eq!(json["kind"], "syntax");
    assert_eq!(json["file"], "-");
    assert_eq!(json["line"], 1);
    assert_eq!(json["token"], "=");
    assert!(json.get("context").is_none());
}
