use rc_core::{Config, Session, Value};
use serde_json::json;
use tempfile::TempDir;

fn read(text: &str) -> Config {
    let config = Config::read_str(&[], text).unwrap();
    assert!(config.diagnostics().is_empty(), "{:?}", config.diagnostics());
    config
}

fn json_of(config: &Config) -> serde_json::Value {
    serde_json::from_str(&config.to_json().unwrap()).unwrap()
}

// ============================================================================
// Text layout
// ============================================================================

#[test]
fn top_level_entries_have_no_brackets() {
    let config = read("name = \"demo\"\nport = 80\nratio = 0.5\n");
    assert_eq!(config.to_text(), "name = \"demo\"\nport = 80\nratio = 0.5\n");
}

#[test]
fn nested_arrays_indent_by_four() {
    let config = read("ports = [80, 443]\nserver = [ tls = [ on = 1 ] ]\n");
    let expected = "\
ports = [
    [0] = 80
    [1] = 443
    ]
server = [
    tls = [
        on = 1
        ]
    ]
";
    assert_eq!(config.to_text(), expected);
}

#[test]
fn non_identifier_keys_are_bracketed() {
    let config = read("[\"two words\"] = 1\n[\"include\"] = 2\n[-4] = 3\n[1.5] = 4\n");
    assert_eq!(
        config.to_text(),
        "[\"two words\"] = 1\n[\"include\"] = 2\n[-4] = 3\n[1.5] = 4\n"
    );
}

#[test]
fn array_keys_indent_by_two() {
    let config = read("[[1]] = \"x\"\n");
    assert_eq!(config.to_text(), "[[\n      [0] = 1\n      ]] = \"x\"\n");
}

#[test]
fn strings_are_escaped() {
    let config = read(r#"s = "quote \" slash \\ tab \t line \n end""#);
    assert_eq!(
        config.to_text(),
        "s = \"quote \\\" slash \\\\ tab \\t line \\n end\"\n"
    );
}

#[test]
fn floats_keep_one_decimal() {
    let config = read("whole = 3.0\nhalf = -0.5\nlarge = 1e3\n");
    assert_eq!(
        config.to_text(),
        "whole = 3.0\nhalf = -0.5\nlarge = 1000.0\n"
    );
}

#[test]
fn nil_entries_are_left_out() {
    let config = read("nil = 5\nx = undefined\nlist = [ undefined, 7 ]\n");
    let text = config.to_text();
    assert_eq!(text, "nil = 5\nlist = [\n    [1] = 7\n    ]\n");

    let back = read(&text);
    assert!(back.lookup(&["x"]).is_err());
    assert_eq!(back.get_integer(&["nil"]), Ok(5));
}

#[test]
fn infinite_floats_read_back_as_infinite() {
    let config = read("big = 1e999\nsmall = -1e999\n");
    let text = config.to_text();
    assert_eq!(text, "big = 1e999\nsmall = -1e999\n");

    let back = read(&text);
    assert_eq!(back.get_double(&["big"]), Ok(f64::INFINITY));
    assert_eq!(back.get_double(&["small"]), Ok(f64::NEG_INFINITY));
}

#[test]
fn nan_entries_are_left_out() {
    let mut session = Session::new();
    let key = session.intern("ratio");
    session.add_item(key, Value::float(f64::NAN));
    let key = session.intern("kept");
    session.add_item(key, Value::Integer(1));

    let config = session.finish(Vec::new());
    assert_eq!(config.to_text(), "kept = 1\n");
}

#[test]
fn empty_config_writes_nothing() {
    assert_eq!(read("").to_text(), "");
}

// ============================================================================
// Round trips
// ============================================================================

const COMPLEX: &str = r#"
    name = "round trip"
    version = 3
    weights = [ 0.5, 1.5, -2.0 ]
    server = [ host = "localhost", ports = [ 80, 443 ], tls.cert = "/etc/cert" ]
    [7] = "seventh", "eighth"
    ["odd key"] = [ [[1, 2]] = "array key" ]
    escaped = "a \"quoted\" word"
"#;

#[test]
fn written_text_reads_back_to_the_same_tree() {
    let first = read(COMPLEX);
    let text = first.to_text();
    let second = read(&text);

    assert_eq!(second.to_text(), text);
    assert_eq!(json_of(&second), json_of(&first));
    assert_eq!(second.live_arrays(), first.live_arrays());
}

#[test]
fn write_matches_to_text() {
    let config = read(COMPLEX);
    let mut out = Vec::new();
    config.write(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), config.to_text());
}

#[test]
fn write_file_then_read_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.rc");
    let config = read(COMPLEX);
    config.write_file(&path).unwrap();

    let back = Config::read_file(&[], &path).unwrap();
    assert!(back.diagnostics().is_empty());
    assert_eq!(json_of(&back), json_of(&config));
}

#[test]
fn write_file_to_missing_directory_fails() {
    let config = read("x = 1");
    let err = config
        .write_file("/definitely/not/a/dir/out.rc")
        .unwrap_err();
    assert!(err.to_string().starts_with("can't write configuration file"));
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn json_lists_and_objects() {
    let config = read(
        r#"
        list = [1, 2]
        map = [ a = 1, b = "two" ]
        sparse = [ [5] = 1 ]
        empty = []
        ratio = 0.25
        "#,
    );
    assert_eq!(
        json_of(&config),
        json!({
            "list": [1, 2],
            "map": { "a": 1, "b": "two" },
            "sparse": { "5": 1 },
            "empty": [],
            "ratio": 0.25
        })
    );
}

#[test]
fn json_root_of_positional_entries_is_a_list() {
    let config = read("\"a\", \"b\"");
    assert_eq!(json_of(&config), json!(["a", "b"]));
}

#[test]
fn json_nil_is_null() {
    let config = read("x = undefined");
    assert_eq!(json_of(&config), json!({ "x": null }));
}

#[test]
fn json_of_a_single_value() {
    let config = read("server = [ host = \"db\", ports = [5432, 5433] ]\nname = \"x\"");
    let server = config.lookup(&["server"]).unwrap();
    assert_eq!(
        config.value_to_json(server),
        json!({ "host": "db", "ports": [5432, 5433] })
    );
    let name = config.lookup(&["name"]).unwrap();
    assert_eq!(config.value_to_json(name), json!("x"));
}
