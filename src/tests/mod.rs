use crate::{repair, repair_to_string, Options};
use serde_json::json;

fn opts() -> Options {
    Options::default()
}

#[test]
fn passes_through_already_valid_json_with_no_repairs() {
    let mut o = opts();
    o.logging = true;
    let (value, log) = crate::repair_with_log(r#"{"a":1,"b":[1,2,3]}"#, &o).unwrap();
    assert_eq!(value, json!({"a": 1, "b": [1, 2, 3]}));
    assert!(log.is_empty());
}

#[test]
fn logging_flag_gates_the_repair_log() {
    let input = r#"{name: 'Alice', age: 30,}"#;

    let (_, log_off) = crate::repair_with_log(input, &opts()).unwrap();
    assert!(log_off.is_empty());

    let mut logging_on = opts();
    logging_on.logging = true;
    let (_, log_on) = crate::repair_with_log(input, &logging_on).unwrap();
    assert!(!log_on.is_empty());
}

#[test]
fn unquoted_keys_single_quotes_and_python_literals() {
    let value = repair(r#"{name: 'Alice', age: 30, active: True}"#, &opts()).unwrap();
    assert_eq!(value, json!({"name": "Alice", "age": 30, "active": true}));
}

#[test]
fn trailing_comma_in_array() {
    let value = repair("[1, 2, 3,]", &opts()).unwrap();
    assert_eq!(value, json!([1, 2, 3]));
}

#[test]
fn trailing_comma_in_object() {
    let value = repair(r#"{"a": 1, "b": 2,}"#, &opts()).unwrap();
    assert_eq!(value, json!({"a": 1, "b": 2}));
}

#[test]
fn code_fence_wrapping_is_stripped() {
    let value = repair("```json\n{\"x\":1}\n```", &opts()).unwrap();
    assert_eq!(value, json!({"x": 1}));
}

#[test]
fn multiple_top_level_values_become_an_array() {
    let value = repair(r#"{"a":1}{"b":2}"#, &opts()).unwrap();
    assert_eq!(value, json!([{"a": 1}, {"b": 2}]));
}

#[test]
fn object_boundary_merging_absorbs_dangling_pair() {
    let value = repair(r#"{"k": "v", "k2": "v2"}"#, &opts()).unwrap();
    assert_eq!(value, json!({"k": "v", "k2": "v2"}));

    let merged = repair(r#"{"k": "v"}, "k2": "v2"}"#, &opts()).unwrap();
    assert_eq!(merged, json!({"k": "v", "k2": "v2"}));
}

#[test]
fn number_anomalies_are_quoted_or_coerced() {
    let value = repair(r#"{"decimal": .5}"#, &opts()).unwrap();
    assert_eq!(value, json!({"decimal": 0.5}));

    let value = repair(
        r#"{"fraction": 1/3, "range": 10-20, "decimal": .5, "version": 1.0.0}"#,
        &opts(),
    )
    .unwrap();
    assert_eq!(
        value,
        json!({"fraction": "1/3", "range": "10-20", "decimal": 0.5, "version": "1.0.0"})
    );
}

#[test]
fn thousands_separators_are_stripped() {
    let value = repair(r#"{"n": 1,234,567}"#, &opts()).unwrap();
    assert_eq!(value, json!({"n": 1234567}));
}

#[test]
fn ellipsis_is_dropped_from_arrays() {
    let text = repair_to_string("[1, 2, 3, ...]", &opts()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, json!([1, 2, 3]));
}

#[test]
fn comment_keyword_is_dropped() {
    let value = repair(r#"[1, TODO, 2]"#, &opts()).unwrap();
    assert_eq!(value, json!([1, 2]));

    let value = repair(r#"{"a": 1, NOTE, "b": 2}"#, &opts()).unwrap();
    assert_eq!(value, json!({"a": 1, "b": 2}));
}

#[test]
fn comments_are_stripped_outside_strings() {
    let value = repair("[1, 2 /* two */, 3] // trailing", &opts()).unwrap();
    assert_eq!(value, json!([1, 2, 3]));
}

#[test]
fn unclosed_string_is_closed_at_eof() {
    let value = repair(r#"{"a": "unterminated"#, &opts()).unwrap();
    assert_eq!(value["a"], "unterminated");
}

#[test]
fn lone_opener_becomes_empty_container() {
    assert_eq!(repair("{", &opts()).unwrap(), json!({}));
    assert_eq!(repair("[", &opts()).unwrap(), json!([]));
}

#[test]
fn empty_and_whitespace_only_input_is_plain_text() {
    assert_eq!(repair("", &opts()).unwrap(), json!(""));
    assert_eq!(repair("   \n\t", &opts()).unwrap(), json!(""));
}

#[test]
fn strict_mode_accepts_only_clean_single_values() {
    let mut o = opts();
    o.strict_mode = true;
    assert!(repair(r#"{"a":1}"#, &o).is_ok());
    assert!(repair(r#"{a:1}"#, &o).is_err());
    assert!(repair(r#"{"a":1,"a":2}"#, &o).is_err());
    assert!(repair(r#"{"a":1}{"b":2}"#, &o).is_err());
}

#[test]
fn strict_mode_success_implies_non_strict_success_with_empty_log() {
    let mut strict = opts();
    strict.strict_mode = true;
    let v_strict = repair(r#"{"a":1}"#, &strict).unwrap();

    let mut logging_opts = opts();
    logging_opts.logging = true;
    let (v_plain, log) = crate::repair_with_log(r#"{"a":1}"#, &logging_opts).unwrap();
    assert_eq!(v_strict, v_plain);
    assert!(log.is_empty());
}

#[test]
fn repair_to_string_round_trips_through_repair_again() {
    let input = r#"{name: 'Alice', age: 30,}"#;
    let first = repair(input, &opts()).unwrap();
    let text = repair_to_string(input, &opts()).unwrap();
    let second = repair(&text, &opts()).unwrap();
    assert_eq!(first, second);

    let mut logging_opts = opts();
    logging_opts.logging = true;
    let (_, log) = crate::repair_with_log(&text, &logging_opts).unwrap();
    assert!(log.is_empty());
}

#[test]
fn unquoted_html_value_is_quoted() {
    let value = repair(r#"{"body":<!DOCTYPE html><html></html>}"#, &opts());
    assert!(value.is_ok());
}

#[test]
fn smart_quotes_are_normalized() {
    let value = repair("{\u{201C}a\u{201D}: \u{201C}b\u{201D}}", &opts()).unwrap();
    assert_eq!(value, json!({"a": "b"}));
}

#[test]
fn mismatched_closers_are_corrected() {
    let value = repair(r#"{"a": [1, 2}"#, &opts()).unwrap();
    assert_eq!(value, json!({"a": [1, 2]}));
}

#[test]
fn lone_closer_with_nothing_open_is_unrepairable() {
    // A lone structural closer with nothing open is dropped as redundant
    // by L2, leaving an empty document; L4 then has nothing to decode.
    assert!(repair("}", &opts()).is_err());
}
