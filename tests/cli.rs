use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cmd() -> Command {
    Command::cargo_bin("jsonrepair").unwrap()
}

#[test]
fn repairs_stdin_and_writes_to_stdout() {
    cmd()
        .write_stdin("{name: 'Alice', age: 30,}")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Alice\""));
}

#[test]
fn reads_from_a_file_argument() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[1, 2, 3,]").unwrap();

    cmd()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[\n  1,\n  2,\n  3\n]"));
}

#[test]
fn writes_to_output_path() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    write!(input, "{{a:1}}").unwrap();
    let output = tempfile::NamedTempFile::new().unwrap();

    cmd()
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .assert()
        .success();

    let written = std::fs::read_to_string(output.path()).unwrap();
    assert!(written.contains("\"a\": 1"));
}

#[test]
fn inline_rewrites_the_file_in_place() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    write!(input, "{{a:1}}").unwrap();

    cmd().arg(input.path()).arg("--inline").assert().success();

    let contents = std::fs::read_to_string(input.path()).unwrap();
    assert!(contents.contains("\"a\": 1"));
}

#[test]
fn inline_without_a_file_argument_is_an_error() {
    cmd()
        .arg("--inline")
        .write_stdin("{}")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn missing_input_file_is_an_io_error() {
    cmd()
        .arg("/no/such/path/for/jsonrepair/tests.json")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn custom_indent_is_honored() {
    cmd()
        .arg("--indent")
        .arg("4")
        .write_stdin("{\"a\":1}")
        .assert()
        .success()
        .stdout(predicate::str::contains("\n    \"a\": 1\n"));
}
