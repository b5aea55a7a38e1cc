//! Component F — L4 strict validator (§4.4).
//!
//! `serde_json::Value` silently drops duplicate object keys and cannot
//! see past the first of several top-level values, so strict-mode
//! checks are implemented by hand over the raw text rather than over a
//! decoded `Value`.

use serde_json::Value;

use crate::error::{RepairError, Result, StrictViolation};
use crate::scanner::Scanner;

/// Direct decode attempt used for the fast path and as L4's first try
/// after repair. Returns `None` rather than failing; callers fall back
/// to the strict hand-written checker for diagnostics.
pub fn try_decode(input: &str) -> Option<Value> {
    serde_json::from_str(input).ok()
}

pub fn decode(input: &str) -> Result<Value> {
    serde_json::from_str(input).map_err(RepairError::from)
}

/// Confirms `input` is exactly one well-formed JSON value with no
/// duplicate or empty object keys anywhere in the tree, and nothing but
/// whitespace before or after it.
pub fn check_strict(input: &str) -> std::result::Result<(), StrictViolation> {
    let mut sc = Scanner::new(input);
    sc.skip_bom();
    skip_ws(&mut sc);
    check_value(&mut sc)?;
    skip_ws(&mut sc);
    if !sc.is_empty() {
        return Err(StrictViolation::MultipleTopLevelValues);
    }
    Ok(())
}

fn skip_ws(sc: &mut Scanner) {
    while matches!(sc.peek(), Some(' ') | Some('\t') | Some('\n') | Some('\r')) {
        sc.bump();
    }
}

fn check_value(sc: &mut Scanner) -> std::result::Result<(), StrictViolation> {
    skip_ws(sc);
    match sc.peek() {
        Some('{') => check_object(sc),
        Some('[') => check_array(sc),
        Some('"') => check_string(sc),
        Some(c) if c == '-' || c.is_ascii_digit() => check_number(sc),
        Some('t') | Some('f') | Some('n') => check_keyword(sc),
        _ => Err(StrictViolation::InvalidJson("unexpected token".into())),
    }
}

fn check_object(sc: &mut Scanner) -> std::result::Result<(), StrictViolation> {
    sc.bump();
    let mut seen: Vec<String> = Vec::new();
    skip_ws(sc);
    if sc.peek() == Some('}') {
        sc.bump();
        return Ok(());
    }
    loop {
        skip_ws(sc);
        if sc.peek() != Some('"') {
            return Err(StrictViolation::InvalidJson("expected object key".into()));
        }
        let key = read_string_raw(sc)?;
        if key.is_empty() {
            return Err(StrictViolation::EmptyKey);
        }
        if seen.contains(&key) {
            return Err(StrictViolation::DuplicateKey(key));
        }
        seen.push(key);
        skip_ws(sc);
        if sc.peek() != Some(':') {
            return Err(StrictViolation::InvalidJson("expected ':'".into()));
        }
        sc.bump();
        check_value(sc)?;
        skip_ws(sc);
        match sc.peek() {
            Some(',') => {
                sc.bump();
            }
            Some('}') => {
                sc.bump();
                return Ok(());
            }
            _ => return Err(StrictViolation::InvalidJson("expected ',' or '}'".into())),
        }
    }
}

fn check_array(sc: &mut Scanner) -> std::result::Result<(), StrictViolation> {
    sc.bump();
    skip_ws(sc);
    if sc.peek() == Some(']') {
        sc.bump();
        return Ok(());
    }
    loop {
        check_value(sc)?;
        skip_ws(sc);
        match sc.peek() {
            Some(',') => {
                sc.bump();
            }
            Some(']') => {
                sc.bump();
                return Ok(());
            }
            _ => return Err(StrictViolation::InvalidJson("expected ',' or ']'".into())),
        }
    }
}

fn check_string(sc: &mut Scanner) -> std::result::Result<(), StrictViolation> {
    read_string_raw(sc).map(|_| ())
}

fn read_string_raw(sc: &mut Scanner) -> std::result::Result<String, StrictViolation> {
    sc.bump(); // opening quote
    let mut s = String::new();
    loop {
        match sc.bump() {
            None => return Err(StrictViolation::InvalidJson("unterminated string".into())),
            Some('"') => return Ok(s),
            Some('\\') => match sc.bump() {
                Some(c) => {
                    s.push('\\');
                    s.push(c);
                }
                None => return Err(StrictViolation::InvalidJson("unterminated escape".into())),
            },
            Some(c) => s.push(c),
        }
    }
}

fn check_number(sc: &mut Scanner) -> std::result::Result<(), StrictViolation> {
    let mut any = false;
    if sc.peek() == Some('-') {
        sc.bump();
    }
    while matches!(sc.peek(), Some(c) if c.is_ascii_digit()) {
        any = true;
        sc.bump();
    }
    if !any {
        return Err(StrictViolation::InvalidJson("malformed number".into()));
    }
    if sc.peek() == Some('.') {
        sc.bump();
        while matches!(sc.peek(), Some(c) if c.is_ascii_digit()) {
            sc.bump();
        }
    }
    if matches!(sc.peek(), Some('e') | Some('E')) {
        sc.bump();
        if matches!(sc.peek(), Some('+') | Some('-')) {
            sc.bump();
        }
        while matches!(sc.peek(), Some(c) if c.is_ascii_digit()) {
            sc.bump();
        }
    }
    Ok(())
}

fn check_keyword(sc: &mut Scanner) -> std::result::Result<(), StrictViolation> {
    for kw in ["true", "false", "null"] {
        if sc.starts_with(kw) {
            sc.advance_bytes(kw.len());
            return Ok(());
        }
    }
    Err(StrictViolation::InvalidJson("unrecognized keyword".into()))
}
