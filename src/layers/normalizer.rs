//! Component E — L3 context-aware syntax normalizer (§4.3).
//!
//! A recursive-descent walk over the output of L2 (already
//! brace/bracket-balanced) that re-emits corrected JSON text token by
//! token instead of parsing straight into a `Value`. Every correction
//! logs a `RepairAction`, and the walk never hard-fails: an unrecognized
//! token is copied through unchanged rather than aborting the layer.

use crate::context::{LayerId, ParseContext, RepairContext, Role};
use crate::scanner::{is_double_quote_like, is_single_quote_like, is_whitespace, Scanner};

pub fn run(input: &str, ctx: &mut RepairContext) -> String {
    let mut sc = Scanner::new(input);
    let mut pc = ParseContext::default();
    let mut out = String::with_capacity(input.len() + 16);
    sc.skip_bom();
    normalize_value(&mut sc, &mut pc, &mut out, ctx);
    // Trailing ellipsis / junk after the top-level value is dropped.
    skip_trailing_ellipsis_and_junk(&mut sc, &mut out, ctx);
    out
}

fn skip_ws(sc: &mut Scanner, out: &mut String, keep: bool) {
    while let Some(c) = sc.peek() {
        if is_whitespace(c) {
            if keep {
                out.push(c);
            }
            sc.bump();
        } else {
            break;
        }
    }
}

fn normalize_value(sc: &mut Scanner, pc: &mut ParseContext, out: &mut String, ctx: &mut RepairContext) {
    skip_ws(sc, out, true);
    match sc.peek() {
        Some('{') => normalize_object(sc, pc, out, ctx),
        Some('[') => normalize_array(sc, pc, out, ctx),
        Some(c) if is_double_quote_like(c) || is_single_quote_like(c) => {
            normalize_string(sc, out, ctx, /*is_key*/ false);
        }
        Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
            normalize_numeric_or_hybrid(sc, out, ctx);
        }
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            normalize_bareword_value(sc, out, ctx);
        }
        Some('<') => {
            normalize_unquoted_html(sc, out, ctx);
        }
        Some(c) if !matches!(c, ',' | '}' | ']' | ':') => {
            // Unquoted HTML/text fragment used as a value (§4.3
            // unquoted_string_value): consume until a structural
            // delimiter and re-emit quoted.
            normalize_unquoted_fragment(sc, out, ctx);
        }
        _ => {}
    }
}

fn normalize_object(sc: &mut Scanner, pc: &mut ParseContext, out: &mut String, ctx: &mut RepairContext) {
    sc.bump(); // '{'
    out.push('{');
    pc.enter(Role::ObjectKey);
    loop {
        skip_ws(sc, out, true);
        match sc.peek() {
            None => break,
            Some('}') => {
                sc.bump();
                break;
            }
            Some(',') => {
                // Stray leading/duplicate comma: drop it and look again.
                ctx.log(LayerId::SyntaxNormalization, "dropped stray comma", Some(sc.char_pos()));
                sc.bump();
                continue;
            }
            _ => {}
        }

        if let Some(len) = is_bare_comment_keyword(sc) {
            let after_ws = sc.remaining()[len..].trim_start();
            if !after_ws.starts_with(':') {
                let pos = sc.char_pos();
                sc.advance_bytes(len);
                ctx.log(LayerId::SyntaxNormalization, "dropped comment keyword", Some(pos));
                continue;
            }
        }

        pc.current_role = Role::ObjectKey;
        normalize_key(sc, out, ctx);
        skip_ws(sc, out, true);
        if sc.peek() == Some(':') {
            out.push(':');
            sc.bump();
        } else {
            ctx.log(LayerId::SyntaxNormalization, "inserted missing colon", Some(sc.char_pos()));
            out.push(':');
        }
        skip_ws(sc, out, true);
        pc.current_role = Role::ObjectValue;
        normalize_value(sc, pc, out, ctx);
        skip_ws(sc, out, true);

        match sc.peek() {
            Some(',') => {
                out.push(',');
                sc.bump();
            }
            Some('}') => {
                sc.bump();
                break;
            }
            None => break,
            _ => {
                ctx.log(LayerId::SyntaxNormalization, "inserted missing comma", Some(sc.char_pos()));
                out.push(',');
            }
        }
    }
    if out.ends_with(',') {
        out.pop();
        ctx.log(LayerId::SyntaxNormalization, "dropped trailing comma", Some(sc.char_pos()));
    }
    out.push('}');
    pc.exit();
}

fn normalize_array(sc: &mut Scanner, pc: &mut ParseContext, out: &mut String, ctx: &mut RepairContext) {
    sc.bump(); // '['
    out.push('[');
    pc.enter(Role::Array);
    loop {
        skip_ws(sc, out, true);
        match sc.peek() {
            None => break,
            Some(']') => {
                sc.bump();
                break;
            }
            Some(',') => {
                ctx.log(LayerId::SyntaxNormalization, "dropped stray comma", Some(sc.char_pos()));
                sc.bump();
                continue;
            }
            _ => {}
        }

        if is_bare_ellipsis_element(sc) {
            let pos = sc.char_pos();
            sc.advance_bytes(3);
            ctx.log(LayerId::SyntaxNormalization, "dropped ellipsis element", Some(pos));
            continue;
        }

        if let Some(len) = is_bare_comment_keyword(sc) {
            let pos = sc.char_pos();
            sc.advance_bytes(len);
            ctx.log(LayerId::SyntaxNormalization, "dropped comment keyword", Some(pos));
            continue;
        }

        normalize_value(sc, pc, out, ctx);
        skip_ws(sc, out, true);
        match sc.peek() {
            Some(',') => {
                out.push(',');
                sc.bump();
            }
            Some(']') => {
                sc.bump();
                break;
            }
            None => break,
            _ => {
                ctx.log(LayerId::SyntaxNormalization, "inserted missing comma", Some(sc.char_pos()));
                out.push(',');
            }
        }
    }
    if out.ends_with(',') {
        out.pop();
        ctx.log(LayerId::SyntaxNormalization, "dropped trailing comma", Some(sc.char_pos()));
    }
    out.push(']');
    pc.exit();
}

/// Detects a bare `...` array element (§4.3 ellipsis_filter), an LLM
/// truncation marker rather than a value, without consuming it.
fn is_bare_ellipsis_element(sc: &Scanner) -> bool {
    let rest = sc.remaining();
    if !rest.starts_with("...") {
        return false;
    }
    matches!(
        rest[3..].chars().next(),
        None | Some(',') | Some(']') | Some(' ') | Some('\t') | Some('\n') | Some('\r')
    )
}

/// Detects an unquoted ALL_CAPS identifier (§4.3 comment_keyword) sitting
/// where a key or array element is expected, e.g. a stray `TODO` or
/// `NOTE` token an LLM left behind. Recognized literal aliases (`TRUE`,
/// `NULL`, `NONE`, and friends) are excluded since those already have a
/// defined meaning via [`normalize_bareword_value`]. Returns the byte
/// length of the identifier when it matches, without consuming it.
fn is_bare_comment_keyword(sc: &Scanner) -> Option<usize> {
    let rest = sc.remaining();
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    let mut end = first.len_utf8();
    for (i, c) in chars {
        if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' {
            end = i + c.len_utf8();
        } else if c.is_ascii_lowercase() {
            return None;
        } else {
            break;
        }
    }
    if end < 2 {
        return None;
    }
    let lower = rest[..end].to_ascii_lowercase();
    if matches!(lower.as_str(), "true" | "false" | "null" | "none" | "nil" | "undefined" | "nan") {
        return None;
    }
    Some(end)
}

/// An object key: quoted (any quote style) or a bare identifier.
fn normalize_key(sc: &mut Scanner, out: &mut String, ctx: &mut RepairContext) {
    match sc.peek() {
        Some(c) if is_double_quote_like(c) || is_single_quote_like(c) => {
            normalize_string(sc, out, ctx, true);
        }
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            let pos = sc.char_pos();
            let ident = sc.take_ident().to_string();
            ctx.log(LayerId::SyntaxNormalization, "quoted bare key", Some(pos));
            out.push('"');
            out.push_str(&ident);
            out.push('"');
        }
        _ => {
            // Anything else up to ':' becomes the (quoted) key text.
            let pos = sc.char_pos();
            let tok = sc.take_symbol_until_delim().to_string();
            if tok.is_empty() {
                ctx.log(LayerId::SyntaxNormalization, "synthesized empty key", Some(pos));
                out.push_str("\"\"");
            } else {
                ctx.log(LayerId::SyntaxNormalization, "quoted bare key", Some(pos));
                out.push('"');
                push_escaped(out, &tok);
                out.push('"');
            }
        }
    }
}

/// A string literal opened by any quote style (double, single, or a
/// "smart"/curly quote). Re-emits as a canonical double-quoted JSON
/// string, escaping embedded double quotes, and tolerates the closer
/// being missing (EOF or next structural delimiter ends it).
fn normalize_string(sc: &mut Scanner, out: &mut String, ctx: &mut RepairContext, is_key: bool) {
    let open_pos = sc.char_pos();
    let opener = sc.bump().unwrap();
    let non_canonical = opener != '"';
    if non_canonical {
        ctx.log(
            LayerId::SyntaxNormalization,
            if is_key { "normalized quoted key" } else { "normalized smart quote" },
            Some(open_pos),
        );
    }
    out.push('"');
    let mut closed = false;
    while let Some(c) = sc.peek() {
        if c == '\\' {
            let esc_pos = sc.char_pos();
            out.push(c);
            sc.bump();
            if let Some(next) = sc.peek() {
                out.push(next);
                sc.bump();
            } else {
                let _ = esc_pos;
            }
            continue;
        }
        if c == opener {
            sc.bump();
            closed = true;
            break;
        }
        // A bare double quote closing a single-quoted string, or vice
        // versa, stays literal content; only the original opener closes.
        if c == '"' && opener != '"' {
            out.push('\\');
            out.push('"');
            sc.bump();
            continue;
        }
        if c == '\n' || c == '\r' {
            // Unterminated string before a delimiter/newline: close here.
            ctx.log(LayerId::SyntaxNormalization, "closed unterminated string", Some(sc.char_pos()));
            closed = true;
            break;
        }
        out.push(c);
        sc.bump();
    }
    if !closed {
        ctx.log(LayerId::SyntaxNormalization, "closed unterminated string at end of input", Some(sc.char_pos()));
    }
    out.push('"');
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
}

/// Dispatches a digit/`-`/`+`/`.`-led token to either the numeric
/// normalizer or, when the token isn't a well-formed JSON number at all
/// (a fraction `1/3`, a range `10-20`, a multi-dot version `1.1.1`, or a
/// digit/letter hybrid `1x`), quotes the whole token as a string
/// (§4.3 number_coerce).
fn normalize_numeric_or_hybrid(sc: &mut Scanner, out: &mut String, ctx: &mut RepairContext) {
    let token = sc.peek_symbol_until_delim();
    if is_plain_json_number(token) {
        normalize_number(sc, out, ctx);
        return;
    }
    let pos = sc.char_pos();
    let consumed = sc.take_symbol_until_delim().to_string();
    ctx.log(LayerId::SyntaxNormalization, "quoted numeric-hybrid value", Some(pos));
    out.push('"');
    push_escaped(out, &consumed);
    out.push('"');
}

/// True when `tok` parses as a JSON number modulo the tolerated
/// anomalies `normalize_number` already fixes (leading `+`, leading
/// `.`, thousands separators, trailing `.`).
fn is_plain_json_number(tok: &str) -> bool {
    let mut chars = tok.chars().peekable();
    if matches!(chars.peek(), Some('+') | Some('-')) {
        chars.next();
    }
    let mut saw_digit = false;
    let mut saw_dot = false;
    let mut saw_exp = false;
    while let Some(&c) = chars.peek() {
        match c {
            '0'..='9' => {
                saw_digit = true;
                chars.next();
            }
            '.' if !saw_dot && !saw_exp => {
                saw_dot = true;
                chars.next();
            }
            ',' if saw_digit && !saw_exp => {
                chars.next();
            }
            'e' | 'E' if saw_digit && !saw_exp => {
                saw_exp = true;
                chars.next();
                if matches!(chars.peek(), Some('+') | Some('-')) {
                    chars.next();
                }
            }
            _ => return false,
        }
    }
    saw_digit
}

/// Numbers, tolerating a leading `.`, a leading `+`, thousands
/// separators, and a trailing decimal point.
fn normalize_number(sc: &mut Scanner, out: &mut String, ctx: &mut RepairContext) {
    let start_pos = sc.char_pos();
    let mut buf = String::new();
    let mut saw_digit = false;
    let mut saw_comma = false;

    if sc.peek() == Some('+') {
        ctx.log(LayerId::SyntaxNormalization, "dropped leading plus sign", Some(start_pos));
        sc.bump();
    }
    if sc.peek() == Some('-') {
        buf.push('-');
        sc.bump();
    }
    if sc.peek() == Some('.') {
        buf.push('0');
        ctx.log(LayerId::SyntaxNormalization, "inserted leading zero before decimal point", Some(start_pos));
    }
    while let Some(c) = sc.peek() {
        match c {
            '0'..='9' => {
                saw_digit = true;
                buf.push(c);
                sc.bump();
            }
            ',' if saw_digit && matches!(sc.peek2(), Some('0'..='9')) => {
                saw_comma = true;
                sc.bump();
            }
            '.' | 'e' | 'E' | '+' | '-' => {
                buf.push(c);
                sc.bump();
            }
            _ => break,
        }
    }
    if saw_comma {
        ctx.log(LayerId::SyntaxNormalization, "stripped thousands separator", Some(start_pos));
    }
    if buf.ends_with('.') {
        buf.push('0');
        ctx.log(LayerId::SyntaxNormalization, "appended trailing zero after decimal point", Some(start_pos));
    }
    out.push_str(&buf);
}

/// `True`/`False`/`None`/`nil`/`undefined` and similar non-JSON literals
/// (§4.3 python_literal), plus the canonical `true`/`false`/`null` passed
/// through unchanged.
fn normalize_bareword_value(sc: &mut Scanner, out: &mut String, ctx: &mut RepairContext) {
    let pos = sc.char_pos();
    let ident = sc.take_ident();
    let lower = ident.to_ascii_lowercase();
    match lower.as_str() {
        "true" | "false" | "null" => {
            if ident != lower {
                ctx.log(LayerId::SyntaxNormalization, "normalized literal casing", Some(pos));
            }
            out.push_str(&lower);
        }
        "none" | "nil" | "undefined" | "nan" => {
            ctx.log(LayerId::SyntaxNormalization, "normalized python-style literal", Some(pos));
            out.push_str("null");
        }
        _ => {
            // Unrecognized bareword: treat as an unquoted string value.
            ctx.log(LayerId::SyntaxNormalization, "quoted bare value", Some(pos));
            out.push('"');
            push_escaped(out, ident);
            out.push('"');
        }
    }
}

/// An unquoted HTML fragment used as a value (§4.3 unquoted_html):
/// consumes everything up to the next top-level structural delimiter
/// (`,`, `}`, `]`), since tags may contain spaces and colons that would
/// otherwise end a bare token, and re-emits it quoted.
fn normalize_unquoted_html(sc: &mut Scanner, out: &mut String, ctx: &mut RepairContext) {
    let pos = sc.char_pos();
    let mut buf = String::new();
    while let Some(c) = sc.peek() {
        if matches!(c, ',' | '}' | ']') {
            break;
        }
        buf.push(c);
        sc.bump();
    }
    ctx.log(LayerId::SyntaxNormalization, "quoted unquoted HTML value", Some(pos));
    out.push('"');
    push_escaped(out, buf.trim_end());
    out.push('"');
}

/// Consumes an unquoted run of text (e.g. a stray `<br>` or other
/// unquoted HTML/prose value) up to the next structural delimiter and
/// re-emits it as a quoted string.
fn normalize_unquoted_fragment(sc: &mut Scanner, out: &mut String, ctx: &mut RepairContext) {
    let pos = sc.char_pos();
    let tok = sc.take_symbol_until_delim();
    if tok.is_empty() {
        // Dangling delimiter we don't recognize; consume one char so we
        // always make forward progress.
        if let Some(c) = sc.bump() {
            out.push(c);
        }
        return;
    }
    ctx.log(LayerId::SyntaxNormalization, "quoted unquoted value", Some(pos));
    out.push('"');
    push_escaped(out, tok);
    out.push('"');
}

/// Drops a trailing ellipsis (`...`) or other junk that follows a
/// complete top-level value, e.g. truncation markers from an LLM.
fn skip_trailing_ellipsis_and_junk(sc: &mut Scanner, out: &mut String, ctx: &mut RepairContext) {
    skip_ws(sc, out, false);
    if sc.is_empty() {
        return;
    }
    let pos = sc.char_pos();
    let rest = sc.remaining();
    if rest.starts_with("...") || rest.chars().all(|c| c == '.') {
        ctx.log(LayerId::SyntaxNormalization, "dropped trailing ellipsis", Some(pos));
    }
}
