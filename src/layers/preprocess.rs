//! Component G — preprocessors (§4.5).
//!
//! Runs ahead of L1 and operates on the raw input text, in a fixed
//! sequence: multiple-value detection first, then (per candidate, or
//! the whole text when only one candidate exists) ten further
//! heuristics in order, then object-boundary merging as a final,
//! separately gated pass. Each heuristic either fires when its pattern
//! is unambiguous or leaves the text untouched.

use crate::context::{LayerId, RepairContext};
use crate::options::Options;
use crate::scanner::{is_double_quote_like, is_single_quote_like, Scanner};

pub enum PreprocessOutcome {
    Single(String),
    Multiple(Vec<String>),
}

pub fn run(input: &str, opts: &Options, ctx: &mut RepairContext) -> PreprocessOutcome {
    if !opts.enable_early_hardcoded_patterns {
        return PreprocessOutcome::Single(input.to_string());
    }

    let candidates = split_top_level_values(input);
    if candidates.len() > 1 {
        ctx.log(LayerId::ContentCleaning, "detected multiple top-level values", Some(0));
        let fixed = candidates.into_iter().map(|c| apply_fixed_sequence(&c, ctx)).collect();
        return PreprocessOutcome::Multiple(fixed);
    }

    let text = apply_fixed_sequence(input, ctx);
    let merged = if opts.enable_object_merging {
        merge_object_boundary(&text, ctx)
    } else {
        text
    };

    PreprocessOutcome::Single(merged)
}

/// The nine remaining steps of the §4.5 fixed sequence, applied in
/// order to a single candidate (multiple-value detection itself having
/// already run to produce that candidate).
fn apply_fixed_sequence(input: &str, ctx: &mut RepairContext) -> String {
    let text = normalize_smart_quotes(input, ctx);
    let text = fix_doubled_quotes(&text, ctx);
    let text = extract_embedded_code_fence(&text, ctx);
    let text = strip_trailing_fence_marker(&text, ctx);
    let text = fix_missing_opening_quote(&text, ctx);
    let text = fix_embedded_quotes(&text, ctx);
    let text = fix_unclosed_string_before_delimiter(&text, ctx);
    let text = split_truncated_key_in_array(&text, ctx);
    coerce_object_to_array(&text, ctx)
}

/// Curly/smart double quotes -> canonical double quotes, outside of
/// already-canonical string bodies is a no-op; this only rewrites the
/// delimiter characters themselves, leaving the string-aware layers to
/// interpret content.
fn normalize_smart_quotes(input: &str, ctx: &mut RepairContext) -> String {
    let mut changed = false;
    let out: String = input
        .chars()
        .map(|c| {
            if c == '\u{201C}' || c == '\u{201D}' {
                changed = true;
                '"'
            } else {
                c
            }
        })
        .collect();
    if changed {
        ctx.log(LayerId::ContentCleaning, "normalized smart quotes", Some(0));
    }
    out
}

/// Collapses a doubled quote used to escape a quote (`""` meaning a
/// literal `"` inside a string some exporters produce) into a single
/// escaped quote, only when it occurs strictly between two other
/// quote-delimited characters (i.e. not a legitimate `""` empty string).
fn fix_doubled_quotes(input: &str, ctx: &mut RepairContext) -> String {
    if !input.contains("\"\"\"") {
        return input.to_string();
    }
    let fixed = input.replace("\"\"\"", "\\\"\\\"");
    ctx.log(LayerId::ContentCleaning, "collapsed doubled escape quotes", Some(0));
    fixed
}

/// Extracts the body of the first Markdown code fence found anywhere in
/// the input (not just one wrapping the whole text), discarding any
/// prose before or after it. A fence opening inside a string literal is
/// left alone.
fn extract_embedded_code_fence(input: &str, ctx: &mut RepairContext) -> String {
    let Some(start) = find_unquoted_triple_backtick(input) else {
        return input.to_string();
    };
    let after_ticks = start + 3;
    let lang_skip = Scanner::fence_open_lang_newline_len(&input[after_ticks..]);
    let body_start = after_ticks + lang_skip;
    let Some(end_rel) = input[body_start..].find("```") else {
        return input.to_string();
    };
    let body_end = body_start + end_rel;
    ctx.log(LayerId::ContentCleaning, "extracted embedded code fence", Some(start));
    input[body_start..body_end].trim().to_string()
}

/// Byte offset of the first "```" that occurs outside any string literal.
fn find_unquoted_triple_backtick(s: &str) -> Option<usize> {
    let mut in_string = false;
    let mut quote = '\0';
    let mut escape = false;
    for (i, ch) in s.char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_string = false;
            }
            continue;
        }
        if is_double_quote_like(ch) || is_single_quote_like(ch) {
            in_string = true;
            quote = ch;
            continue;
        }
        if s[i..].starts_with("```") {
            return Some(i);
        }
    }
    None
}

/// Drops a stray fence marker (```` ``` ````) that trails after the
/// last structural closer with nothing else following, left behind when
/// an opening fence was already removed elsewhere upstream.
fn strip_trailing_fence_marker(input: &str, ctx: &mut RepairContext) -> String {
    let trimmed = input.trim_end();
    if let Some(stripped) = trimmed.strip_suffix("```") {
        ctx.log(LayerId::ContentCleaning, "stripped trailing fence marker", Some(0));
        return stripped.trim_end().to_string();
    }
    input.to_string()
}

/// A value or key that is missing its opening quote but does have a
/// closing one right before a structural delimiter (`:`, `,`, `}`, `]`)
/// is given a synthetic opener. Conservative: only fires when a closing
/// quote is found before the next delimiter with no quote in between.
fn fix_missing_opening_quote(input: &str, ctx: &mut RepairContext) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut quote = '\0';
    let mut escape = false;
    let mut chars = input.char_indices().peekable();
    let mut fired = false;

    while let Some((i, ch)) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_string = false;
            }
            continue;
        }
        if is_double_quote_like(ch) || is_single_quote_like(ch) {
            in_string = true;
            quote = ch;
            out.push(ch);
            continue;
        }
        // After a ':' or ',' or '{'/'[' followed by whitespace, check
        // whether an unquoted token ends with a lone quote before the
        // next delimiter: that indicates a missing opener.
        if matches!(ch, ':' | ',' | '{' | '[') {
            out.push(ch);
            let rest = &input[i + ch.len_utf8()..];
            let probe = rest.trim_start();
            let ws_len = rest.len() - probe.len();
            if let Some(close_rel) = find_bare_closing_quote(probe) {
                out.push_str(&rest[..ws_len]);
                for _ in 0..ws_len {
                    chars.next();
                }
                out.push('"');
                out.push_str(&probe[..close_rel]);
                fired = true;
                for _ in 0..probe[..close_rel].chars().count() {
                    chars.next();
                }
            }
            continue;
        }
        out.push(ch);
    }
    if fired {
        ctx.log(LayerId::ContentCleaning, "inserted missing opening quote", Some(0));
    }
    out
}

/// Returns the byte offset of a `"` that occurs before any structural
/// delimiter, only when at least one ordinary character preceded it:
/// a bare trailing closer after an unquoted token, not a normal opening
/// quote sitting at the very start of the probe.
fn find_bare_closing_quote(s: &str) -> Option<usize> {
    let mut saw_leading_char = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' if saw_leading_char => return Some(i),
            '"' => return None,
            ':' | ',' | '{' | '}' | '[' | ']' | ' ' | '\t' | '\n' | '\r' => return None,
            _ => saw_leading_char = true,
        }
    }
    None
}

/// Escapes a `"` that appears inside a string's content rather than
/// ending it. The real end of a string is recognized by the first
/// significant character after it (skipping whitespace) looking like
/// `,`, `:`, `}`, `]`, or end of input; a quote followed by more text,
/// as in `"John "Johnny" Smith"`, is embedded and gets escaped instead
/// of closing the string early.
fn fix_embedded_quotes(input: &str, ctx: &mut RepairContext) -> String {
    let mut out = String::with_capacity(input.len());
    let mut it = input.char_indices().peekable();
    let mut fired = false;
    while let Some((_, ch)) = it.next() {
        if ch != '"' {
            out.push(ch);
            continue;
        }
        out.push('"');
        loop {
            match it.next() {
                None => break,
                Some((_, '\\')) => {
                    out.push('\\');
                    if let Some(&(_, next)) = it.peek() {
                        out.push(next);
                        it.next();
                    }
                }
                Some((pos, '"')) => {
                    let probe = input[pos + 1..].trim_start();
                    let is_real_end = probe.is_empty()
                        || matches!(probe.chars().next(), Some(',') | Some(':') | Some('}') | Some(']'));
                    if is_real_end {
                        out.push('"');
                        break;
                    }
                    fired = true;
                    out.push_str("\\\"");
                }
                Some((_, c)) => out.push(c),
            }
        }
    }
    if fired {
        ctx.log(LayerId::ContentCleaning, "escaped embedded quote inside string", Some(0));
    }
    out
}

/// A string left open at a structural delimiter (`,`, `}`, `]`) with no
/// closing quote anywhere before it is force-closed right there.
fn fix_unclosed_string_before_delimiter(input: &str, ctx: &mut RepairContext) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escape = false;
    let mut fired = false;
    for ch in input.chars() {
        if in_string {
            if escape {
                escape = false;
                out.push(ch);
                continue;
            }
            if ch == '\\' {
                escape = true;
                out.push(ch);
                continue;
            }
            if ch == '"' {
                in_string = false;
                out.push(ch);
                continue;
            }
            if ch == '\n' {
                out.push('"');
                in_string = false;
                fired = true;
            }
            out.push(ch);
            continue;
        }
        if ch == '"' {
            in_string = true;
        }
        out.push(ch);
    }
    if in_string {
        out.push('"');
        fired = true;
    }
    if fired {
        ctx.log(LayerId::ContentCleaning, "closed string left open across a line break", Some(0));
    }
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ArrayFrame {
    Brace,
    Bracket,
    SyntheticWrap,
}

/// Wraps a maximal run of bare `"key": value` pairs that sit directly
/// inside an array, rather than inside their own object, in a synthetic
/// `{ }` pair, e.g. `["k1": "v1", "k2": "v2"]` -> `[{"k1": "v1", "k2":
/// "v2"}]`. A genuine array of values (`["a", "b"]`, `[{"k":1}]`) never
/// matches the key-colon lookahead and is left untouched.
fn split_truncated_key_in_array(input: &str, ctx: &mut RepairContext) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut stack: Vec<ArrayFrame> = Vec::new();
    let mut in_string = false;
    let mut quote = '\0';
    let mut escape = false;

    for (i, ch) in input.char_indices() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_string = false;
            }
            continue;
        }
        if is_double_quote_like(ch) || is_single_quote_like(ch) {
            in_string = true;
            quote = ch;
            out.push(ch);
            continue;
        }
        match ch {
            '{' => {
                stack.push(ArrayFrame::Brace);
                out.push(ch);
            }
            '[' => {
                stack.push(ArrayFrame::Bracket);
                out.push(ch);
                if bare_key_colon_len(&input[i + 1..]).is_some() {
                    out.push('{');
                    stack.push(ArrayFrame::SyntheticWrap);
                    ctx.log(LayerId::ContentCleaning, "wrapped bare key-value pairs found directly in an array", Some(i));
                }
            }
            ',' => {
                if stack.last() == Some(&ArrayFrame::SyntheticWrap)
                    && bare_key_colon_len(input[i + 1..].trim_start()).is_none()
                {
                    out.push('}');
                    stack.pop();
                }
                out.push(ch);
            }
            ']' => {
                if stack.last() == Some(&ArrayFrame::SyntheticWrap) {
                    out.push('}');
                    stack.pop();
                }
                if stack.last() == Some(&ArrayFrame::Bracket) {
                    stack.pop();
                }
                out.push(ch);
            }
            '}' => {
                if stack.last() == Some(&ArrayFrame::Brace) {
                    stack.pop();
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Length of leading whitespace plus a quoted or bareword key, when `s`
/// (after that whitespace) is immediately followed by `:`.
fn bare_key_colon_len(s: &str) -> Option<usize> {
    let trimmed = s.trim_start();
    let ws = s.len() - trimmed.len();
    let mut chars = trimmed.char_indices();
    let (_, first) = chars.next()?;
    let key_end = if is_double_quote_like(first) || is_single_quote_like(first) {
        let target = first;
        let mut end = None;
        let mut escape = false;
        for (i, c) in chars {
            if escape {
                escape = false;
                continue;
            }
            if c == '\\' {
                escape = true;
                continue;
            }
            if c == target {
                end = Some(i + c.len_utf8());
                break;
            }
        }
        end?
    } else if first.is_ascii_alphabetic() || first == '_' || first == '$' {
        let mut end = first.len_utf8();
        for (i, c) in chars {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                end = i + c.len_utf8();
            } else {
                break;
            }
        }
        end
    } else {
        return None;
    };
    let after_ws = trimmed[key_end..].trim_start();
    if after_ws.starts_with(':') {
        Some(ws + key_end)
    } else {
        None
    }
}

/// Rewrites a top-level object whose keys are exactly the sequential
/// indices `"0"`, `"1"`, ... `"n-1"` into a JSON array of its values,
/// undoing an object-shaped serialization of what was meant to be a list.
fn coerce_object_to_array(input: &str, ctx: &mut RepairContext) -> String {
    let trimmed = input.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return input.to_string();
    }
    let Some(pairs) = split_top_level_pairs(&trimmed[1..trimmed.len() - 1]) else {
        return input.to_string();
    };
    if pairs.is_empty() {
        return input.to_string();
    }
    let mut values = Vec::with_capacity(pairs.len());
    for (idx, (key, value)) in pairs.iter().enumerate() {
        let key_trim = key.trim().trim_matches(|c| is_double_quote_like(c) || is_single_quote_like(c));
        if key_trim != idx.to_string() {
            return input.to_string();
        }
        values.push(value.trim().to_string());
    }
    ctx.log(LayerId::ContentCleaning, "coerced sequential-index object into an array", Some(0));
    format!("[{}]", values.join(","))
}

/// Splits `body` (the content between an object's outer braces) into
/// `(key, value)` pairs on top-level commas and colons. Returns `None`
/// if any comma-separated segment has no top-level colon, i.e. doesn't
/// look like a well-formed key/value pair.
fn split_top_level_pairs(body: &str) -> Option<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for segment in split_top_level_commas(body) {
        let colon = find_top_level_colon(&segment)?;
        pairs.push((segment[..colon].to_string(), segment[colon + 1..].to_string()));
    }
    Some(pairs)
}

fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut quote = '\0';
    let mut escape = false;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_string = false;
            }
            continue;
        }
        match ch {
            _ if is_double_quote_like(ch) || is_single_quote_like(ch) => {
                in_string = true;
                quote = ch;
            }
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    if !parts.is_empty() || !s[start..].trim().is_empty() {
        parts.push(s[start..].to_string());
    }
    parts
}

fn find_top_level_colon(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut quote = '\0';
    let mut escape = false;
    for (i, ch) in s.char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_string = false;
            }
            continue;
        }
        match ch {
            _ if is_double_quote_like(ch) || is_single_quote_like(ch) => {
                in_string = true;
                quote = ch;
            }
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            ':' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Splits `text` into independent top-level JSON value candidates when
/// more than one complete balanced `{...}`/`[...]`/literal appears back
/// to back (optionally separated by whitespace or commas), e.g. NDJSON-
/// like concatenation `{"a":1}\n{"b":2}` or `{"a":1}, {"b":2}`.
fn split_top_level_values(text: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let Some(end) = next_value_extent(rest) else {
            break;
        };
        values.push(rest[..end].to_string());
        rest = rest[end..].trim_start();
        rest = rest.trim_start_matches(',').trim_start();
    }
    if values.len() <= 1 {
        vec![text.to_string()]
    } else {
        values
    }
}

/// Length, in bytes, of one JSON value at the start of `s`: for
/// containers, the balanced-delimiter extent; for everything else, up
/// to the next unquoted whitespace/comma run.
fn next_value_extent(s: &str) -> Option<usize> {
    let first = s.chars().next()?;
    if first == '{' || first == '[' {
        let mut depth = 0i32;
        let mut in_string = false;
        let mut quote = '\0';
        let mut escape = false;
        for (i, ch) in s.char_indices() {
            if in_string {
                if escape {
                    escape = false;
                } else if ch == '\\' {
                    escape = true;
                } else if ch == quote {
                    in_string = false;
                }
                continue;
            }
            match ch {
                '"' | '\'' => {
                    in_string = true;
                    quote = ch;
                }
                '{' | '[' => depth += 1,
                '}' | ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + ch.len_utf8());
                    }
                }
                _ => {}
            }
        }
        None
    } else {
        None
    }
}

/// Absorbs a `"key": value` (or further comma-joined pairs) tail that
/// follows a fully closed top-level object back into that object, as
/// happens when a parser emitted a close brace one key early.
fn merge_object_boundary(input: &str, ctx: &mut RepairContext) -> String {
    let trimmed_end = input.trim_end();
    let Some(obj_start) = trimmed_end.find('{') else {
        return input.to_string();
    };
    if trimmed_end[..obj_start].trim().chars().any(|c| !c.is_whitespace()) {
        return input.to_string();
    }
    let Some(close_rel) = next_value_extent(&trimmed_end[obj_start..]) else {
        return input.to_string();
    };
    let close_abs = obj_start + close_rel;
    let tail = trimmed_end[close_abs..].trim_start().trim_start_matches(',');
    let tail = tail.trim_start();
    if tail.is_empty() || !tail.starts_with(|c| is_double_quote_like(c) || is_single_quote_like(c)) {
        return input.to_string();
    }
    // The tail must itself look like one or more "key": value pairs with
    // no unbalanced container of its own, otherwise leave it alone for
    // L1/L2 to handle as wrapper prose instead.
    if tail.contains('{') || tail.contains('[') {
        return input.to_string();
    }
    // A stray closing brace left over from the original (premature)
    // object close may already trail the tail; strip it so we emit
    // exactly one closer ourselves.
    let tail = tail.strip_suffix('}').map(str::trim_end).unwrap_or(tail);
    let mut merged = trimmed_end[..close_abs - 1].to_string();
    merged.push(',');
    merged.push_str(tail);
    merged.push('}');
    ctx.log(LayerId::ContentCleaning, "merged dangling pair into preceding object", Some(obj_start));
    merged
}
