//! Component C — L1 content cleaner (§4.1).
//!
//! Strips Markdown code fences and `//`, `/* */`, `#` comments that sit
//! outside string literals, then trims non-JSON wrapper prose down to
//! the balanced JSON extent it surrounds. Never touches characters
//! inside a string literal that the input itself opened.

use crate::context::{LayerId, RepairContext};
use crate::scanner::{is_double_quote_like, is_single_quote_like, Scanner};

pub enum L1Outcome {
    /// Text was cleaned (or was already clean); continue to L2.
    Ok(String),
    /// The plain-text gate fired: nothing JSON-like was found.
    Continue(String),
}

pub fn run(input: &str, tolerate_hash_comments: bool, ctx: &mut RepairContext) -> L1Outcome {
    let fence_stripped = strip_single_fence(input, ctx);
    let decommented = strip_comments(&fence_stripped, tolerate_hash_comments, ctx);
    let trimmed = trim_wrapper_prose(&decommented, ctx);

    if is_plain_text(&trimmed) {
        if !trimmed.is_empty() {
            ctx.log(LayerId::ContentCleaning, "discarded non-JSON plain text", Some(0));
        }
        L1Outcome::Continue(String::new())
    } else {
        L1Outcome::Ok(trimmed)
    }
}

/// Recognize a single ```` ```[lang]\n ... \n``` ```` wrapper around the
/// *entire* input and return its inner body. A fence that opens inside a
/// string literal (e.g. the input is itself a JSON string containing a
/// literal fence) is left alone.
fn strip_single_fence(input: &str, ctx: &mut RepairContext) -> String {
    let Some(start) = find_unquoted(input, "```") else {
        return input.to_string();
    };
    let after_ticks = start + 3;
    let lang_skip = Scanner::fence_open_lang_newline_len(&input[after_ticks..]);
    let body_start = after_ticks + lang_skip;
    let Some(end_rel) = input[body_start..].find("```") else {
        return input.to_string();
    };
    let body_end = body_start + end_rel;
    // Only treat this as a wrapping fence if nothing but whitespace
    // surrounds it on the outside.
    if input[..start].trim().is_empty() && input[body_end + 3..].trim().is_empty() {
        ctx.log(LayerId::ContentCleaning, "stripped code fence", Some(start));
        input[body_start..body_end].to_string()
    } else {
        input.to_string()
    }
}

/// Find the byte offset of `needle` when it occurs outside any string
/// literal (honoring backslash escapes and single/double/smart quotes).
fn find_unquoted(s: &str, needle: &str) -> Option<usize> {
    let mut in_string = false;
    let mut quote = '\0';
    let mut escape = false;
    let mut it = s.char_indices().peekable();
    while let Some((i, ch)) = it.next() {
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
        if s[i..].starts_with(needle) {
            return Some(i);
        }
    }
    None
}

/// Strip `//...`, `/*...*/`, and (optionally) `#...` comments that occur
/// outside string literals.
fn strip_comments(input: &str, tolerate_hash_comments: bool, ctx: &mut RepairContext) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut quote = '\0';
    let mut escape = false;
    let bytes = input.as_bytes();
    let mut i = 0usize;
    while i < input.len() {
        let ch = input[i..].chars().next().unwrap();
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                in_string = false;
            }
            i += ch.len_utf8();
            continue;
        }
        if is_double_quote_like(ch) || is_single_quote_like(ch) {
            in_string = true;
            quote = ch;
            out.push(ch);
            i += ch.len_utf8();
            continue;
        }
        if bytes[i..].starts_with(b"//") {
            ctx.log(LayerId::ContentCleaning, "stripped line comment", Some(out.chars().count()));
            i += 2;
            while i < input.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
                i += 1;
            }
            continue;
        }
        if bytes[i..].starts_with(b"/*") {
            ctx.log(LayerId::ContentCleaning, "stripped block comment", Some(out.chars().count()));
            i += 2;
            while i < input.len() && !bytes[i..].starts_with(b"*/") {
                i += 1;
            }
            i = (i + 2).min(input.len());
            continue;
        }
        if tolerate_hash_comments && ch == '#' {
            ctx.log(LayerId::ContentCleaning, "stripped hash comment", Some(out.chars().count()));
            i += 1;
            while i < input.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
                i += 1;
            }
            continue;
        }
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// If the text contains a recognizable JSON prefix preceded by non-JSON
/// prose, and the JSON extent can be bounded by a balanced-delimiter
/// scan, return only that extent.
fn trim_wrapper_prose(input: &str, ctx: &mut RepairContext) -> String {
    let trimmed_start = input.trim_start();
    let leading_ws = input.len() - trimmed_start.len();
    if trimmed_start.is_empty() {
        return String::new();
    }
    let first = trimmed_start.chars().next().unwrap();
    if matches!(first, '{' | '[' | '"') || first.is_ascii_digit() || first == '-' {
        // Already starts with a JSON value; nothing to trim on the left.
        // Still look for trailing prose after a balanced extent when the
        // value is a container.
        if first == '{' || first == '[' {
            if let Some(end) = balanced_extent(trimmed_start) {
                if trimmed_start[end..].trim().chars().any(|c| !c.is_whitespace()) {
                    ctx.log(LayerId::ContentCleaning, "trimmed trailing wrapper prose", Some(leading_ws));
                    return trimmed_start[..end].to_string();
                }
            }
        }
        return input.to_string();
    }
    // Look for the first safe-boundary '{' or '['.
    let mut last_boundary_ok = true;
    for (i, ch) in trimmed_start.char_indices() {
        if (ch == '{' || ch == '[') && last_boundary_ok {
            let rest = &trimmed_start[i..];
            let end = balanced_extent(rest).unwrap_or(rest.len());
            ctx.log(LayerId::ContentCleaning, "trimmed leading wrapper prose", Some(leading_ws));
            return rest[..end].to_string();
        }
        last_boundary_ok = matches!(ch, ' ' | '\t' | '\n' | '\r' | '(' | ':' | ',' | '=');
    }
    input.to_string()
}

/// Scan from the start of `s` (which must begin with `{` or `[`) for the
/// matching close, honoring string literals. Returns the byte length of
/// the balanced extent, or `None` if it never closes.
fn balanced_extent(s: &str) -> Option<usize> {
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
}

/// The plain-text gate: no structural or string characters, and not a
/// bare literal/number.
fn is_plain_text(s: &str) -> bool {
    let t = s.trim();
    if t.is_empty() {
        return true;
    }
    if t.chars().any(|c| matches!(c, '{' | '}' | '[' | ']' | '"' | ':')) {
        return false;
    }
    if t == "true" || t == "false" || t == "null" {
        return false;
    }
    if t.parse::<f64>().is_ok() {
        return false;
    }
    true
}
