//! Component D — L2 structural repair (§4.2).
//!
//! A single forward scan that tracks a stack of open `{`/`[` frames and
//! a lightweight "are we inside a string literal" flag. It fixes
//! mismatched/missing closers and synthesizes closers at EOF; it does
//! not touch token-level syntax (quoting, commas, literals), that is
//! L3's job. By the time this layer is done the brace/bracket nesting
//! is balanced, so L3 can walk it with a simple recursive descent.

use crate::context::{DelimiterFrame, FrameKind, LayerId, RepairContext};
use crate::scanner::{is_double_quote_like, is_single_quote_like};

pub fn run(input: &str, ctx: &mut RepairContext) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut stack: Vec<DelimiterFrame> = Vec::new();
    let mut in_string = false;
    let mut quote = '\0';
    let mut escape = false;

    let mut chars = input.char_indices();
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

        match ch {
            _ if is_double_quote_like(ch) || is_single_quote_like(ch) => {
                in_string = true;
                quote = ch;
                out.push(ch);
            }
            '{' => {
                let rest = &input[i + ch.len_utf8()..];
                if prev_significant_is(&out, '{') && !has_sibling_separator(rest, '{', '}') {
                    ctx.log(LayerId::StructuralRepair, "dropped redundant opening brace", Some(i));
                } else {
                    stack.push(DelimiterFrame {
                        kind: FrameKind::Brace,
                        open_position: i,
                    });
                    out.push(ch);
                }
            }
            '[' => {
                let rest = &input[i + ch.len_utf8()..];
                if prev_significant_is(&out, '[') && !has_sibling_separator(rest, '[', ']') {
                    ctx.log(LayerId::StructuralRepair, "dropped redundant opening bracket", Some(i));
                } else {
                    stack.push(DelimiterFrame {
                        kind: FrameKind::Bracket,
                        open_position: i,
                    });
                    out.push(ch);
                }
            }
            '}' | ']' => {
                let want = if ch == '}' { FrameKind::Brace } else { FrameKind::Bracket };
                match stack.last().copied() {
                    Some(top) if top.kind == want => {
                        stack.pop();
                        out.push(ch);
                    }
                    Some(top) if ch == ']' && top.kind == FrameKind::Brace && out.trim_end().ends_with('{') => {
                        // An empty object directly precedes this array
                        // close: drop the empty `{}` and let `]` close the
                        // enclosing array instead of emitting a `}]` pair.
                        while matches!(out.chars().last(), Some(c) if c.is_whitespace()) {
                            out.pop();
                        }
                        out.pop(); // the '{'
                        stack.pop();
                        ctx.log(LayerId::StructuralRepair, "removed empty object before array close", Some(i));
                        match stack.last().copied() {
                            Some(parent) if parent.kind == FrameKind::Bracket => {
                                stack.pop();
                                out.push(']');
                            }
                            _ => {
                                ctx.log(LayerId::StructuralRepair, "dropped redundant closer", Some(i));
                            }
                        }
                    }
                    Some(top) if top.kind != want => {
                        // Mismatched closer: trust the open frame's kind,
                        // emit the closer it actually wants, drop the one
                        // the input gave us.
                        let correct = if top.kind == FrameKind::Brace { '}' } else { ']' };
                        ctx.log(LayerId::StructuralRepair, "corrected mismatched closer", Some(i));
                        stack.pop();
                        out.push(correct);
                    }
                    _ => {
                        // Closer with nothing open: drop it as redundant.
                        ctx.log(LayerId::StructuralRepair, "dropped redundant closer", Some(i));
                    }
                }
            }
            ',' => {
                // Comma look-ahead exit rule: a comma directly inside an
                // object that itself sits inside an array, immediately
                // followed by another container opener, means the object
                // never got its closing brace, e.g. `[{"a":1, {"b":2}]`.
                // No legitimate object key starts with `{` or `[`, so this
                // can only be a sibling array element that lost its
                // separator; close the dangling object first.
                if let Some(&top) = stack.last() {
                    let parent_is_array = stack.len() >= 2 && stack[stack.len() - 2].kind == FrameKind::Bracket;
                    if top.kind == FrameKind::Brace && parent_is_array {
                        let after = &input[i + ch.len_utf8()..];
                        if matches!(after.trim_start().chars().next(), Some('{') | Some('[')) {
                            ctx.log(LayerId::StructuralRepair, "inserted missing closing brace before comma", Some(i));
                            out.push('}');
                            stack.pop();
                        }
                    }
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    // EOF: synthesize closers for every still-open frame, innermost first.
    while let Some(frame) = stack.pop() {
        let c = if frame.kind == FrameKind::Brace { '}' } else { ']' };
        ctx.log(LayerId::StructuralRepair, "synthesized missing closer at end of input", Some(input.chars().count()));
        out.push(c);
    }

    out
}

/// True when the last non-whitespace character already written is `c`.
fn prev_significant_is(out: &str, c: char) -> bool {
    out.chars().rev().find(|ch| !ch.is_whitespace()) == Some(c)
}

/// Looks for a sibling-element separator (`close`, optional whitespace,
/// `,`, optional whitespace, `open`) before the candidate duplicate
/// opener's own matching close, e.g. the `}, {` inside `{{"a":1}, {"b":2}}`.
/// Its presence means the repeated opener starts a sibling element rather
/// than being a redundant duplicate wrapper around the same content.
fn has_sibling_separator(rest: &str, open: char, close: char) -> bool {
    let window_end = find_matching_close(rest, open, close).unwrap_or(rest.len());
    let window = &rest[..window_end];
    let mut chars = window.chars().peekable();
    while let Some(c) = chars.next() {
        if c != close {
            continue;
        }
        let mut lookahead = chars.clone();
        while matches!(lookahead.peek(), Some(w) if w.is_whitespace()) {
            lookahead.next();
        }
        if lookahead.peek() != Some(&',') {
            continue;
        }
        lookahead.next();
        while matches!(lookahead.peek(), Some(w) if w.is_whitespace()) {
            lookahead.next();
        }
        if lookahead.peek() == Some(&open) {
            return true;
        }
    }
    false
}

/// Byte offset, within `s`, of the close matching an opener already
/// consumed one level deep (depth starts at 1), honoring string literals.
fn find_matching_close(s: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 1i32;
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
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}
