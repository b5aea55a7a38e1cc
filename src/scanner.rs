//! Component A — UTF-8 safe character access, whitespace/comment
//! skipping, and bounded lookahead shared by every layer.
//!
//! A single forward byte scan that tracks a running char offset
//! alongside the byte offset, so callers get cheap slicing and
//! correctly reported character positions without re-indexing a
//! `Vec<char>` on every lookup.

use memchr::{memchr, memchr2};

/// Include U+FEFF (BOM) as whitespace-equivalent so callers can skip it
/// without a special case.
#[inline]
pub fn is_whitespace(c: char) -> bool {
    matches!(c, '\u{0009}' | '\u{000A}' | '\u{000D}' | '\u{0020}' | '\u{FEFF}')
}

#[inline]
pub fn is_double_quote_like(c: char) -> bool {
    c == '"' || c == '\u{201C}' || c == '\u{201D}'
}

#[inline]
pub fn is_single_quote_like(c: char) -> bool {
    matches!(c, '\u{27}' | '\u{2018}' | '\u{2019}' | '\u{60}' | '\u{B4}')
}

/// A forward-only cursor over `&str` that reports both a byte offset
/// (for slicing) and a char offset (for public `RepairAction::position`
/// values, which are character offsets per §3).
pub struct Scanner<'a> {
    input: &'a str,
    byte_pos: usize,
    char_pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            byte_pos: 0,
            char_pos: 0,
        }
    }

    #[inline]
    pub fn byte_pos(&self) -> usize {
        self.byte_pos
    }

    #[inline]
    pub fn char_pos(&self) -> usize {
        self.char_pos
    }

    #[inline]
    pub fn remaining(&self) -> &'a str {
        &self.input[self.byte_pos..]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.byte_pos >= self.input.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    #[inline]
    pub fn peek2(&self) -> Option<char> {
        let mut it = self.remaining().chars();
        it.next();
        it.next()
    }

    pub fn starts_with(&self, pat: &str) -> bool {
        self.remaining().starts_with(pat)
    }

    /// Advance by one char, keeping both offsets in sync.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.byte_pos += c.len_utf8();
        self.char_pos += 1;
        Some(c)
    }

    /// Advance by exactly `n` bytes of the given ASCII/known-width token.
    pub fn advance_bytes(&mut self, bytes: usize) {
        let chunk = &self.input[self.byte_pos..self.byte_pos + bytes];
        self.char_pos += chunk.chars().count();
        self.byte_pos += bytes;
    }

    pub fn skip_bom(&mut self) {
        if self.remaining().starts_with('\u{FEFF}') {
            self.bump();
        }
    }

    /// Fast ASCII whitespace + `//`, `/* */`, and (optionally) `#` line
    /// comment skipper.
    pub fn skip_ws_and_comments(&mut self, tolerate_hash_comments: bool) {
        loop {
            let before = self.byte_pos;
            while let Some(c) = self.peek() {
                if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
                    self.bump();
                } else {
                    break;
                }
            }
            if self.is_empty() {
                break;
            }
            let s = self.remaining();
            if s.as_bytes().starts_with(b"//") {
                self.skip_line_comment(2);
                continue;
            }
            if s.as_bytes().starts_with(b"/*") {
                self.skip_block_comment();
                continue;
            }
            if tolerate_hash_comments && s.as_bytes().first() == Some(&b'#') {
                self.skip_line_comment(1);
                continue;
            }
            if before == self.byte_pos {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self, marker_len: usize) {
        self.advance_bytes(marker_len);
        let rest = self.remaining();
        match memchr2(b'\n', b'\r', rest.as_bytes()) {
            Some(pos) => self.advance_bytes(pos + 1),
            None => self.advance_bytes(rest.len()),
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance_bytes(2);
        let rest = self.remaining();
        let bytes = rest.as_bytes();
        let mut off = 0usize;
        while let Some(p) = memchr(b'*', &bytes[off..]) {
            let idx = off + p;
            if idx + 1 < bytes.len() && bytes[idx + 1] == b'/' {
                self.advance_bytes(idx + 2);
                return;
            }
            off = idx + 1;
        }
        self.advance_bytes(rest.len());
    }

    pub fn starts_with_ident(&self) -> bool {
        matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
    }

    /// Consume a `[A-Za-z_$][A-Za-z0-9_$]*` identifier, returning it.
    pub fn take_ident(&mut self) -> &'a str {
        let s = self.remaining();
        let mut end = 0usize;
        for (i, ch) in s.char_indices() {
            if i == 0 {
                if !(ch.is_ascii_alphabetic() || ch == '_' || ch == '$') {
                    break;
                }
            } else if !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '$') {
                break;
            }
            end = i + ch.len_utf8();
        }
        let tok = &s[..end];
        self.advance_bytes(end);
        tok
    }

    /// Consume a run of non-delimiter characters: whitespace and the
    /// structural set `, [ ] { } ( ) : ' "` terminate the token. A `/`
    /// only terminates when it opens a comment.
    pub fn take_symbol_until_delim(&mut self) -> &'a str {
        let tok = self.peek_symbol_until_delim();
        self.advance_bytes(tok.len());
        tok
    }

    /// Non-consuming lookahead equivalent of [`Self::take_symbol_until_delim`].
    pub fn peek_symbol_until_delim(&self) -> &'a str {
        let s = self.remaining();
        if s.is_empty() {
            return s;
        }
        let b = s.as_bytes();
        let mut i = 0usize;
        while i < b.len() {
            match b[i] {
                b' ' | b'\t' | b'\n' | b'\r' | b',' | b'[' | b']' | b'{' | b'}' | b'(' | b')'
                | b':' | b'"' | b'\'' => break,
                b'/' => {
                    if i + 1 < b.len() && (b[i + 1] == b'/' || b[i + 1] == b'*') {
                        break;
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }
        &s[..i]
    }

    /// Bytes to skip after an opening fence marker's three backticks:
    /// extra backticks, an optional language tag, optional spaces/tabs,
    /// and an optional trailing newline.
    pub fn fence_open_lang_newline_len(s: &str) -> usize {
        let bytes = s.as_bytes();
        let mut i = 0usize;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
        while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
            i += 1;
        }
        if i < bytes.len() && (bytes[i] == b'\n' || bytes[i] == b'\r') {
            i += 1;
        }
        i
    }
}
