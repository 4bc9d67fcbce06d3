//! Low-level tokenizer shared by [`Locator`](super::Locator) parsing and rendering.
//!
//! A locator is a comma separated list of `name:value` pairs. Values holding
//! `,`, `(` or `)` are wrapped in one pair of parentheses; values that cannot
//! be wrapped because their parentheses do not balance are escaped as
//! `$base64:<url-safe base64>`.

use crate::error::{LocatorError, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::borrow::Cow;

pub const BASE64_PREFIX: &str = "$base64:";

const RESERVED: [char; 3] = [',', '(', ')'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub offset: usize,
    pub text: &'a str,
}

/// Splits `text` at commas that are not nested inside parentheses.
pub fn split_top_level(text: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut seg_start = 0;
    for (pos, ch) in text.char_indices() {
        match ch {
            '(' => open.push(pos),
            ')' => {
                if open.pop().is_none() {
                    return Err(LocatorError::malformed(
                        format!("unbalanced ')' at position {pos}"),
                        fragment_from(text, pos),
                    ));
                }
            }
            ',' if open.is_empty() => {
                segments.push(Segment {
                    offset: seg_start,
                    text: &text[seg_start..pos],
                });
                seg_start = pos + 1;
            }
            _ => {}
        }
    }
    if let Some(&pos) = open.first() {
        return Err(LocatorError::malformed(
            format!("unclosed '(' at position {pos}"),
            fragment_from(text, pos),
        ));
    }
    segments.push(Segment {
        offset: seg_start,
        text: &text[seg_start..],
    });
    Ok(segments)
}

/// Byte position of the first `ch` outside any parentheses.
pub fn find_top_level(text: &str, needle: char) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == needle && depth == 0 => return Some(pos),
            _ => {}
        }
    }
    None
}

/// Splits one `name:value` segment. The value is returned raw (still wrapped).
pub fn split_dimension<'a>(segment: &Segment<'a>) -> Result<(&'a str, &'a str)> {
    if segment.text.is_empty() {
        return Err(LocatorError::malformed(
            format!("empty dimension at position {}", segment.offset),
            segment.text,
        ));
    }
    let Some(colon) = find_top_level(segment.text, ':') else {
        return Err(LocatorError::malformed(
            "dimension has no ':' separator",
            segment.text,
        ));
    };
    let name = &segment.text[..colon];
    if name.is_empty() {
        return Err(LocatorError::malformed("empty dimension name", segment.text));
    }
    if !is_valid_name(name) {
        return Err(LocatorError::malformed(
            format!("invalid dimension name '{name}'"),
            segment.text,
        ));
    }
    Ok((name, &segment.text[colon + 1..]))
}

pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}

/// Turns a raw value into its logical text: strips one wrapping paren group
/// and decodes the `$base64:` escape.
pub fn unwrap_value(raw: &str) -> Result<Cow<'_, str>> {
    let inner = if raw.starts_with('(') && matching_close(raw, 0) == Some(raw.len() - 1) {
        &raw[1..raw.len() - 1]
    } else if raw.contains(['(', ')']) {
        return Err(LocatorError::malformed(
            "value contains '(' or ')' outside a single wrapping group",
            raw,
        ));
    } else {
        raw
    };
    match inner.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => decode_base64(encoded).map(Cow::Owned),
        None => Ok(Cow::Borrowed(inner)),
    }
}

/// Renders a dimension value so that [`unwrap_value`] restores it exactly.
pub fn render_value(value: &str) -> Cow<'_, str> {
    if value.starts_with(BASE64_PREFIX) || !is_balanced(value) {
        return Cow::Owned(encode_base64(value));
    }
    if value.contains(RESERVED) {
        return Cow::Owned(format!("({value})"));
    }
    Cow::Borrowed(value)
}

/// Like [`render_value`] but also protects `:` (including the one in the
/// `$base64:` prefix), which would otherwise turn a bare value into a dimension.
pub fn render_single_value(value: &str) -> Cow<'_, str> {
    let rendered = render_value(value);
    if !rendered.starts_with('(') && (rendered.contains(':') || rendered.is_empty()) {
        return Cow::Owned(format!("({rendered})"));
    }
    rendered
}

pub fn is_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

fn matching_close(text: &str, open_pos: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, ch) in text[open_pos..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open_pos + pos);
                }
            }
            _ => {}
        }
    }
    None
}

fn encode_base64(value: &str) -> String {
    format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(value.as_bytes()))
}

fn decode_base64(encoded: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.as_bytes())
        .map_err(|err| LocatorError::malformed(format!("invalid base64 value: {err}"), encoded))?;
    String::from_utf8(bytes)
        .map_err(|_| LocatorError::malformed("base64 value is not valid UTF-8", encoded))
}

fn fragment_from(text: &str, pos: usize) -> String {
    let tail = &text[pos..];
    match tail.char_indices().nth(32) {
        Some((end, _)) => tail[..end].to_string(),
        None => tail.to_string(),
    }
}
