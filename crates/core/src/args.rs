//! Argument decoder for the `name=v1,v2` mini-language embedded in command tokens.
//!
//! Values are C-style integer literals: decimal, `0x`-prefixed hex, or
//! `0`-prefixed octal. The first value of a token is introduced by `=`,
//! every following value by `,`. Missing values fall back to a per-slot
//! default; present values must lie within the slot's bounds and are never
//! clamped.

use crate::error::{Error, Result};

/// Parse the longest integer literal at the start of `text`, `strtol(.., 0)` style.
///
/// Returns the value and the number of bytes consumed. Zero bytes consumed
/// means no digits were found; the value is then meaningless.
fn parse_c_integer(text: &str) -> (i64, usize) {
    let bytes = text.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let hex_prefix = bytes.get(pos) == Some(&b'0')
        && matches!(bytes.get(pos + 1), Some(b'x') | Some(b'X'))
        && bytes.get(pos + 2).is_some_and(|b| b.is_ascii_hexdigit());

    let (radix, digits_start) = if hex_prefix {
        (16, pos + 2)
    } else if bytes.get(pos) == Some(&b'0') {
        (8, pos)
    } else {
        (10, pos)
    };

    let mut end = digits_start;
    let mut value: i64 = 0;
    while let Some(digit) = bytes
        .get(end)
        .and_then(|&b| (b as char).to_digit(radix))
    {
        value = value.saturating_mul(radix as i64).saturating_add(digit as i64);
        end += 1;
    }

    if end == digits_start {
        return (0, 0);
    }

    (if negative { -value } else { value }, end)
}

/// Decode one value introduced by `prefix`.
///
/// Empty `text` yields `default` and leaves the text untouched. Otherwise
/// the text must start with `prefix`; a literal directly after it replaces
/// the default, and an absent literal keeps it. Returns the value and the
/// unconsumed remainder.
pub fn parse_one(text: &str, prefix: char, default: u8, min: u8, max: u8) -> Result<(u8, &str)> {
    if text.is_empty() {
        return Ok((default, text));
    }

    let rest = text
        .strip_prefix(prefix)
        .ok_or_else(|| Error::MalformedArgument {
            token: text.to_string(),
            reason: format!("`{prefix}' expected"),
        })?;

    let (value, consumed) = parse_c_integer(rest);
    if consumed == 0 {
        return Ok((default, rest));
    }

    if value < min as i64 || value > max as i64 {
        return Err(Error::ArgumentOutOfRange {
            text: rest[..consumed].to_string(),
            min: min as u32,
            max: max as u32,
        });
    }

    Ok((value as u8, &rest[consumed..]))
}

/// Decode `[=v1[,v2]]`. The second value defaults to the first.
pub fn parse_pair(text: &str, default: u8, min: u8, max: u8) -> Result<(u8, u8)> {
    let (first, rest) = parse_one(text, '=', default, min, max)?;
    let (second, rest) = parse_one(rest, ',', first, min, max)?;
    ensure_consumed(text, rest)?;
    Ok((first, second))
}

/// Decode `[=v1[,v2[,...]]]` into exactly `count` values.
///
/// Also returns how many values were explicitly present in the text.
pub fn parse_n(text: &str, count: usize, default: u8, min: u8, max: u8) -> Result<(Vec<u8>, usize)> {
    let mut values = Vec::with_capacity(count);
    let mut supplied = 0;
    let mut rest = text;
    let mut prefix = '=';

    for _ in 0..count {
        if !rest.is_empty() {
            supplied += 1;
        }
        let (value, remaining) = parse_one(rest, prefix, default, min, max)?;
        values.push(value);
        rest = remaining;
        prefix = ',';
    }

    ensure_consumed(text, rest)?;
    Ok((values, supplied))
}

fn ensure_consumed(token: &str, rest: &str) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(Error::MalformedArgument {
            token: token.to_string(),
            reason: format!("unexpected `{rest}'"),
        })
    }
}
