//! Parsing of immediate operands.
//!
//! Immediates can be written in a number of forms:
//!
//! - Numeric literals: decimal, hexadecimal (`0x`), octal (`0o`) or binary
//!   (`0b`), optionally signed.
//! - Character literals such as `'A'`, with the escapes `\\`, `\t`, `\n`
//!   and `\0`.
//! - Label references: `$target` for an absolute address, `@target` for a
//!   PC-relative displacement. References are carried as strings until the
//!   assembler resolves them.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Bad(String),
    TooLarge(String),
    TooSmall(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Bad(text) => write!(f, "bad immediate: {}", text),
            Error::TooLarge(text) => write!(f, "immediate is too large: {}", text),
            Error::TooSmall(text) => write!(f, "immediate is too small: {}", text),
        }
    }
}

impl std::error::Error for Error {}

/// Parse an integer literal without range reduction.
pub fn parse_integer(text: &str) -> Result<i64, Error> {
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, skip) = match rest.as_bytes() {
        [b'0', b'x', _, ..] | [b'0', b'X', _, ..] => (16, 2),
        [b'0', b'o', _, ..] | [b'0', b'O', _, ..] => (8, 2),
        [b'0', b'b', _, ..] | [b'0', b'B', _, ..] => (2, 2),
        _ => (10, 0),
    };
    let digits = &rest[skip..];

    let magnitude = i64::from_str_radix(digits, radix)
        .map_err(|_| Error::Bad(text.to_owned()))?;

    Ok(if negative { -magnitude } else { magnitude })
}

/// Reduce a value into the signed 16-bit range. Unsigned values at or
/// above 2^15 are reinterpreted by subtracting 2^16; anything outside
/// `[-2^15, 2^16)` is rejected.
pub fn fold(value: i64, text: &str) -> Result<i16, Error> {
    let bias = 1i64 << 15;

    let mut value = value;
    if value >= 2 * bias {
        return Err(Error::TooLarge(text.to_owned()));
    }
    if value >= bias {
        value -= 2 * bias;
    }
    if value < -bias {
        return Err(Error::TooSmall(text.to_owned()));
    }

    Ok(value as i16)
}

/// Parse an integer literal as a signed 16-bit immediate.
///
/// # Examples
/// ```
/// use idli::imm::parse_int;
///
/// assert_eq!(parse_int("42"), Ok(42));
/// assert_eq!(parse_int("0xffff"), Ok(-1));
/// assert!(parse_int("0x10000").is_err());
/// ```
pub fn parse_int(text: &str) -> Result<i16, Error> {
    fold(parse_integer(text)?, text)
}

/// Parse a character literal, or `None` if the text is not one.
pub fn parse_char(text: &str) -> Option<i16> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;

    let value = match inner {
        "\\\\" => u32::from('\\'),
        "\\t" => u32::from('\t'),
        "\\n" => u32::from('\n'),
        "\\0" => 0,
        _ => {
            let mut chars = inner.chars();
            let ch = chars.next()?;
            if chars.next().is_some() || ch == '\\' || ch == '\'' {
                return None;
            }
            u32::from(ch)
        }
    };

    fold(i64::from(value), text).ok()
}
