//! The JSON number grammar and checked numeric conversion.
//!
//! Parsing only validates; a number's literal is kept verbatim in the tree.
//! Conversion to a Rust number happens on demand, through the accessors on
//! [`Value`](crate::Value) or through binding, and is always overflow checked.

use std::num::IntErrorKind;

use crate::{Error, Result};

pub(crate) const INVALID: &str = "invalid character for JSON number";
pub(crate) const UNTERMINATED: &str = "unterminated number";

#[inline]
fn digits(input: &[u8]) -> usize {
    input.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Walks one number at the start of `input`.
///
/// Returns the length of the literal, or the offset of the offending byte
/// and a reason. A literal that ends right after `-`, `.`, `e` or a sign is
/// reported at that byte.
pub(crate) fn scan(input: &[u8]) -> std::result::Result<usize, (usize, &'static str)> {
    let len = input.len();
    let mut pos = 0;

    if input.first() == Some(&b'-') {
        pos += 1;
        if pos >= len {
            return Err((pos - 1, UNTERMINATED));
        }
    }

    match input.get(pos) {
        Some(b'0') => {
            pos += 1;
            // a leading zero stands alone
            if matches!(input.get(pos), Some(b'0'..=b'9')) {
                return Err((pos, INVALID));
            }
        }
        Some(b'1'..=b'9') => {
            pos += 1;
            pos += digits(&input[pos..]);
        }
        _ => return Err((pos, INVALID)),
    }

    if input.get(pos) == Some(&b'.') {
        pos += 1;
        if pos >= len {
            return Err((pos - 1, UNTERMINATED));
        }
        if !input[pos].is_ascii_digit() {
            return Err((pos, INVALID));
        }
        pos += 1;
        pos += digits(&input[pos..]);
    }

    if matches!(input.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if pos >= len {
            return Err((pos - 1, UNTERMINATED));
        }
        if matches!(input[pos], b'+' | b'-') {
            pos += 1;
            if pos >= len {
                return Err((pos - 1, UNTERMINATED));
            }
        }
        if !input[pos].is_ascii_digit() {
            return Err((pos, INVALID));
        }
        pos += 1;
        pos += digits(&input[pos..]);
    }

    Ok(pos)
}

/// Returns the literal as text if the whole of it is one JSON number.
#[inline]
fn literal<'r>(raw: &'r [u8], target: &'static str) -> Result<&'r str> {
    match scan(raw) {
        Ok(n) if n == raw.len() => {
            // SAFETY: the grammar only admits ASCII.
            Ok(unsafe { std::str::from_utf8_unchecked(raw) })
        }
        _ => Err(Error::invalid_number(raw, target)),
    }
}

#[inline]
fn is_integral(text: &str) -> bool {
    !text.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'))
}

mod private {
    pub trait Sealed {}
}

/// Numeric types a number literal can be converted into.
pub trait FromLiteral: Sized + private::Sealed {
    const NAME: &'static str;

    fn from_literal(raw: &[u8]) -> Result<Self>;
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {$(
        impl private::Sealed for $ty {}

        impl FromLiteral for $ty {
            const NAME: &'static str = stringify!($ty);

            fn from_literal(raw: &[u8]) -> Result<Self> {
                let text = literal(raw, Self::NAME)?;
                if !is_integral(text) {
                    return Err(Error::invalid_number(raw, Self::NAME));
                }
                let wide = match text.parse::<i128>() {
                    Ok(wide) => wide,
                    Err(e) => {
                        return Err(match e.kind() {
                            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                                Error::overflow(raw, Self::NAME)
                            }
                            _ => Error::invalid_number(raw, Self::NAME),
                        });
                    }
                };
                <$ty>::try_from(wide).map_err(|_| Error::overflow(raw, Self::NAME))
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {$(
        impl private::Sealed for $ty {}

        impl FromLiteral for $ty {
            const NAME: &'static str = stringify!($ty);

            fn from_literal(raw: &[u8]) -> Result<Self> {
                let text = literal(raw, Self::NAME)?;
                if !is_integral(text) {
                    return Err(Error::invalid_number(raw, Self::NAME));
                }
                // "-0" is zero; any other negative is out of range
                if let Some(magnitude) = text.strip_prefix('-') {
                    return if magnitude.bytes().all(|b| b == b'0') {
                        Ok(0)
                    } else {
                        Err(Error::overflow(raw, Self::NAME))
                    };
                }
                let wide = match text.parse::<u128>() {
                    Ok(wide) => wide,
                    Err(e) => {
                        return Err(match e.kind() {
                            IntErrorKind::PosOverflow => Error::overflow(raw, Self::NAME),
                            _ => Error::invalid_number(raw, Self::NAME),
                        });
                    }
                };
                <$ty>::try_from(wide).map_err(|_| Error::overflow(raw, Self::NAME))
            }
        }
    )*};
}

macro_rules! impl_float {
    ($($ty:ty),*) => {$(
        impl private::Sealed for $ty {}

        impl FromLiteral for $ty {
            const NAME: &'static str = stringify!($ty);

            fn from_literal(raw: &[u8]) -> Result<Self> {
                let text = literal(raw, Self::NAME)?;
                let parsed = text
                    .parse::<$ty>()
                    .map_err(|_| Error::invalid_number(raw, Self::NAME))?;
                if parsed.is_infinite() {
                    return Err(Error::overflow(raw, Self::NAME));
                }
                Ok(parsed)
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, i128, isize);
impl_unsigned!(u8, u16, u32, u64, u128, usize);
impl_float!(f32, f64);

/// Converts a number literal, reporting range and syntax failures apart.
///
/// # Example
///
/// ```
/// use na_json::{Error, parse_number};
///
/// assert_eq!(parse_number::<i32>(b"-17").unwrap(), -17);
/// assert!(matches!(
///     parse_number::<i32>(b"99999999999999999999"),
///     Err(Error::Overflow(_))
/// ));
/// assert!(matches!(
///     parse_number::<u8>(b"1.5"),
///     Err(Error::InvalidNumber { .. })
/// ));
/// ```
#[inline]
pub fn parse_number<T: FromLiteral>(raw: &[u8]) -> Result<T> {
    T::from_literal(raw)
}
