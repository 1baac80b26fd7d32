//! Recursive-descent parsing into a [`Value`] tree.
//!
//! The parser borrows the input mutably for `'a`. Strings are unescaped in
//! place by compacting the bytes between the quotes over themselves, so every
//! string and number in the resulting tree is a span of the input buffer.

use std::{borrow::Cow, mem};

use crate::{
    Error, Kind, LeftoverError, ParseError, ParseOptions, Pools, Result, Value, cold_path,
    is_whitespace, number,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Expect {
    Key,
    Colon,
    Value,
    Comma,
}

macro_rules! expecting {
    ($prefix:literal, $expect:expr) => {
        match $expect {
            Expect::Key => concat!($prefix, "key"),
            Expect::Colon => concat!($prefix, "colon"),
            Expect::Value => concat!($prefix, "value"),
            Expect::Comma => concat!($prefix, "comma"),
        }
    };
}

/// A reusable parser configuration.
///
/// # Example
///
/// ```
/// use na_json::{ParseOptions, Parser, Pools};
///
/// let pools = Pools::default();
/// let parser = Parser::with_pools(&pools).options(ParseOptions::new().max_depth(2));
///
/// assert!(parser.parse(&mut b"[[1]]".to_vec()).is_ok());
/// assert!(parser.parse(&mut b"[[[1]]]".to_vec()).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Parser<'p> {
    pools: &'p Pools,
    options: ParseOptions,
}

impl Default for Parser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser<'static> {
    /// A parser drawing from the global pools.
    pub fn new() -> Self {
        Self::with_pools(Pools::global())
    }
}

impl<'p> Parser<'p> {
    pub fn with_pools(pools: &'p Pools) -> Self {
        Self {
            pools,
            options: ParseOptions::default(),
        }
    }

    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn pools(&self) -> &'p Pools {
        self.pools
    }

    /// Parses exactly one JSON value from `input`.
    ///
    /// `input` is rewritten while strings are unescaped and must not be
    /// treated as JSON afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if `input` is empty
    /// - [`Error::Parse`] on malformed input
    /// - [`Error::Leftover`] if anything but whitespace follows the value
    pub fn parse<'a>(&self, input: &'a mut [u8]) -> Result<Value<'a>> {
        let mut value = Value::default();
        self.parse_into(&mut value, input)?;
        Ok(value)
    }

    /// Parses into `dest`, recycling whatever it held before.
    ///
    /// On error `dest` is left recycled and reset.
    pub fn parse_into<'a>(&self, dest: &mut Value<'a>, input: &'a mut [u8]) -> Result<()> {
        dest.recycle_into(self.pools);
        dest.reset();

        let Some(&last) = input.last() else {
            cold_path();
            return Err(Error::EmptyInput);
        };

        let mut state = State {
            len: input.len(),
            rest: input,
            pos: 0,
            last,
            pools: self.pools,
            depth: 0,
            max_depth: self.options.max_depth,
        };

        let result = state.value(dest, true).and_then(|()| state.finish());
        if result.is_err() {
            dest.recycle_into(self.pools);
            dest.reset();
        }
        result
    }
}

struct State<'a, 'p> {
    /// Unconsumed input, starting at absolute offset `pos`.
    rest: &'a mut [u8],
    pos: usize,
    len: usize,
    last: u8,
    pools: &'p Pools,
    depth: usize,
    max_depth: usize,
}

impl<'a> State<'a, '_> {
    #[cold]
    fn error(&self, kind: Kind, pos: usize, byte: u8, reason: &'static str) -> Error {
        Error::Parse(ParseError {
            kind,
            pos,
            byte,
            reason,
        })
    }

    /// Reports a failure that ran into the end of the input.
    #[cold]
    fn error_at_end(&self, kind: Kind, reason: &'static str) -> Error {
        self.error(kind, self.len - 1, self.last, reason)
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.rest.first().copied()
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        let rest = mem::take(&mut self.rest);
        self.rest = &mut rest[n..];
        self.pos += n;
    }

    #[inline]
    fn take(&mut self, n: usize) -> &'a mut [u8] {
        let (head, tail) = mem::take(&mut self.rest).split_at_mut(n);
        self.rest = tail;
        self.pos += n;
        head
    }

    #[inline]
    fn skip_whitespace(&mut self) {
        let n = self.rest.iter().take_while(|&&b| is_whitespace(b)).count();
        self.advance(n);
    }

    fn enter(&mut self, kind: Kind, byte: u8) -> Result<()> {
        if self.depth >= self.max_depth {
            cold_path();
            return Err(self.error(kind, self.pos, byte, "maximum nesting depth exceeded"));
        }
        self.depth += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return Ok(());
        }
        cold_path();
        Err(Error::Leftover(LeftoverError(self.rest.to_vec())))
    }

    /// Parses any value into `dest`, optionally skipping leading whitespace
    /// first. Containers skip whitespace themselves before calling this.
    fn value(&mut self, dest: &mut Value<'a>, space: bool) -> Result<()> {
        if space {
            self.skip_whitespace();
        }
        let Some(b) = self.peek() else {
            cold_path();
            return Err(self.error_at_end(Kind::Invalid, "no JSON value found"));
        };

        if b.is_ascii_digit() || b == b'-' {
            return self.number(dest);
        }

        if self.rest.len() < 2 {
            cold_path();
            return Err(self.error(
                Kind::Invalid,
                self.pos,
                b,
                "not enough bytes to parse another value (need 2)",
            ));
        }

        match b {
            b'[' => self.array(dest),
            b'{' => self.object(dest),
            b'"' => {
                dest.kind = Kind::String;
                dest.raw = Cow::Borrowed(self.string()?);
                Ok(())
            }
            b't' | b'n' => {
                if self.rest.len() < 4 {
                    return Err(self.error(
                        Kind::Invalid,
                        self.pos,
                        b,
                        "not enough characters for null/true",
                    ));
                }
                dest.kind = match &self.rest[..4] {
                    b"true" => Kind::True,
                    b"null" => Kind::Null,
                    _ => {
                        return Err(self.error(
                            Kind::Invalid,
                            self.pos,
                            b,
                            "expected one of 'true', 'null'",
                        ));
                    }
                };
                self.advance(4);
                Ok(())
            }
            b'f' => {
                if self.rest.len() < 5 {
                    return Err(self.error(
                        Kind::Invalid,
                        self.pos,
                        b,
                        "not enough characters for false",
                    ));
                }
                if &self.rest[..5] != b"false" {
                    return Err(self.error(Kind::Invalid, self.pos, b, "expected 'false'"));
                }
                dest.kind = Kind::False;
                self.advance(5);
                Ok(())
            }
            _ => Err(self.error(Kind::Invalid, self.pos, b, "unhandleable token")),
        }
    }

    fn number(&mut self, dest: &mut Value<'a>) -> Result<()> {
        match number::scan(self.rest) {
            Ok(n) => {
                let literal: &'a [u8] = self.take(n);
                dest.kind = Kind::Number;
                dest.raw = Cow::Borrowed(literal);
                Ok(())
            }
            Err((offset, reason)) => {
                cold_path();
                let byte = self.rest.get(offset).copied().unwrap_or(self.last);
                Err(self.error(Kind::Number, self.pos + offset, byte, reason))
            }
        }
    }

    /// Decodes the string starting at the current quote and returns its
    /// content.
    fn string(&mut self) -> Result<&'a [u8]> {
        if self.rest.get(1) == Some(&b'"') {
            self.advance(2);
            return Ok(&[]);
        }
        match unescape(self.rest) {
            Ok((consumed, decoded)) => {
                let span: &'a [u8] = self.take(consumed);
                Ok(&span[1..1 + decoded])
            }
            Err((offset, reason)) => {
                cold_path();
                let byte = self.rest.get(offset).copied().unwrap_or(self.last);
                Err(self.error(Kind::String, self.pos + offset, byte, reason))
            }
        }
    }

    fn array(&mut self, dest: &mut Value<'a>) -> Result<()> {
        self.enter(Kind::Array, b'[')?;
        dest.kind = Kind::Array;
        self.advance(1);
        self.skip_whitespace();

        if self.peek() == Some(b']') {
            self.advance(1);
            self.depth -= 1;
            return Ok(());
        }

        while !self.rest.is_empty() {
            let child = dest.push_child(Value::default(), self.pools);
            self.value(child, false)?;

            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(b',') => {
                    self.advance(1);
                    self.skip_whitespace();
                }
                Some(b']') => {
                    self.advance(1);
                    self.depth -= 1;
                    return Ok(());
                }
                Some(b) => {
                    return Err(self.error(Kind::Array, self.pos, b, "invalid char after value"));
                }
            }
        }

        Err(self.error_at_end(Kind::Array, "missing closing bracket ']' for array"))
    }

    fn object(&mut self, dest: &mut Value<'a>) -> Result<()> {
        self.enter(Kind::Object, b'{')?;
        dest.kind = Kind::Object;
        self.advance(1);

        let mut expect = Expect::Key;
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.advance(1);
                continue;
            }
            match b {
                b'"' if expect == Expect::Key => {
                    let key = self.string()?;
                    dest.push_child(Value::with_key(key), self.pools);
                    expect = Expect::Colon;
                }
                b':' => {
                    if expect != Expect::Colon {
                        return Err(self.error(
                            Kind::Object,
                            self.pos,
                            b,
                            expecting!("unexpected colon, expecting ", expect),
                        ));
                    }
                    expect = Expect::Value;
                    self.advance(1);
                }
                b',' => {
                    if expect != Expect::Comma {
                        return Err(self.error(
                            Kind::Object,
                            self.pos,
                            b,
                            expecting!("unexpected comma, expecting ", expect),
                        ));
                    }
                    expect = Expect::Key;
                    self.advance(1);
                }
                b'}' => {
                    // legal only in an empty object or after a complete value
                    if (expect == Expect::Key && dest.children.is_empty())
                        || expect == Expect::Comma
                    {
                        self.advance(1);
                        self.depth -= 1;
                        return Ok(());
                    }
                    return Err(self.error(
                        Kind::Object,
                        self.pos,
                        b,
                        expecting!("can't close object after ", expect),
                    ));
                }
                _ => {
                    if expect != Expect::Value {
                        return Err(self.error(
                            Kind::Object,
                            self.pos,
                            b,
                            expecting!("unexpected value, expecting ", expect),
                        ));
                    }
                    let Some(child) = dest.children.last_mut() else {
                        return Err(self.error(Kind::Object, self.pos, b, "value without key"));
                    };
                    self.value(child, false)?;
                    expect = Expect::Comma;
                }
            }
        }

        Err(self.error_at_end(Kind::Object, "missing closing bracket '}' for object"))
    }
}

/// Unescapes the string whose opening quote is `buf[0]`, compacting the
/// decoded bytes towards the front of `buf`.
///
/// Returns the bytes consumed including both quotes and the decoded length,
/// or the offset of the offending byte and a reason.
fn unescape(buf: &mut [u8]) -> std::result::Result<(usize, usize), (usize, &'static str)> {
    let mut read = 1;
    let mut write = 1;

    while read < buf.len() {
        let b = buf[read];

        if b != b'\\' && b != b'"' && b >= 0x20 {
            buf[write] = b;
            read += 1;
            write += 1;
            continue;
        }

        match b {
            b'"' => return Ok((read + 1, write - 1)),
            b'\\' => {
                if buf.len() - read < 2 {
                    return Err((read, "backslash without any other character"));
                }
                read += 1;
                let unescaped = match buf[read] {
                    c @ (b'\\' | b'/' | b'"' | b'\'') => c,
                    b'n' => b'\n',
                    b't' => b'\t',
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'r' => b'\r',
                    b'u' => {
                        if buf.len() - read < 5 {
                            return Err((read, "unicode code point requires 4 hex characters"));
                        }
                        read += 1;
                        let Some(code) = hex4(&buf[read..read + 4]) else {
                            return Err((read, "invalid hex sequence for unicode code point"));
                        };
                        read += 4;

                        let ch = if (0xD800..0xE000).contains(&code) {
                            match buf
                                .get(read..read + 6)
                                .and_then(|next| combine_surrogates(code, next))
                            {
                                Some(ch) => {
                                    read += 6;
                                    ch
                                }
                                None => char::REPLACEMENT_CHARACTER,
                            }
                        } else {
                            char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
                        };

                        // an escape is never shorter than its UTF-8 encoding
                        let mut utf8 = [0; 4];
                        let encoded = ch.encode_utf8(&mut utf8).as_bytes();
                        buf[write..write + encoded.len()].copy_from_slice(encoded);
                        write += encoded.len();
                        continue;
                    }
                    _ => return Err((read, "invalid backslash escape")),
                };
                buf[write] = unescaped;
                write += 1;
                read += 1;
            }
            _ => return Err((read, "invalid control character in string")),
        }
    }

    Err((buf.len() - 1, "missing closing quote '\"' for string"))
}

#[inline]
fn hex4(bytes: &[u8]) -> Option<u32> {
    bytes
        .iter()
        .try_fold(0, |acc, &b| Some(acc << 4 | (b as char).to_digit(16)?))
}

/// Combines a high surrogate with a `\uXXXX` low surrogate in `next`.
fn combine_surrogates(high: u32, next: &[u8]) -> Option<char> {
    if !(0xD800..0xDC00).contains(&high) || next[0] != b'\\' || next[1] != b'u' {
        return None;
    }
    let low = hex4(&next[2..6])?;
    if !(0xDC00..0xE000).contains(&low) {
        return None;
    }
    char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
}

/// Parses `input` with the global pools and default options.
///
/// See [`Parser::parse`].
///
/// # Example
///
/// ```
/// use na_json::parse;
///
/// let mut data = br#"[1,2,3,1.33e4,true,null,"abc",{"key":13,"key2":false}]"#.to_vec();
/// let mut value = parse(&mut data).unwrap();
/// assert_eq!(value.len(), 8);
/// assert_eq!(value[3].raw(), b"1.33e4");
/// value.recycle();
/// ```
#[inline]
pub fn parse(input: &mut [u8]) -> Result<Value<'_>> {
    Parser::new().parse(input)
}

/// Parses into `dest` with the global pools and default options.
///
/// See [`Parser::parse_into`].
#[inline]
pub fn parse_into<'a>(dest: &mut Value<'a>, input: &'a mut [u8]) -> Result<()> {
    Parser::new().parse_into(dest, input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unescaped(input: &str) -> Vec<u8> {
        let mut buf = input.as_bytes().to_vec();
        let (consumed, len) = unescape(&mut buf).unwrap();
        assert_eq!(consumed, input.len());
        buf[1..1 + len].to_vec()
    }

    #[test]
    fn test_unescape_simple() {
        assert_eq!(unescaped(r#""a\nb""#), b"a\nb");
        assert_eq!(unescaped(r#""\/\'\"""#), b"/'\"");
    }

    #[test]
    fn test_unescape_surrogates() {
        assert_eq!(unescaped(r#""\uD834\uDD1E""#), "\u{1D11E}".as_bytes());
        assert_eq!(unescaped(r#""\uD834""#), "\u{FFFD}".as_bytes());
        // a high surrogate followed by a non-surrogate escape
        assert_eq!(unescaped(r#""\uD834\u0041""#), "\u{FFFD}A".as_bytes());
        // a lone low surrogate
        assert_eq!(unescaped(r#""\uDD1Ex""#), "\u{FFFD}x".as_bytes());
    }

    #[test]
    fn test_unescape_errors() {
        let mut buf = b"\"ab".to_vec();
        assert_eq!(
            unescape(&mut buf),
            Err((2, "missing closing quote '\"' for string"))
        );
        let mut buf = b"\"a\x01\"".to_vec();
        assert_eq!(
            unescape(&mut buf),
            Err((2, "invalid control character in string"))
        );
        let mut buf = br#""\u00G0""#.to_vec();
        assert_eq!(
            unescape(&mut buf),
            Err((3, "invalid hex sequence for unicode code point"))
        );
    }

    #[test]
    fn test_hex4() {
        assert_eq!(hex4(b"00e9"), Some(0xe9));
        assert_eq!(hex4(b"FFFF"), Some(0xffff));
        assert_eq!(hex4(b"+123"), None);
    }
}
