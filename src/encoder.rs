//! Buffered JSON encoding of [`Value`] trees.
//!
//! Output is batched in a 255-byte scratch buffer taken from a [`Pools`] and
//! reaches the sink only when the scratch buffer would overflow or when the
//! encoder finishes, so the number of sink writes does not grow with the
//! number of tokens.

use std::{
    io::{self, Write},
    mem::ManuallyDrop,
};

use crate::{
    EncodeOptions, Error, Kind, Parser, PoolConfig, Pools, Result, Value, cold_path,
    pool::Scratch,
};

const SCRATCH_LEN: usize = PoolConfig::SCRATCH_LEN;
const HEX: &[u8; 16] = b"0123456789abcdef";

/// A buffered JSON writer.
///
/// # Example
///
/// ```
/// use na_json::{EncodeOptions, Encoder, Value};
///
/// let value = Value::object([("a", Value::array(vec![Value::from_i64(1), Value::from_i64(2)]))]);
///
/// let mut out = Vec::new();
/// let mut encoder = Encoder::new(&mut out).options(EncodeOptions::new().indent("  "));
/// encoder.encode(&value).unwrap();
/// let written = encoder.finish().unwrap();
///
/// assert_eq!(out, b"{\"a\": [\n  1,\n  2\n]}");
/// assert_eq!(written, out.len());
/// ```
pub struct Encoder<'p, W: Write> {
    writer: W,
    scratch: ManuallyDrop<Scratch>,
    filled: usize,
    written: usize,
    pools: &'p Pools,
    options: EncodeOptions,
}

impl<W: Write> Encoder<'static, W> {
    /// An encoder drawing its scratch buffer from the global pools.
    pub fn new(writer: W) -> Self {
        Self::with_pools(writer, Pools::global())
    }
}

impl<'p, W: Write> Encoder<'p, W> {
    pub fn with_pools(writer: W, pools: &'p Pools) -> Self {
        Self {
            writer,
            scratch: ManuallyDrop::new(pools.take_scratch()),
            filled: 0,
            written: 0,
            pools,
            options: EncodeOptions::default(),
        }
    }

    pub fn options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Writes one value.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if the tree holds a `Kind::Invalid` node or
    ///   a number without a literal
    /// - [`Error::Io`] if the sink fails
    pub fn encode(&mut self, value: &Value<'_>) -> Result<()> {
        self.value(value, 0)
    }

    /// Flushes everything and returns the number of bytes written to the sink.
    pub fn finish(mut self) -> Result<usize> {
        self.flush_scratch()?;
        self.writer.flush()?;
        Ok(self.written)
    }

    #[inline]
    fn flush_scratch(&mut self) -> io::Result<()> {
        if self.filled > 0 {
            self.writer.write_all(&self.scratch[..self.filled])?;
            self.written += self.filled;
            self.filled = 0;
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn write_byte(&mut self, b: u8) -> Result<()> {
        if self.filled == SCRATCH_LEN {
            self.flush_scratch()?;
        }
        self.scratch[self.filled] = b;
        self.filled += 1;
        Ok(())
    }

    #[inline]
    fn write_two(&mut self, b1: u8, b2: u8) -> Result<()> {
        if self.filled + 2 > SCRATCH_LEN {
            self.flush_scratch()?;
        }
        self.scratch[self.filled] = b1;
        self.scratch[self.filled + 1] = b2;
        self.filled += 2;
        Ok(())
    }

    /// Writes `bytes` verbatim. Runs longer than the scratch buffer go to the
    /// sink directly.
    #[inline]
    pub(crate) fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > SCRATCH_LEN - self.filled {
            self.flush_scratch()?;
            if bytes.len() >= SCRATCH_LEN {
                cold_path();
                self.writer.write_all(bytes)?;
                self.written += bytes.len();
                return Ok(());
            }
        }
        self.scratch[self.filled..self.filled + bytes.len()].copy_from_slice(bytes);
        self.filled += bytes.len();
        Ok(())
    }

    fn newline(&mut self, indent: &str, depth: usize) -> Result<()> {
        self.write_byte(b'\n')?;
        for _ in 0..depth {
            self.write(indent.as_bytes())?;
        }
        Ok(())
    }

    fn value(&mut self, value: &Value<'_>, depth: usize) -> Result<()> {
        match value.kind() {
            Kind::Null => self.write(b"null"),
            Kind::True => self.write(b"true"),
            Kind::False => self.write(b"false"),
            Kind::Number => {
                if value.raw().is_empty() {
                    cold_path();
                    return Err(Error::InvalidValue("number without a literal"));
                }
                self.write(value.raw())
            }
            Kind::String => self.write_string(value.raw()),
            Kind::Array | Kind::Object => self.container(value, depth),
            Kind::Invalid => {
                cold_path();
                Err(Error::InvalidValue("value of kind invalid"))
            }
        }
    }

    /// Containers with two or more children are expanded one child per line
    /// in pretty mode; empty and single-child containers stay inline.
    fn container(&mut self, value: &Value<'_>, depth: usize) -> Result<()> {
        let object = value.kind() == Kind::Object;
        let (open, close) = if object { (b'{', b'}') } else { (b'[', b']') };
        let indent = self.options.indent.filter(|_| value.len() > 1);
        let inner = if indent.is_some() { depth + 1 } else { depth };

        self.write_byte(open)?;
        for (i, child) in value.iter().enumerate() {
            if i > 0 {
                self.write_byte(b',')?;
            }
            if let Some(indent) = indent {
                self.newline(indent, inner)?;
            }
            if object {
                self.write_string(child.key())?;
                if self.options.is_pretty() {
                    self.write_two(b':', b' ')?;
                } else {
                    self.write_byte(b':')?;
                }
            }
            self.value(child, inner)?;
        }
        if let Some(indent) = indent {
            self.newline(indent, depth)?;
        }
        self.write_byte(close)
    }

    /// Writes `s` as a quoted JSON string.
    pub(crate) fn write_string(&mut self, s: &[u8]) -> Result<()> {
        self.write_byte(b'"')?;
        for chunk in s.utf8_chunks() {
            self.write_escaped(chunk.valid().as_bytes())?;
            if !chunk.invalid().is_empty() {
                self.write(b"\\ufffd")?;
            }
        }
        self.write_byte(b'"')
    }

    /// Escapes valid UTF-8, writing unescaped runs in one piece.
    fn write_escaped(&mut self, s: &[u8]) -> Result<()> {
        let html = self.options.escape_html;
        let mut start = 0;
        let mut i = 0;
        while i < s.len() {
            let b = s[i];
            let escape: Option<&[u8]> = match b {
                b'"' => Some(b"\\\""),
                b'\\' => Some(b"\\\\"),
                b'\n' => Some(b"\\n"),
                b'\r' => Some(b"\\r"),
                b'\t' => Some(b"\\t"),
                0x00..=0x1f => None,
                b'<' | b'>' | b'&' if html => None,
                // U+2028 and U+2029
                0xe2 if s.get(i + 1) == Some(&0x80) && matches!(s.get(i + 2), Some(0xa8 | 0xa9)) => {
                    self.write(&s[start..i])?;
                    self.write(if s[i + 2] == 0xa8 { b"\\u2028" } else { b"\\u2029" })?;
                    i += 3;
                    start = i;
                    continue;
                }
                _ => {
                    i += 1;
                    continue;
                }
            };
            self.write(&s[start..i])?;
            match escape {
                Some(escape) => self.write(escape)?,
                None => self.write(&[
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX[(b >> 4) as usize],
                    HEX[(b & 0xf) as usize],
                ])?,
            }
            i += 1;
            start = i;
        }
        self.write(&s[start..])
    }
}

impl<W: Write> Drop for Encoder<'_, W> {
    fn drop(&mut self) {
        // SAFETY: `scratch` is never touched again after this.
        let scratch = unsafe { ManuallyDrop::take(&mut self.scratch) };
        self.pools.put_scratch(scratch);
    }
}

impl Value<'_> {
    /// Writes compact JSON to `writer` and returns the number of bytes written.
    pub fn encode<W: Write>(&self, writer: W) -> Result<usize> {
        let mut encoder = Encoder::new(writer);
        encoder.encode(self)?;
        encoder.finish()
    }

    /// Compact JSON in a new vector.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Pretty JSON in a new vector, indenting by `indent` per level.
    pub fn to_pretty_vec(&self, indent: &'static str) -> Result<Vec<u8>> {
        encode_pretty(self, indent)
    }
}

/// Encodes `value` as compact JSON.
///
/// # Example
///
/// ```
/// use na_json::{encode, parse};
///
/// let text = r#"[1,2,3,1.33e4,true,null,"1337çé7331",{"key":13,"key2":false}]"#.as_bytes();
/// let mut data = text.to_vec();
/// let value = parse(&mut data).unwrap();
/// assert_eq!(encode(&value).unwrap(), text);
/// ```
pub fn encode(value: &Value<'_>) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    value.encode(&mut out)?;
    Ok(out)
}

/// Encodes `value` as pretty JSON, indenting by `indent` per level.
pub fn encode_pretty(value: &Value<'_>, indent: &'static str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out).options(EncodeOptions::new().indent(indent));
    encoder.encode(value)?;
    encoder.finish()?;
    Ok(out)
}

/// Encodes `value` as compact JSON into a [`bytes::Bytes`].
#[cfg(feature = "bytes")]
pub fn encode_to_bytes(value: &Value<'_>) -> Result<bytes::Bytes> {
    use bytes::BufMut;

    let mut writer = bytes::BytesMut::new().writer();
    let mut encoder = Encoder::new(&mut writer);
    encoder.encode(value)?;
    encoder.finish()?;
    Ok(writer.into_inner().freeze())
}

/// Reformats a JSON document with one level of `indent` per nesting depth.
///
/// The input is copied into a pooled buffer before parsing and left
/// untouched. Callers that want to show the raw text on failure do so from
/// the error.
///
/// # Example
///
/// ```
/// use na_json::pretty_print;
///
/// let text = pretty_print(br#"{"op":"hello","d":{"v":1}}"#, "\t").unwrap();
/// assert_eq!(text, "{\n\t\"op\": \"hello\",\n\t\"d\": {\"v\": 1}\n}");
/// ```
pub fn pretty_print(input: &[u8], indent: &'static str) -> Result<String> {
    let pools = Pools::global();
    let mut buffer = pools.take_buffer();
    buffer.extend_from_slice(input);
    let rendered = render_pretty(&mut buffer, indent, pools);
    pools.put_buffer(buffer);
    String::from_utf8(rendered?).map_err(|e| Error::InvalidUtf8(e.utf8_error()))
}

fn render_pretty(buffer: &mut [u8], indent: &'static str, pools: &Pools) -> Result<Vec<u8>> {
    let mut value = Parser::with_pools(pools).parse(buffer)?;
    let mut out = Vec::new();
    let mut encoder =
        Encoder::with_pools(&mut out, pools).options(EncodeOptions::new().indent(indent));
    let result = encoder.encode(&value).and_then(|()| encoder.finish());
    value.recycle_into(pools);
    result?;
    Ok(out)
}
