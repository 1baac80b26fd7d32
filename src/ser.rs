//! Typed encoding through [`serde`].
//!
//! [`Serializer`] streams compact JSON through an [`Encoder`], so typed values
//! share the buffering and string escaping of tree encoding. [`to_value`]
//! builds an [`OwnedValue`] instead, which can then be pretty printed.

use std::{cell::RefCell, io::Write};

use serde::{
    Serialize,
    ser::{self, Impossible},
};

use crate::{Encoder, Error, Kind, OwnedValue, Pools, Result, Value, cold_path, number};

/// JSON serializer implementing [`serde::Serializer`].
///
/// For most use cases, prefer the convenience functions [`to_vec`],
/// [`to_string`] and [`to_writer`] rather than using this type directly.
///
/// Integers are formatted with `itoa` and floats with `ryu`. Byte slices are
/// written as arrays of numbers, enums are externally tagged, and map keys
/// must be strings, chars or integers (integers are quoted).
pub struct Serializer<'p, W: Write> {
    encoder: Encoder<'p, W>,
}

impl<W: Write> Serializer<'static, W> {
    pub fn new(writer: W) -> Self {
        Self {
            encoder: Encoder::new(writer),
        }
    }
}

impl<'p, W: Write> Serializer<'p, W> {
    pub fn with_pools(writer: W, pools: &'p Pools) -> Self {
        Self {
            encoder: Encoder::with_pools(writer, pools),
        }
    }

    /// Flushes and returns the number of bytes written.
    pub fn finish(self) -> Result<usize> {
        self.encoder.finish()
    }

    #[inline]
    fn write_int<I: itoa::Integer>(&mut self, v: I) -> Result<()> {
        let mut buffer = itoa::Buffer::new();
        self.encoder.write(buffer.format(v).as_bytes())
    }

    #[inline]
    fn write_float<F: ryu::Float>(&mut self, v: F, finite: bool) -> Result<()> {
        if !finite {
            cold_path();
            return Err(Error::NonFiniteFloat);
        }
        let mut buffer = ryu::Buffer::new();
        self.encoder.write(buffer.format_finite(v).as_bytes())
    }

    #[inline]
    fn begin_variant(&mut self, variant: &str) -> Result<()> {
        self.encoder.write_byte(b'{')?;
        self.encoder.write_string(variant.as_bytes())?;
        self.encoder.write_byte(b':')
    }
}

/// Serialize a value to compact JSON.
///
/// # Example
///
/// ```
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Ping {
///     op: &'static str,
///     seq: u32,
/// }
///
/// let bytes = na_json::to_vec(&Ping { op: "ping", seq: 7 }).unwrap();
/// assert_eq!(bytes, br#"{"op":"ping","seq":7}"#);
/// ```
///
/// # Errors
///
/// Returns an error if:
/// - A float is NaN or infinite ([`Error::NonFiniteFloat`])
/// - A map has keys that are not strings, chars or integers ([`Error::KeyMustBeString`])
/// - The value's `Serialize` impl reports a custom error ([`Error::Message`])
#[inline]
pub fn to_vec(value: &(impl ?Sized + Serialize)) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    to_writer(&mut out, value)?;
    Ok(out)
}

/// Serialize a value to a compact JSON string.
#[inline]
pub fn to_string(value: &(impl ?Sized + Serialize)) -> Result<String> {
    let bytes = to_vec(value)?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidUtf8(e.utf8_error()))
}

/// Serialize a value as compact JSON to an [`std::io::Write`] implementation.
///
/// Output is batched through the encoder's scratch buffer, so unbuffered
/// sinks see few writes.
#[inline]
pub fn to_writer(writer: &mut impl Write, value: &(impl ?Sized + Serialize)) -> Result<()> {
    let mut serializer = Serializer::new(writer);
    value.serialize(&mut serializer)?;
    serializer.finish()?;
    Ok(())
}

impl<'a, 'p, W: Write> ser::Serializer for &'a mut Serializer<'p, W> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = SeqSerializer<'a, 'p, W>;
    type SerializeTuple = SeqSerializer<'a, 'p, W>;
    type SerializeTupleStruct = SeqSerializer<'a, 'p, W>;
    type SerializeTupleVariant = SeqSerializer<'a, 'p, W>;
    type SerializeMap = MapSerializer<'a, 'p, W>;
    type SerializeStruct = MapSerializer<'a, 'p, W>;
    type SerializeStructVariant = MapSerializer<'a, 'p, W>;

    #[inline]
    fn serialize_bool(self, v: bool) -> Result<()> {
        self.encoder.write(if v { b"true" } else { b"false" })
    }

    #[inline]
    fn serialize_i8(self, v: i8) -> Result<()> {
        self.write_int(v)
    }

    #[inline]
    fn serialize_i16(self, v: i16) -> Result<()> {
        self.write_int(v)
    }

    #[inline]
    fn serialize_i32(self, v: i32) -> Result<()> {
        self.write_int(v)
    }

    #[inline]
    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write_int(v)
    }

    #[inline]
    fn serialize_i128(self, v: i128) -> Result<()> {
        self.write_int(v)
    }

    #[inline]
    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write_int(v)
    }

    #[inline]
    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write_int(v)
    }

    #[inline]
    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write_int(v)
    }

    #[inline]
    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write_int(v)
    }

    #[inline]
    fn serialize_u128(self, v: u128) -> Result<()> {
        self.write_int(v)
    }

    #[inline]
    fn serialize_f32(self, v: f32) -> Result<()> {
        self.write_float(v, v.is_finite())
    }

    #[inline]
    fn serialize_f64(self, v: f64) -> Result<()> {
        self.write_float(v, v.is_finite())
    }

    #[inline]
    fn serialize_char(self, v: char) -> Result<()> {
        self.serialize_str(v.encode_utf8(&mut [0; 4]))
    }

    #[inline]
    fn serialize_str(self, v: &str) -> Result<()> {
        self.encoder.write_string(v.as_bytes())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.encoder.write_byte(b'[')?;
        for (i, &b) in v.iter().enumerate() {
            if i > 0 {
                self.encoder.write_byte(b',')?;
            }
            self.write_int(b)?;
        }
        self.encoder.write_byte(b']')
    }

    #[inline]
    fn serialize_none(self) -> Result<()> {
        self.serialize_unit()
    }

    #[inline]
    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    #[inline]
    fn serialize_unit(self) -> Result<()> {
        self.encoder.write(b"null")
    }

    #[inline]
    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    #[inline]
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    #[inline]
    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if name == NUMBER_TOKEN {
            let literal = capture_literal(value)?;
            return self.encoder.write(&literal);
        }
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.begin_variant(variant)?;
        value.serialize(&mut *self)?;
        self.encoder.write_byte(b'}')
    }

    #[inline]
    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.encoder.write_byte(b'[')?;
        Ok(SeqSerializer {
            ser: self,
            first: true,
            variant: false,
        })
    }

    #[inline]
    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    #[inline]
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.begin_variant(variant)?;
        self.encoder.write_byte(b'[')?;
        Ok(SeqSerializer {
            ser: self,
            first: true,
            variant: true,
        })
    }

    #[inline]
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.encoder.write_byte(b'{')?;
        Ok(MapSerializer {
            ser: self,
            first: true,
            variant: false,
        })
    }

    #[inline]
    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.begin_variant(variant)?;
        self.encoder.write_byte(b'{')?;
        Ok(MapSerializer {
            ser: self,
            first: true,
            variant: true,
        })
    }
}

/// Serializer for sequences, tuples and tuple variants.
pub struct SeqSerializer<'a, 'p, W: Write> {
    ser: &'a mut Serializer<'p, W>,
    first: bool,
    /// Whether the sequence is wrapped in a `{"variant":...}` object.
    variant: bool,
}

impl<W: Write> SeqSerializer<'_, '_, W> {
    #[inline]
    fn element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if !self.first {
            self.ser.encoder.write_byte(b',')?;
        }
        self.first = false;
        value.serialize(&mut *self.ser)
    }

    #[inline]
    fn close(self) -> Result<()> {
        self.ser.encoder.write_byte(b']')?;
        if self.variant {
            self.ser.encoder.write_byte(b'}')?;
        }
        Ok(())
    }
}

impl<W: Write> ser::SerializeSeq for SeqSerializer<'_, '_, W> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.close()
    }
}

impl<W: Write> ser::SerializeTuple for SeqSerializer<'_, '_, W> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.close()
    }
}

impl<W: Write> ser::SerializeTupleStruct for SeqSerializer<'_, '_, W> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.close()
    }
}

impl<W: Write> ser::SerializeTupleVariant for SeqSerializer<'_, '_, W> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.close()
    }
}

/// Serializer for maps, structs and struct variants.
pub struct MapSerializer<'a, 'p, W: Write> {
    ser: &'a mut Serializer<'p, W>,
    first: bool,
    variant: bool,
}

impl<W: Write> MapSerializer<'_, '_, W> {
    #[inline]
    fn field<T>(&mut self, key: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeMap::serialize_key(self, key)?;
        ser::SerializeMap::serialize_value(self, value)
    }

    #[inline]
    fn close(self) -> Result<()> {
        self.ser.encoder.write_byte(b'}')?;
        if self.variant {
            self.ser.encoder.write_byte(b'}')?;
        }
        Ok(())
    }
}

impl<W: Write> ser::SerializeMap for MapSerializer<'_, '_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if !self.first {
            self.ser.encoder.write_byte(b',')?;
        }
        self.first = false;
        key.serialize(MapKeySerializer {
            sink: &mut self.ser.encoder,
        })?;
        self.ser.encoder.write_byte(b':')
    }

    #[inline]
    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.close()
    }
}

impl<W: Write> ser::SerializeStruct for MapSerializer<'_, '_, W> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.close()
    }
}

impl<W: Write> ser::SerializeStructVariant for MapSerializer<'_, '_, W> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.close()
    }
}

/// Where a map key ends up: written to the output, or captured as text.
trait KeySink {
    type Ok;

    fn key(self, text: &str) -> Result<Self::Ok>;
}

impl<W: Write> KeySink for &mut Encoder<'_, W> {
    type Ok = ();

    #[inline]
    fn key(self, text: &str) -> Result<()> {
        self.write_string(text.as_bytes())
    }
}

struct CaptureKey;

impl KeySink for CaptureKey {
    type Ok = String;

    #[inline]
    fn key(self, text: &str) -> Result<String> {
        Ok(text.to_owned())
    }
}

/// Accepts strings, chars and integers as map keys.
struct MapKeySerializer<S> {
    sink: S,
}

macro_rules! int_key {
    ($($method:ident($ty:ty)),*) => {$(
        #[inline]
        fn $method(self, v: $ty) -> Result<S::Ok> {
            let mut buffer = itoa::Buffer::new();
            self.sink.key(buffer.format(v))
        }
    )*};
}

macro_rules! reject_key {
    ($($method:ident($($ty:ty),*)),*) => {$(
        #[inline]
        fn $method(self, $(_: $ty),*) -> Result<S::Ok> {
            cold_path();
            Err(Error::KeyMustBeString)
        }
    )*};
}

impl<S: KeySink> ser::Serializer for MapKeySerializer<S> {
    type Ok = S::Ok;
    type Error = Error;

    type SerializeSeq = Impossible<S::Ok, Error>;
    type SerializeTuple = Impossible<S::Ok, Error>;
    type SerializeTupleStruct = Impossible<S::Ok, Error>;
    type SerializeTupleVariant = Impossible<S::Ok, Error>;
    type SerializeMap = Impossible<S::Ok, Error>;
    type SerializeStruct = Impossible<S::Ok, Error>;
    type SerializeStructVariant = Impossible<S::Ok, Error>;

    int_key!(
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128)
    );

    reject_key!(
        serialize_bool(bool),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_bytes(&[u8]),
        serialize_none(),
        serialize_unit(),
        serialize_unit_struct(&'static str)
    );

    #[inline]
    fn serialize_char(self, v: char) -> Result<S::Ok> {
        self.sink.key(v.encode_utf8(&mut [0; 4]))
    }

    #[inline]
    fn serialize_str(self, v: &str) -> Result<S::Ok> {
        self.sink.key(v)
    }

    #[inline]
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<S::Ok> {
        self.sink.key(variant)
    }

    #[inline]
    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<S::Ok>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_some<T>(self, _value: &T) -> Result<S::Ok>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::KeyMustBeString)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<S::Ok>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::KeyMustBeString)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::KeyMustBeString)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::KeyMustBeString)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::KeyMustBeString)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::KeyMustBeString)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::KeyMustBeString)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::KeyMustBeString)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::KeyMustBeString)
    }
}

/// Serialize a value into an [`OwnedValue`] tree.
///
/// Numbers keep their formatted literal, so encoding the tree produces the
/// same text as [`to_vec`]. Combined with
/// [`Value::to_pretty_vec`](crate::Value::to_pretty_vec) this pretty prints
/// typed values.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
///
/// let mut map = BTreeMap::new();
/// map.insert("b", vec![1, 2]);
/// map.insert("a", vec![]);
///
/// let value = na_json::to_value(&map).unwrap();
/// assert_eq!(value.to_pretty_vec("\t").unwrap(), b"{\n\t\"a\": [],\n\t\"b\": [\n\t\t1,\n\t\t2\n\t]\n}");
/// ```
pub fn to_value(value: &(impl ?Sized + Serialize)) -> Result<OwnedValue> {
    value.serialize(ValueSerializer)
}

#[inline]
fn int_value<I: itoa::Integer>(v: I) -> OwnedValue {
    let mut buffer = itoa::Buffer::new();
    Value::number(buffer.format(v).as_bytes().to_vec())
}

#[inline]
fn float_value<F: ryu::Float>(v: F, finite: bool) -> Result<OwnedValue> {
    if !finite {
        cold_path();
        return Err(Error::NonFiniteFloat);
    }
    let mut buffer = ryu::Buffer::new();
    Ok(Value::number(buffer.format_finite(v).as_bytes().to_vec()))
}

#[inline]
fn keyed(key: impl Into<String>, mut value: OwnedValue) -> OwnedValue {
    value.key = key.into().into_bytes().into();
    value
}

/// Builds a tree instead of writing text.
struct ValueSerializer;

macro_rules! int_value {
    ($($method:ident($ty:ty)),*) => {$(
        #[inline]
        fn $method(self, v: $ty) -> Result<OwnedValue> {
            Ok(int_value(v))
        }
    )*};
}

impl ser::Serializer for ValueSerializer {
    type Ok = OwnedValue;
    type Error = Error;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = SeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = MapBuilder;

    #[inline]
    fn serialize_bool(self, v: bool) -> Result<OwnedValue> {
        Ok(Value::bool(v))
    }

    int_value!(
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128)
    );

    #[inline]
    fn serialize_f32(self, v: f32) -> Result<OwnedValue> {
        float_value(v, v.is_finite())
    }

    #[inline]
    fn serialize_f64(self, v: f64) -> Result<OwnedValue> {
        float_value(v, v.is_finite())
    }

    #[inline]
    fn serialize_char(self, v: char) -> Result<OwnedValue> {
        Ok(Value::string(v.to_string()))
    }

    #[inline]
    fn serialize_str(self, v: &str) -> Result<OwnedValue> {
        Ok(Value::string(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<OwnedValue> {
        Ok(v.iter().map(|&b| int_value(b)).collect())
    }

    #[inline]
    fn serialize_none(self) -> Result<OwnedValue> {
        Ok(Value::null())
    }

    #[inline]
    fn serialize_some<T>(self, value: &T) -> Result<OwnedValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    #[inline]
    fn serialize_unit(self) -> Result<OwnedValue> {
        Ok(Value::null())
    }

    #[inline]
    fn serialize_unit_struct(self, _name: &'static str) -> Result<OwnedValue> {
        Ok(Value::null())
    }

    #[inline]
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<OwnedValue> {
        Ok(Value::string(variant))
    }

    #[inline]
    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<OwnedValue>
    where
        T: ?Sized + Serialize,
    {
        if name == NUMBER_TOKEN {
            return Ok(Value::number(capture_literal(value)?));
        }
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<OwnedValue>
    where
        T: ?Sized + Serialize,
    {
        let inner = value.serialize(ValueSerializer)?;
        Ok(Value::object([(variant, inner)]))
    }

    #[inline]
    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
            variant: None,
        })
    }

    #[inline]
    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder> {
        self.serialize_seq(Some(len))
    }

    #[inline]
    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqBuilder> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqBuilder> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len),
            variant: Some(variant),
        })
    }

    #[inline]
    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder> {
        Ok(MapBuilder {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            next_key: None,
            variant: None,
        })
    }

    #[inline]
    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapBuilder> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<MapBuilder> {
        Ok(MapBuilder {
            entries: Vec::with_capacity(len),
            next_key: None,
            variant: Some(variant),
        })
    }
}

#[doc(hidden)]
pub struct SeqBuilder {
    items: Vec<OwnedValue>,
    variant: Option<&'static str>,
}

impl SeqBuilder {
    #[inline]
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn build(self) -> OwnedValue {
        let array = Value::array(self.items);
        match self.variant {
            Some(variant) => Value::object([(variant, array)]),
            None => array,
        }
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = OwnedValue;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<OwnedValue> {
        Ok(self.build())
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = OwnedValue;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<OwnedValue> {
        Ok(self.build())
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = OwnedValue;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<OwnedValue> {
        Ok(self.build())
    }
}

impl ser::SerializeTupleVariant for SeqBuilder {
    type Ok = OwnedValue;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<OwnedValue> {
        Ok(self.build())
    }
}

#[doc(hidden)]
pub struct MapBuilder {
    entries: Vec<OwnedValue>,
    next_key: Option<String>,
    variant: Option<&'static str>,
}

impl MapBuilder {
    fn build(self) -> OwnedValue {
        let mut object = Value::array(self.entries);
        object.kind = Kind::Object;
        match self.variant {
            Some(variant) => Value::object([(variant, object)]),
            None => object,
        }
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = OwnedValue;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.next_key = Some(key.serialize(MapKeySerializer { sink: CaptureKey })?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self.next_key.take().unwrap_or_default();
        self.entries
            .push(keyed(key, value.serialize(ValueSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<OwnedValue> {
        Ok(self.build())
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = OwnedValue;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.entries
            .push(keyed(key, value.serialize(ValueSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<OwnedValue> {
        Ok(self.build())
    }
}

impl ser::SerializeStructVariant for MapBuilder {
    type Ok = OwnedValue;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.entries
            .push(keyed(key, value.serialize(ValueSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<OwnedValue> {
        Ok(self.build())
    }
}

/// Newtype name under which [`Value`] hands a number literal to the
/// serializers of this module.
const NUMBER_TOKEN: &str = "$na_json::private::Number";

thread_local! {
    /// Set while a serializer of this module captures a number literal.
    static LITERAL: RefCell<Option<Vec<u8>>> = const { RefCell::new(None) };
}

/// A number literal of a [`Value`].
///
/// The serializers of this module write the literal verbatim. Any other
/// serializer gets the first of `i64`, `u64` or `f64` that holds it.
struct NumberLiteral<'v>(&'v [u8]);

impl Serialize for NumberLiteral<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        let literal = self.0;
        if number::scan(literal) != Ok(literal.len()) {
            cold_path();
            return Err(ser::Error::custom(format_args!(
                "invalid number literal {}",
                String::from_utf8_lossy(literal)
            )));
        }

        let captured = LITERAL.with_borrow_mut(|slot| match slot {
            Some(buffer) => {
                buffer.extend_from_slice(literal);
                true
            }
            None => false,
        });
        if captured {
            return serializer.serialize_unit();
        }

        // valid grammar, so only out of range floats are left over
        let text = std::str::from_utf8(literal).map_err(ser::Error::custom)?;
        if let Ok(n) = text.parse::<i64>() {
            serializer.serialize_i64(n)
        } else if let Ok(n) = text.parse::<u64>() {
            serializer.serialize_u64(n)
        } else {
            match text.parse::<f64>() {
                Ok(n) if n.is_finite() => serializer.serialize_f64(n),
                _ => Err(ser::Error::custom(format_args!(
                    "number {text} is out of range"
                ))),
            }
        }
    }
}

/// Serializes `value`, which must be a [`NumberLiteral`], and returns its
/// literal.
fn capture_literal<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    LITERAL.with_borrow_mut(|slot| *slot = Some(Vec::new()));
    let result = value.serialize(ValueSerializer);
    let literal = LITERAL.with_borrow_mut(Option::take).unwrap_or_default();
    result?;
    if literal.is_empty() {
        cold_path();
        return Err(Error::InvalidValue("number without a literal"));
    }
    Ok(literal)
}

/// Strings are converted lossily to UTF-8. Numbers keep their literal with
/// the serializers of this crate; other serializers get the first of `i64`,
/// `u64` or `f64` that holds them.
impl Serialize for Value<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        use ser::{SerializeMap, SerializeSeq};

        match self.kind() {
            Kind::Null => serializer.serialize_unit(),
            Kind::True => serializer.serialize_bool(true),
            Kind::False => serializer.serialize_bool(false),
            Kind::String => serializer.serialize_str(&String::from_utf8_lossy(self.raw())),
            Kind::Number => {
                serializer.serialize_newtype_struct(NUMBER_TOKEN, &NumberLiteral(self.raw()))
            }
            Kind::Array => {
                let mut seq = serializer.serialize_seq(Some(self.len()))?;
                for child in self.iter() {
                    seq.serialize_element(child)?;
                }
                seq.end()
            }
            Kind::Object => {
                let mut map = serializer.serialize_map(Some(self.len()))?;
                for (key, child) in self.entries() {
                    map.serialize_entry(&String::from_utf8_lossy(key), child)?;
                }
                map.end()
            }
            Kind::Invalid => Err(ser::Error::custom("cannot serialize an invalid value")),
        }
    }
}
