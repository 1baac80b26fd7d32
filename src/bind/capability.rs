use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    hash::BuildHasher,
    marker::PhantomData,
    str::FromStr,
};

use crate::{
    Bind, Binder, Error, Kind, OwnedValue, Result, Value, cold_path,
    number::{FromLiteral, parse_number},
};

/// A destination parsed from the decoded text of a JSON string.
///
/// `null` leaves the destination as it is; other kinds are an invalid
/// mapping.
///
/// # Example
///
/// ```
/// use std::net::Ipv4Addr;
///
/// use na_json::{Text, bind};
///
/// let mut addr = Text(Ipv4Addr::UNSPECIFIED);
/// bind(br#""127.0.0.1""#, &mut addr).unwrap();
/// assert_eq!(addr.0, Ipv4Addr::LOCALHOST);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Text<T>(pub T);

impl<T> Bind for Text<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn bind(&mut self, value: &Value<'_>, _binder: &Binder<'_>) -> Result<()> {
        match value.kind() {
            Kind::Null => Ok(()),
            Kind::String => {
                let text = std::str::from_utf8(value.raw())?;
                self.0 = text.parse().map_err(|e: T::Err| Error::Text(e.to_string()))?;
                Ok(())
            }
            kind => Err(Error::invalid_mapping(kind, std::any::type_name::<T>())),
        }
    }
}

/// A destination decoded by `serde_json` from the node re-encoded as text.
///
/// Types that already implement [`serde::Deserialize`] can be bound this way
/// without writing a [`Bind`] impl. The node is re-encoded into a pooled
/// buffer first.
///
/// # Example
///
/// ```
/// use na_json::{Json, bind};
///
/// #[derive(serde::Deserialize, Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let mut point = Json(Point::default());
/// bind(br#"{"x":1,"y":-2}"#, &mut point).unwrap();
/// assert_eq!((point.0.x, point.0.y), (1, -2));
/// ```
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Json<T>(pub T);

#[cfg(feature = "serde")]
impl<T: serde::de::DeserializeOwned> Bind for Json<T> {
    fn bind(&mut self, value: &Value<'_>, binder: &Binder<'_>) -> Result<()> {
        let pools = binder.pools();
        let mut buffer = pools.take_buffer();
        let encoded = {
            let mut encoder = crate::Encoder::with_pools(&mut buffer, pools);
            encoder.encode(value).and_then(|()| encoder.finish())
        };
        let result = encoded.and_then(|_| serde_json::from_slice(&buffer).map_err(|e| Error::Json(Box::new(e))));
        pools.put_buffer(buffer);
        self.0 = result?;
        Ok(())
    }
}

/// A growable byte destination filled from the raw bytes of a string or a
/// number literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteBuf(pub Vec<u8>);

impl Bind for ByteBuf {
    fn bind(&mut self, value: &Value<'_>, _binder: &Binder<'_>) -> Result<()> {
        if let Some(raw) = byte_source(value, "ByteBuf")? {
            self.0.clear();
            self.0.extend_from_slice(raw);
        }
        Ok(())
    }
}

/// A fixed-size byte destination. Shorter input is zero padded and longer
/// input truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteArray<const N: usize>(pub [u8; N]);

impl<const N: usize> Default for ByteArray<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> Bind for ByteArray<N> {
    fn bind(&mut self, value: &Value<'_>, _binder: &Binder<'_>) -> Result<()> {
        if let Some(raw) = byte_source(value, "ByteArray")? {
            let n = raw.len().min(N);
            self.0[..n].copy_from_slice(&raw[..n]);
            self.0[n..].fill(0);
        }
        Ok(())
    }
}

/// Raw bytes of a string or number, `None` for `null`.
#[inline]
pub(crate) fn byte_source<'v>(value: &'v Value<'_>, target: &'static str) -> Result<Option<&'v [u8]>> {
    match value.kind() {
        Kind::Null => Ok(None),
        Kind::String | Kind::Number => Ok(Some(value.raw())),
        kind => {
            cold_path();
            Err(Error::invalid_mapping(kind, target))
        }
    }
}

impl Bind for OwnedValue {
    #[inline]
    fn bind(&mut self, value: &Value<'_>, _binder: &Binder<'_>) -> Result<()> {
        *self = value.to_owned_value();
        Ok(())
    }
}

impl Bind for bool {
    fn bind(&mut self, value: &Value<'_>, binder: &Binder<'_>) -> Result<()> {
        match value.kind() {
            Kind::True => *self = true,
            Kind::False => *self = false,
            Kind::Null => {}
            Kind::String if binder.string_encoded() => match value.raw() {
                b"true" => *self = true,
                b"false" => *self = false,
                b"null" => {}
                _ => {
                    cold_path();
                    return Err(Error::invalid_mapping(Kind::String, "bool"));
                }
            },
            kind => {
                cold_path();
                return Err(Error::invalid_mapping(kind, "bool"));
            }
        }
        Ok(())
    }
}

/// The literal a numeric destination is parsed from, `None` for `null`.
#[inline]
fn numeric_source<'v>(
    value: &'v Value<'_>,
    binder: &Binder<'_>,
    target: &'static str,
) -> Result<Option<&'v [u8]>> {
    match value.kind() {
        Kind::Number => Ok(Some(value.raw())),
        Kind::Null => Ok(None),
        Kind::String if binder.string_encoded() => match value.raw() {
            b"null" => Ok(None),
            raw => Ok(Some(raw)),
        },
        kind => {
            cold_path();
            Err(Error::invalid_mapping(kind, target))
        }
    }
}

macro_rules! impl_numeric {
    ($($ty:ty),*) => {$(
        impl Bind for $ty {
            #[inline]
            fn bind(&mut self, value: &Value<'_>, binder: &Binder<'_>) -> Result<()> {
                if let Some(raw) = numeric_source(value, binder, <$ty as FromLiteral>::NAME)? {
                    *self = parse_number(raw)?;
                }
                Ok(())
            }
        }
    )*};
}

impl_numeric!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl Bind for String {
    fn bind(&mut self, value: &Value<'_>, _binder: &Binder<'_>) -> Result<()> {
        match value.kind() {
            Kind::String => {
                let text = std::str::from_utf8(value.raw())?;
                self.clear();
                self.push_str(text);
                Ok(())
            }
            Kind::Null => Ok(()),
            kind => {
                cold_path();
                Err(Error::invalid_mapping(kind, "String"))
            }
        }
    }
}

/// Existing elements are rebound in place and surplus ones truncated.
impl<T: Bind + Default> Bind for Vec<T> {
    fn bind(&mut self, value: &Value<'_>, binder: &Binder<'_>) -> Result<()> {
        match value.kind() {
            Kind::Array => {
                let children = value.children();
                self.truncate(children.len());
                self.reserve(children.len() - self.len());
                for (i, child) in children.iter().enumerate() {
                    if i == self.len() {
                        self.push(T::default());
                    }
                    self[i].bind(child, binder)?;
                }
                Ok(())
            }
            Kind::Null => {
                self.clear();
                Ok(())
            }
            kind => {
                cold_path();
                Err(Error::invalid_mapping(kind, "Vec"))
            }
        }
    }
}

/// Children beyond `N` are ignored; elements beyond the array's length keep
/// their value.
impl<T: Bind, const N: usize> Bind for [T; N] {
    fn bind(&mut self, value: &Value<'_>, binder: &Binder<'_>) -> Result<()> {
        match value.kind() {
            Kind::Array => {
                for (slot, child) in self.iter_mut().zip(value.children()) {
                    slot.bind(child, binder)?;
                }
                Ok(())
            }
            Kind::Null => Ok(()),
            kind => {
                cold_path();
                Err(Error::invalid_mapping(kind, "array"))
            }
        }
    }
}

macro_rules! impl_map {
    ($name:literal, [$($generics:tt)*], $ty:ty) => {
        /// Entries are merged into the map; `null` clears it.
        impl<V: Bind + Default, $($generics)*> Bind for $ty {
            fn bind(&mut self, value: &Value<'_>, binder: &Binder<'_>) -> Result<()> {
                match value.kind() {
                    Kind::Object => {
                        for (key, child) in value.entries() {
                            let key = std::str::from_utf8(key)?;
                            match self.get_mut(key) {
                                Some(slot) => slot.bind(child, binder)?,
                                None => {
                                    let mut slot = V::default();
                                    slot.bind(child, binder)?;
                                    self.insert(key.to_owned(), slot);
                                }
                            }
                        }
                        Ok(())
                    }
                    Kind::Null => {
                        self.clear();
                        Ok(())
                    }
                    kind => {
                        cold_path();
                        Err(Error::invalid_mapping(kind, $name))
                    }
                }
            }
        }
    };
}

impl_map!("HashMap", [S: BuildHasher + Default], HashMap<String, V, S>);
impl_map!("BTreeMap", [], BTreeMap<String, V>);

impl<T: Bind + Default> Bind for Option<T> {
    fn bind(&mut self, value: &Value<'_>, binder: &Binder<'_>) -> Result<()> {
        let null = match value.kind() {
            Kind::Null => true,
            Kind::String => binder.string_encoded() && value.raw() == b"null",
            _ => false,
        };
        if null {
            *self = None;
            return Ok(());
        }
        self.get_or_insert_with(T::default).bind(value, binder)
    }
}

impl<T: Bind + ?Sized> Bind for Box<T> {
    #[inline]
    fn bind(&mut self, value: &Value<'_>, binder: &Binder<'_>) -> Result<()> {
        (**self).bind(value, binder)
    }
}

/// Accepts anything and binds nothing.
impl<T: ?Sized> Bind for PhantomData<T> {
    #[inline]
    fn bind(&mut self, _value: &Value<'_>, _binder: &Binder<'_>) -> Result<()> {
        Ok(())
    }
}
