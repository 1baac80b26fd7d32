use std::{borrow::Cow, collections::HashMap, fmt, mem, slice};

use crate::{Index, Kind, Pools, number::parse_number};

/// A value that owns every byte it refers to.
pub type OwnedValue = Value<'static>;

/// A single node of a JSON document.
///
/// A value produced by [`parse`](crate::parse) borrows its strings and number
/// literals from the input buffer for `'a`: strings are unescaped in place
/// and numbers keep their literal text verbatim, so a parse does not copy any
/// payload. Children of arrays and objects are stored in node arrays taken
/// from a [`Pools`]; call [`recycle`](Value::recycle) to hand them back once
/// the tree is no longer needed.
///
/// Which fields are meaningful depends on [`kind`](Value::kind):
///
/// - `String` and `Number` carry [`raw`](Value::raw) bytes
/// - `Object` and `Array` carry [`children`](Value::children)
/// - children of an object carry a [`key`](Value::key)
///
/// # Example
///
/// ```
/// use na_json::{Kind, parse};
///
/// let mut data = br#"{"name":"na\tjson","tags":[1,2]}"#.to_vec();
/// let value = parse(&mut data).unwrap();
///
/// assert_eq!(value.kind(), Kind::Object);
/// assert_eq!(value["name"].as_str(), Some("na\tjson"));
/// assert_eq!(value["tags"][1].as_i64(), Some(2));
/// ```
pub struct Value<'a> {
    pub(crate) kind: Kind,
    pub(crate) raw: Cow<'a, [u8]>,
    pub(crate) key: Cow<'a, [u8]>,
    pub(crate) children: Vec<Value<'a>>,
    pub(crate) index: Option<HashMap<&'a [u8], usize>>,
    /// Whether `children` is a node array taken from a pool.
    pub(crate) pooled: bool,
}

#[inline]
fn str_bytes(s: Cow<'_, str>) -> Cow<'_, [u8]> {
    match s {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

impl Default for Value<'_> {
    #[inline]
    fn default() -> Self {
        Self {
            kind: Kind::Invalid,
            raw: Cow::Borrowed(&[]),
            key: Cow::Borrowed(&[]),
            children: Vec::new(),
            index: None,
            pooled: false,
        }
    }
}

impl<'a> Value<'a> {
    #[inline]
    fn of_kind(kind: Kind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn null() -> Self {
        Self::of_kind(Kind::Null)
    }

    pub fn bool(b: bool) -> Self {
        Self::of_kind(if b { Kind::True } else { Kind::False })
    }

    /// A string value with the given decoded content.
    pub fn string(s: impl Into<Cow<'a, str>>) -> Self {
        Self::string_bytes(str_bytes(s.into()))
    }

    /// A string value whose decoded content need not be UTF-8.
    pub fn string_bytes(raw: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::of_kind(Kind::String)
        }
    }

    /// A number value with the given literal.
    ///
    /// The literal is written out verbatim by the encoder and is not
    /// validated here, so it can also carry pre-encoded JSON.
    pub fn number(raw: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::of_kind(Kind::Number)
        }
    }

    pub fn from_i64(n: i64) -> Self {
        Self::number(itoa::Buffer::new().format(n).as_bytes().to_vec())
    }

    pub fn from_u64(n: u64) -> Self {
        Self::number(itoa::Buffer::new().format(n).as_bytes().to_vec())
    }

    /// Returns `None` for NaN and infinities, which JSON cannot represent.
    pub fn from_f64(n: f64) -> Option<Self> {
        if !n.is_finite() {
            return None;
        }
        Some(Self::number(ryu::Buffer::new().format_finite(n).as_bytes().to_vec()))
    }

    pub fn array(children: Vec<Value<'a>>) -> Self {
        Self {
            children,
            ..Self::of_kind(Kind::Array)
        }
    }

    /// An object with the given entries, in order.
    ///
    /// # Example
    ///
    /// ```
    /// use na_json::Value;
    ///
    /// let value = Value::object([("a", Value::from_i64(1)), ("b", Value::null())]);
    /// assert_eq!(value.to_string(), r#"{"a":1,"b":null}"#);
    /// ```
    pub fn object<K>(entries: impl IntoIterator<Item = (K, Value<'a>)>) -> Self
    where
        K: Into<Cow<'a, str>>,
    {
        let children = entries
            .into_iter()
            .map(|(key, mut value)| {
                value.key = str_bytes(key.into());
                value
            })
            .collect();
        Self {
            children,
            ..Self::of_kind(Kind::Object)
        }
    }

    pub(crate) fn with_key(key: &'a [u8]) -> Self {
        Self {
            key: Cow::Borrowed(key),
            ..Self::default()
        }
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Decoded string content or the number literal.
    #[inline]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Decoded property name, empty unless this is a child of an object.
    #[inline]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn key_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.key).ok()
    }

    /// Returns the string content if this is a UTF-8 string.
    pub fn as_str(&self) -> Option<&str> {
        match self.kind {
            Kind::String => std::str::from_utf8(&self.raw).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            Kind::True => Some(true),
            Kind::False => Some(false),
            _ => None,
        }
    }

    /// Converts a number literal, `None` if it is not an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        match self.kind {
            Kind::Number => parse_number(&self.raw).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.kind {
            Kind::Number => parse_number(&self.raw).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            Kind::Number => parse_number(&self.raw).ok(),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.kind == Kind::Null
    }

    #[inline]
    pub fn children(&self) -> &[Value<'a>] {
        &self.children
    }

    /// Mutable access to the children.
    ///
    /// Property lookups on a parsed object go through an index of child
    /// positions built during the parse. Reordering, inserting or removing
    /// children through this accessor leaves that index stale, and lookups
    /// may then miss properties that are present.
    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<Value<'a>> {
        &mut self.children
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Value<'a>> {
        self.children.iter()
    }

    /// Iterates over `(key, value)` pairs of an object, in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&[u8], &Value<'a>)> {
        let children: &[Value<'a>] = match self.kind {
            Kind::Object => &self.children,
            _ => &[],
        };
        children.iter().map(|child| (child.key(), child))
    }

    fn position(&self, name: &[u8]) -> Option<usize> {
        if self.kind != Kind::Object {
            return None;
        }
        match &self.index {
            Some(index) => match index.get(name) {
                Some(&pos) => self
                    .children
                    .get(pos)
                    .filter(|child| child.key() == name)
                    .map(|_| pos),
                // the first child is never indexed
                None => self
                    .children
                    .first()
                    .filter(|child| child.key() == name)
                    .map(|_| 0),
            },
            None => self.children.iter().rposition(|child| child.key() == name),
        }
    }

    /// Looks up an object property by its decoded key.
    ///
    /// Matching is exact and case-sensitive. If the key occurs more than
    /// once, the last occurrence in document order wins.
    ///
    /// # Example
    ///
    /// ```
    /// use na_json::parse;
    ///
    /// let mut data = br#"{"a":1,"a":2}"#.to_vec();
    /// let value = parse(&mut data).unwrap();
    /// assert_eq!(value.len(), 2);
    /// assert_eq!(value.property("a").unwrap().raw(), b"2");
    /// ```
    #[inline]
    pub fn property(&self, name: &str) -> Option<&Value<'a>> {
        self.property_bytes(name.as_bytes())
    }

    pub fn property_bytes(&self, name: &[u8]) -> Option<&Value<'a>> {
        self.position(name).map(|pos| &self.children[pos])
    }

    /// Mutable lookup of an object property.
    ///
    /// Assigning a new node through the returned reference also replaces
    /// its key, and the property is then no longer found under `name`. Use
    /// [`replace`](Self::replace) to swap the value in place.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Value<'a>> {
        self.position(name.as_bytes())
            .map(|pos| &mut self.children[pos])
    }

    /// Replaces this node with `value` and returns the old node.
    ///
    /// The object key stays with the position, so a replaced property keeps
    /// being found under its name.
    ///
    /// # Example
    ///
    /// ```
    /// use na_json::{Value, parse};
    ///
    /// let mut data = br#"{"a":1,"b":2}"#.to_vec();
    /// let mut value = parse(&mut data).unwrap();
    /// let old = value.get_mut("b").unwrap().replace(Value::from_i64(3));
    /// assert_eq!(old.raw(), b"2");
    /// assert_eq!(value.to_string(), r#"{"a":1,"b":3}"#);
    /// ```
    pub fn replace(&mut self, mut value: Value<'a>) -> Value<'a> {
        mem::swap(&mut self.key, &mut value.key);
        mem::replace(self, value)
    }

    /// Indexes into an array or object.
    ///
    /// Returns `None` if the index or key does not exist, or if the value is
    /// not a container.
    #[inline]
    pub fn get<I: Index>(&self, index: I) -> Option<&Value<'a>> {
        index.index_into(self)
    }

    /// Mutable counterpart of [`get`](Self::get). See
    /// [`property_mut`](Self::property_mut) on replacing object members.
    #[inline]
    pub fn get_mut<I: Index>(&mut self, index: I) -> Option<&mut Value<'a>> {
        index.index_into_mut(self)
    }

    /// Appends a child, taking storage from `pools`.
    ///
    /// An empty node takes a pooled node array. When a pooled array is full,
    /// its children move into a fresh allocation twice its length and the
    /// emptied array goes back to the pool. Objects index every child from
    /// the second on.
    pub(crate) fn push_child(&mut self, child: Value<'a>, pools: &Pools) -> &mut Value<'a> {
        if self.children.capacity() == 0 {
            self.children = pools.take_node_array();
            self.pooled = true;
        } else if self.pooled && self.children.len() == self.children.capacity() {
            let len = self.children.len();
            let mut grown = Vec::with_capacity(len * 2);
            grown.append(&mut self.children);
            pools.put_node_array(mem::replace(&mut self.children, grown));
            self.pooled = false;
            tracing::trace!(len, "node array exhausted, moving children to the heap");
        }

        let pos = self.children.len();
        if self.kind == Kind::Object && pos > 0 {
            if let Cow::Borrowed(key) = &child.key {
                self.index
                    .get_or_insert_with(|| pools.take_index_map())
                    .insert(*key, pos);
            }
        }
        self.children.push(child);
        &mut self.children[pos]
    }

    /// Returns every pooled node array and index map in this tree to the
    /// global pools.
    ///
    /// Scalars and spans stay valid; only children are released.
    #[inline]
    pub fn recycle(&mut self) {
        self.recycle_into(Pools::global());
    }

    /// Like [`recycle`](Self::recycle), returning storage to `pools`.
    pub fn recycle_into(&mut self, pools: &Pools) {
        for child in &mut self.children {
            child.recycle_into(pools);
        }
        let children = mem::take(&mut self.children);
        if mem::take(&mut self.pooled) {
            pools.put_node_array(children);
        }
        if let Some(index) = self.index.take() {
            pools.put_index_map(index);
        }
    }

    /// Clears this value back to `Kind::Invalid`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// A deep copy that owns all of its bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use na_json::{OwnedValue, parse};
    ///
    /// let owned: OwnedValue = {
    ///     let mut data = br#"["kept"]"#.to_vec();
    ///     let mut value = parse(&mut data).unwrap();
    ///     let owned = value.to_owned_value();
    ///     value.recycle();
    ///     owned
    /// };
    /// assert_eq!(owned[0].as_str(), Some("kept"));
    /// ```
    pub fn to_owned_value(&self) -> OwnedValue {
        Value {
            kind: self.kind,
            raw: Cow::Owned(self.raw.to_vec()),
            key: Cow::Owned(self.key.to_vec()),
            children: self.children.iter().map(Value::to_owned_value).collect(),
            index: None,
            pooled: false,
        }
    }

    pub fn into_owned(self) -> OwnedValue {
        Value {
            kind: self.kind,
            raw: Cow::Owned(self.raw.into_owned()),
            key: Cow::Owned(self.key.into_owned()),
            children: self.children.into_iter().map(Value::into_owned).collect(),
            index: None,
            pooled: false,
        }
    }
}

/// A deep copy that no longer shares node arrays with any pool.
///
/// Spans keep borrowing the input buffer; use
/// [`to_owned_value`](Value::to_owned_value) to outlive it.
impl Clone for Value<'_> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            raw: self.raw.clone(),
            key: self.key.clone(),
            children: self.children.clone(),
            index: None,
            pooled: false,
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.raw == other.raw
            && self.key == other.key
            && self.children == other.children
    }
}

impl Eq for Value<'_> {}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Value");
        s.field("kind", &self.kind);
        if !self.key.is_empty() {
            s.field("key", &String::from_utf8_lossy(&self.key));
        }
        if self.kind.is_scalar() {
            s.field("raw", &String::from_utf8_lossy(&self.raw));
        }
        if self.kind.is_container() {
            s.field("children", &self.children);
        }
        s.finish()
    }
}

/// Compact JSON.
impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_vec().map_err(|_| fmt::Error)?;
        f.write_str(std::str::from_utf8(&bytes).map_err(|_| fmt::Error)?)
    }
}

static NULL: Value<'static> = Value {
    kind: Kind::Null,
    raw: Cow::Borrowed(&[]),
    key: Cow::Borrowed(&[]),
    children: Vec::new(),
    index: None,
    pooled: false,
};

/// Indexing a missing element or a non-container yields `null`.
impl<'a, I: Index> std::ops::Index<I> for Value<'a> {
    type Output = Value<'a>;

    fn index(&self, index: I) -> &Value<'a> {
        self.get(index).unwrap_or(&NULL)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Self::bool(b)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Self::string(s)
    }
}

impl From<i64> for Value<'_> {
    fn from(n: i64) -> Self {
        Self::from_i64(n)
    }
}

impl From<u64> for Value<'_> {
    fn from(n: u64) -> Self {
        Self::from_u64(n)
    }
}

impl<'a> FromIterator<Value<'a>> for Value<'a> {
    fn from_iter<T: IntoIterator<Item = Value<'a>>>(iter: T) -> Self {
        Self::array(iter.into_iter().collect())
    }
}

impl<'v, 'a> IntoIterator for &'v Value<'a> {
    type Item = &'v Value<'a>;
    type IntoIter = slice::Iter<'v, Value<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
