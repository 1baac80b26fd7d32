//! Type-directed projection of a [`Value`] tree onto typed destinations.
//!
//! A destination takes part by implementing [`Bind`]. Which impl a type
//! carries decides how a node reaches it:
//!
//! 1. [`OwnedValue`] receives an owned deep copy of the node.
//! 2. A hand-written `impl Bind` receives the node by reference.
//! 3. [`Text<T>`] receives the decoded string and parses it with [`FromStr`](std::str::FromStr).
//! 4. [`Json<T>`] receives the node re-encoded as JSON text (feature `serde`).
//! 5. Everything else binds structurally: scalars, strings, byte buffers,
//!    sequences, maps, options and [records](Record).
//!
//! # Example
//!
//! ```
//! use na_json::{Fields, Record, bind, bind_record};
//!
//! #[derive(Default)]
//! struct Pipe {
//!     input: String,
//!     output: Vec<String>,
//! }
//!
//! impl Record for Pipe {
//!     fn describe(fields: &mut Fields<Self>) {
//!         fields.field("input", |p| &mut p.input).rename("In");
//!         fields.field("output", |p| &mut p.output).rename("Out");
//!     }
//! }
//!
//! bind_record!(Pipe);
//!
//! let mut pipe = Pipe::default();
//! bind(br#"{"In":"jq .","Out":["less","tee log"]}"#, &mut pipe).unwrap();
//! assert_eq!(pipe.input, "jq .");
//! assert_eq!(pipe.output, ["less", "tee log"]);
//! ```

use crate::{BindOptions, Parser, Pools, Result, Value};

mod buffers;
mod capability;
mod schema;

pub use capability::*;
pub use schema::*;

/// A destination a [`Value`] can be bound into.
///
/// Implementing this trait by hand is the fastest way in: the node is passed
/// by reference and must not be retained past the call.
///
/// # Example
///
/// ```
/// use na_json::{Bind, Binder, Error, Kind, Result, Value, bind};
///
/// /// Counts the elements of an array without materializing them.
/// #[derive(Default)]
/// struct Count(usize);
///
/// impl Bind for Count {
///     fn bind(&mut self, value: &Value<'_>, _binder: &Binder<'_>) -> Result<()> {
///         match value.kind() {
///             Kind::Array => {
///                 self.0 = value.len();
///                 Ok(())
///             }
///             kind => Err(Error::InvalidValue(kind.as_str())),
///         }
///     }
/// }
///
/// let mut count = Count::default();
/// bind(b"[1,[2,3],{}]", &mut count).unwrap();
/// assert_eq!(count.0, 3);
/// ```
pub trait Bind {
    fn bind(&mut self, value: &Value<'_>, binder: &Binder<'_>) -> Result<()>;
}

/// Binding context: the schema cache and pools in use, plus per-field flags.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'c> {
    cache: &'c SchemaCache,
    pools: &'c Pools,
    options: BindOptions,
    string_encoded: bool,
}

impl Binder<'static> {
    /// A binder over the global schema cache and pools.
    pub fn global() -> Self {
        Self::new(SchemaCache::global(), Pools::global())
    }
}

impl Default for Binder<'static> {
    fn default() -> Self {
        Self::global()
    }
}

impl<'c> Binder<'c> {
    pub fn new(cache: &'c SchemaCache, pools: &'c Pools) -> Self {
        Self {
            cache,
            pools,
            options: BindOptions::default(),
            string_encoded: false,
        }
    }

    pub fn options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn cache(&self) -> &'c SchemaCache {
        self.cache
    }

    #[inline]
    pub fn pools(&self) -> &'c Pools {
        self.pools
    }

    /// Whether the field being bound is marked string-encoded, so numbers
    /// and booleans are also read from JSON strings.
    #[inline]
    pub fn string_encoded(&self) -> bool {
        self.string_encoded
    }

    #[inline]
    pub fn with_string_encoded(&self, string_encoded: bool) -> Self {
        Self {
            string_encoded,
            ..*self
        }
    }

    /// Parses a copy of `input` and binds it into `target`.
    ///
    /// The copy lives in a pooled buffer, so `input` is left untouched.
    ///
    /// # Errors
    ///
    /// - any error of [`Parser::parse`]
    /// - [`Error::InvalidMapping`](crate::Error::InvalidMapping) if a node
    ///   does not fit its destination
    /// - [`Error::Overflow`](crate::Error::Overflow) if a number does not fit
    ///   its destination
    pub fn bind<T: Bind + ?Sized>(&self, input: &[u8], target: &mut T) -> Result<()> {
        let mut buffer = self.pools.take_buffer();
        buffer.extend_from_slice(input);
        let result = self.bind_in_place(&mut buffer, target);
        self.pools.put_buffer(buffer);
        result
    }

    /// Like [`bind`](Self::bind) without the copy: strings are unescaped in
    /// `input` itself, which must not be used as JSON afterwards.
    pub fn bind_in_place<T: Bind + ?Sized>(&self, input: &mut [u8], target: &mut T) -> Result<()> {
        let parser = Parser::with_pools(self.pools).options(self.options.parse);
        let mut value = parser.parse(input)?;
        let result = target.bind(&value, self);
        value.recycle_into(self.pools);
        result
    }

    /// Binds an already parsed tree.
    #[inline]
    pub fn bind_value<T: Bind + ?Sized>(&self, value: &Value<'_>, target: &mut T) -> Result<()> {
        target.bind(value, self)
    }
}

/// Parses `input` and binds it into `target` using the global binder.
#[inline]
pub fn bind<T: Bind + ?Sized>(input: &[u8], target: &mut T) -> Result<()> {
    Binder::global().bind(input, target)
}

/// Parses `input` in place and binds it into `target` using the global binder.
#[inline]
pub fn bind_in_place<T: Bind + ?Sized>(input: &mut [u8], target: &mut T) -> Result<()> {
    Binder::global().bind_in_place(input, target)
}
