use std::{
    any::{Any, TypeId, type_name},
    collections::{HashMap, hash_map::Entry},
    fmt,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::RwLock;

use crate::{Bind, Binder, Error, Kind, Result, Value, cold_path};

type Accessor<T> = Arc<dyn (Fn(&mut T) -> &mut dyn Bind) + Send + Sync>;

#[inline]
fn accessor<T, G>(get: G) -> Accessor<T>
where
    G: Fn(&mut T) -> &mut dyn Bind,
    G: Send + Sync + 'static,
{
    Arc::new(get)
}

/// A structured destination bound from a JSON object, property by property.
///
/// `describe` lists the fields once; the resulting [`Schema`] is cached per
/// type in a [`SchemaCache`]. Pair the impl with [`bind_record!`](crate::bind_record)
/// to make the type a [`Bind`] destination.
///
/// Matching of property names is exact and case-sensitive. Properties
/// without a field are ignored, and fields without a property keep their
/// value.
///
/// # Example
///
/// ```
/// use na_json::{Fields, Record, bind, bind_record};
///
/// #[derive(Default)]
/// struct Meta {
///     id: u64,
///     tag: String,
/// }
///
/// #[derive(Default)]
/// struct Event {
///     name: String,
///     meta: Meta,
///     scratch: String,
/// }
///
/// impl Record for Meta {
///     fn describe(fields: &mut Fields<Self>) {
///         fields.field("id", |m| &mut m.id).string();
///         fields.field("tag", |m| &mut m.tag);
///     }
/// }
///
/// impl Record for Event {
///     fn describe(fields: &mut Fields<Self>) {
///         fields.field("name", |e| &mut e.name).rename("Name");
///         fields.embed(|e| &mut e.meta);
///         fields.field("scratch", |e| &mut e.scratch).skip();
///     }
/// }
///
/// bind_record!(Meta, Event);
///
/// let mut event = Event::default();
/// bind(br#"{"Name":"open","id":"42","tag":"io","scratch":"x"}"#, &mut event).unwrap();
/// assert_eq!(event.name, "open");
/// assert_eq!(event.meta.id, 42);
/// assert_eq!(event.meta.tag, "io");
/// assert!(event.scratch.is_empty());
/// ```
pub trait Record: Sized + 'static {
    fn describe(fields: &mut Fields<Self>);
}

struct Field<T> {
    name: &'static str,
    property: &'static str,
    string: bool,
    skip: bool,
    /// Number of embeddings the field was promoted through.
    depth: usize,
    accessor: Accessor<T>,
}

/// The field list a [`Record`] fills in.
pub struct Fields<T> {
    fields: Vec<Field<T>>,
}

impl<T: 'static> Fields<T> {
    fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declares a field. Its property name is `name` unless renamed.
    pub fn field<F, G>(&mut self, name: &'static str, get: G) -> FieldBuilder<'_, T>
    where
        F: Bind + 'static,
        G: Fn(&mut T) -> &mut F,
        G: Send + Sync + 'static,
    {
        let index = self.fields.len();
        self.fields.push(Field {
            name,
            property: name,
            string: false,
            skip: false,
            depth: 0,
            accessor: accessor(move |target| get(target) as &mut dyn Bind),
        });
        FieldBuilder {
            fields: self,
            index,
        }
    }

    /// Promotes every field of an embedded record into this one.
    ///
    /// A promoted field is shadowed by a field of the same property name
    /// that is embedded less deeply, including fields declared directly on
    /// this record. Among fields at the same depth the first declared wins.
    pub fn embed<E, G>(&mut self, get: G) -> &mut Self
    where
        E: Record,
        G: Fn(&mut T) -> &mut E,
        G: Send + Sync + 'static,
    {
        let mut inner = Fields::<E>::new();
        E::describe(&mut inner);

        let outer = Arc::new(get);
        for field in inner.fields {
            let outer = Arc::clone(&outer);
            let Field {
                name,
                property,
                string,
                skip,
                depth,
                accessor: inner_accessor,
            } = field;
            self.fields.push(Field {
                name,
                property,
                string,
                skip,
                depth: depth + 1,
                accessor: accessor(move |target| (*inner_accessor)((*outer)(target))),
            });
        }
        self
    }
}

/// Adjusts the field just declared with [`Fields::field`].
pub struct FieldBuilder<'f, T> {
    fields: &'f mut Fields<T>,
    index: usize,
}

impl<T> FieldBuilder<'_, T> {
    #[inline]
    fn get(&mut self) -> &mut Field<T> {
        &mut self.fields.fields[self.index]
    }

    /// Binds the field from the property `property` instead of its name.
    pub fn rename(mut self, property: &'static str) -> Self {
        self.get().property = property;
        self
    }

    /// Numbers and booleans of this field may arrive as JSON strings, such
    /// as `"42"` or `"true"`.
    pub fn string(mut self) -> Self {
        self.get().string = true;
        self
    }

    /// Never binds this field.
    pub fn skip(mut self) -> Self {
        self.get().skip = true;
        self
    }
}

/// The resolved property-to-field mapping of one record type.
pub struct Schema<T> {
    fields: Vec<Field<T>>,
    by_property: HashMap<&'static [u8], usize>,
}

impl<T: Record> Schema<T> {
    fn resolve() -> Self {
        let mut fields = Fields::new();
        T::describe(&mut fields);
        let fields = fields.fields;

        let mut by_property = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if field.skip {
                continue;
            }
            match by_property.entry(field.property.as_bytes()) {
                Entry::Vacant(entry) => {
                    entry.insert(i);
                }
                Entry::Occupied(mut entry) => {
                    if field.depth < fields[*entry.get()].depth {
                        entry.insert(i);
                    }
                }
            }
        }

        Self {
            fields,
            by_property,
        }
    }

    /// Number of properties that bind a field.
    pub fn len(&self) -> usize {
        self.by_property.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_property.is_empty()
    }

    /// The field name bound from `property`, if any.
    pub fn field_for(&self, property: &str) -> Option<&'static str> {
        self.by_property
            .get(property.as_bytes())
            .map(|&i| self.fields[i].name)
    }

    /// Binds every property of `value` that maps to a field. With duplicate
    /// properties the last one is bound last.
    pub fn bind(&self, target: &mut T, value: &Value<'_>, binder: &Binder<'_>) -> Result<()> {
        for (key, child) in value.entries() {
            let Some(&i) = self.by_property.get(key) else {
                continue;
            };
            let field = &self.fields[i];
            let binder = binder.with_string_encoded(field.string);
            (*field.accessor)(target).bind(child, &binder)?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut properties: Vec<_> = self
            .by_property
            .iter()
            .map(|(property, &i)| (i, String::from_utf8_lossy(property)))
            .collect();
        properties.sort_unstable();
        f.debug_list()
            .entries(properties.into_iter().map(|(_, property)| property))
            .finish()
    }
}

static GLOBAL: LazyLock<SchemaCache> = LazyLock::new(SchemaCache::new);

/// Resolved [`Schema`]s, one per record type.
///
/// Lookups take a read lock. A miss takes the write lock and looks again
/// before resolving, so racing binders resolve each type once.
///
/// # Example
///
/// ```
/// use na_json::{Binder, Fields, Pools, Record, SchemaCache, bind_record};
///
/// #[derive(Default)]
/// struct Ping {
///     seq: u32,
/// }
///
/// impl Record for Ping {
///     fn describe(fields: &mut Fields<Self>) {
///         fields.field("seq", |p| &mut p.seq);
///     }
/// }
///
/// bind_record!(Ping);
///
/// let cache = SchemaCache::new();
/// let pools = Pools::default();
/// let binder = Binder::new(&cache, &pools);
///
/// let mut ping = Ping::default();
/// binder.bind(br#"{"seq":1}"#, &mut ping).unwrap();
/// binder.bind(br#"{"seq":2}"#, &mut ping).unwrap();
///
/// assert_eq!(ping.seq, 2);
/// assert_eq!((cache.misses(), cache.hits()), (1, 1));
/// ```
pub struct SchemaCache {
    schemas: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCache")
            .field("len", &self.len())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

impl SchemaCache {
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// The process-wide cache, created on first use.
    #[inline]
    pub fn global() -> &'static SchemaCache {
        &GLOBAL
    }

    /// Returns the schema of `T`, resolving it on first use.
    pub fn schema<T: Record>(&self) -> Arc<Schema<T>> {
        let id = TypeId::of::<T>();
        if let Some(schema) = Self::lookup::<T>(&self.schemas.read(), id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return schema;
        }

        cold_path();
        let mut schemas = self.schemas.write();
        if let Some(schema) = Self::lookup::<T>(&schemas, id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return schema;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let schema = Arc::new(Schema::<T>::resolve());
        tracing::debug!(
            record = type_name::<T>(),
            properties = schema.len(),
            "resolved record schema"
        );
        schemas.insert(id, Box::new(Arc::clone(&schema)));
        schema
    }

    #[inline]
    fn lookup<T: Record>(
        schemas: &HashMap<TypeId, Box<dyn Any + Send + Sync>>,
        id: TypeId,
    ) -> Option<Arc<Schema<T>>> {
        schemas
            .get(&id)
            .and_then(|schema| schema.downcast_ref::<Arc<Schema<T>>>())
            .cloned()
    }

    /// Number of cached record types.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drops every cached schema.
    pub fn clear(&self) {
        self.schemas.write().clear();
    }
}

/// Binds an object into a record through the binder's schema cache.
///
/// `null` leaves the record as it is. This is what [`bind_record!`](crate::bind_record)
/// expands to.
pub fn bind_fields<T: Record>(target: &mut T, value: &Value<'_>, binder: &Binder<'_>) -> Result<()> {
    match value.kind() {
        Kind::Object => binder.cache().schema::<T>().bind(target, value, binder),
        Kind::Null => Ok(()),
        kind => {
            cold_path();
            Err(Error::invalid_mapping(kind, type_name::<T>()))
        }
    }
}

/// Implements [`Bind`](crate::Bind) for [`Record`](crate::Record) types.
///
/// ```
/// use na_json::{Fields, Record, bind_record};
///
/// #[derive(Default)]
/// struct Empty;
///
/// impl Record for Empty {
///     fn describe(_: &mut Fields<Self>) {}
/// }
///
/// bind_record!(Empty);
/// ```
#[macro_export]
macro_rules! bind_record {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Bind for $ty {
            #[inline]
            fn bind(
                &mut self,
                value: &$crate::Value<'_>,
                binder: &$crate::Binder<'_>,
            ) -> $crate::Result<()> {
                $crate::bind_fields(self, value, binder)
            }
        }
    )+};
}
