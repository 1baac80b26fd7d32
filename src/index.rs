use crate::Value;

mod private {
    pub trait Sealed {}
    impl Sealed for usize {}
    impl Sealed for str {}
    impl Sealed for String {}
    impl<T> Sealed for &T where T: ?Sized + Sealed {}
}

/// A position or a property name usable with [`Value::get`].
///
/// `usize` selects a child by position in an array or object; `str` and
/// `String` select an object property by its decoded key.
pub trait Index: private::Sealed {
    #[doc(hidden)]
    fn index_into<'v, 'a>(&self, value: &'v Value<'a>) -> Option<&'v Value<'a>>;

    #[doc(hidden)]
    fn index_into_mut<'v, 'a>(&self, value: &'v mut Value<'a>) -> Option<&'v mut Value<'a>>;
}

impl Index for usize {
    #[inline]
    fn index_into<'v, 'a>(&self, value: &'v Value<'a>) -> Option<&'v Value<'a>> {
        if !value.kind().is_container() {
            return None;
        }
        value.children().get(*self)
    }

    #[inline]
    fn index_into_mut<'v, 'a>(&self, value: &'v mut Value<'a>) -> Option<&'v mut Value<'a>> {
        if !value.kind().is_container() {
            return None;
        }
        value.children.get_mut(*self)
    }
}

impl Index for str {
    #[inline]
    fn index_into<'v, 'a>(&self, value: &'v Value<'a>) -> Option<&'v Value<'a>> {
        value.property(self)
    }

    #[inline]
    fn index_into_mut<'v, 'a>(&self, value: &'v mut Value<'a>) -> Option<&'v mut Value<'a>> {
        value.property_mut(self)
    }
}

impl Index for String {
    #[inline]
    fn index_into<'v, 'a>(&self, value: &'v Value<'a>) -> Option<&'v Value<'a>> {
        value.property(self.as_str())
    }

    #[inline]
    fn index_into_mut<'v, 'a>(&self, value: &'v mut Value<'a>) -> Option<&'v mut Value<'a>> {
        value.property_mut(self.as_str())
    }
}

impl<T: ?Sized + Index> Index for &T {
    #[inline]
    fn index_into<'v, 'a>(&self, value: &'v Value<'a>) -> Option<&'v Value<'a>> {
        (**self).index_into(value)
    }

    #[inline]
    fn index_into_mut<'v, 'a>(&self, value: &'v mut Value<'a>) -> Option<&'v mut Value<'a>> {
        (**self).index_into_mut(value)
    }
}
