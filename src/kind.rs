/// The kind of JSON construct a [`Value`](crate::Value) represents.
///
/// The kind determines which other fields of a value are meaningful:
/// `String` and `Number` carry raw bytes, `Object` and `Array` carry children,
/// and the literal kinds carry no payload.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum Kind {
    /// A cleared or not yet populated value.
    #[default]
    Invalid = 0,
    String = 1,
    Number = 2,
    Object = 3,
    Array = 4,
    True = 5,
    False = 6,
    Null = 7,
}

impl Kind {
    /// Returns the lowercase name used in error messages.
    ///
    /// # Example
    ///
    /// ```
    /// use na_json::Kind;
    ///
    /// assert_eq!(Kind::Object.as_str(), "object");
    /// assert_eq!(Kind::Invalid.as_str(), "value");
    /// ```
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "value",
            Self::String => "string",
            Self::Number => "number",
            Self::Object => "object",
            Self::Array => "array",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
        }
    }

    /// Returns `true` for kinds whose payload lives in `raw`.
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::String | Self::Number)
    }

    /// Returns `true` for kinds whose payload lives in `children`.
    ///
    /// # Example
    ///
    /// ```
    /// use na_json::Kind;
    ///
    /// assert!(Kind::Array.is_container());
    /// assert!(Kind::Object.is_container());
    /// assert!(!Kind::String.is_container());
    /// ```
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Object | Self::Array)
    }

    pub const fn is_bool(self) -> bool {
        matches!(self, Self::True | Self::False)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
