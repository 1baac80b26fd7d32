//! Error types for JSON parsing, encoding and binding.
//!
//! This module contains the [`Error`] type which represents all possible errors
//! that can occur when reading, writing or binding JSON data.
//!
//! # Example
//!
//! ```
//! use na_json::{parse, Error};
//!
//! let mut data = br#"[1 1]"#.to_vec();
//! match parse(&mut data) {
//!     Err(Error::Parse(e)) => {
//!         assert_eq!(e.pos, 3);
//!         assert_eq!(e.byte, b'1');
//!     }
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```

use std::fmt::{self, Display};

use crate::Kind;

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// This type represents all possible errors that can occur when parsing,
/// encoding or binding JSON data.
///
/// Every error is returned to the immediate caller; the library never logs
/// or swallows them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `parse` was given zero bytes.
    #[error("cannot parse empty input")]
    EmptyInput,

    /// Malformed input at a specific byte offset.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A well-formed value followed by non-whitespace bytes.
    #[error(transparent)]
    Leftover(#[from] LeftoverError),

    /// A value's kind cannot be projected onto the binding target.
    #[error(transparent)]
    InvalidMapping(#[from] InvalidMapping),

    /// A numeric literal does not fit the destination type.
    #[error(transparent)]
    Overflow(#[from] Overflow),

    /// Numeric text that is not a number of the requested flavour, such as
    /// `1.5` bound into an integer or the string-encoded `"abc"`.
    #[error("invalid {target} literal: {literal}")]
    InvalidNumber { literal: String, target: &'static str },

    /// Decoded string content bound into `String` is not UTF-8.
    #[error("invalid utf-8 in string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The tree contains a node that has no JSON representation.
    #[error("cannot encode invalid value: {0}")]
    InvalidValue(&'static str),

    /// The output sink failed.
    ///
    /// This typically happens when writing to a [`std::io::Write`]
    /// implementation that encounters an error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Map key must be a string type.
    ///
    /// JSON object keys are strings. Integer and char keys are quoted; any
    /// other key type is rejected.
    #[error("map key must be a string")]
    KeyMustBeString,

    /// NaN and infinities have no JSON representation.
    #[error("cannot encode a non-finite float")]
    NonFiniteFloat,

    /// A `FromStr` failure reported by a text-capable target.
    #[error("text decode failed: {0}")]
    Text(String),

    /// A failure reported by a JSON-text capable target.
    #[error("json decode failed: {0}")]
    Json(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("{0}")]
    Message(String),
}

/// A structured parse failure.
///
/// Carries the construct being parsed when the failure occurred, the absolute
/// byte offset, the offending byte and a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: Kind,
    pub pos: usize,
    pub byte: u8,
    pub reason: &'static str,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error while parsing {} at pos {} ({:?}): {}",
            self.kind.as_str(),
            self.pos,
            self.byte as char,
            self.reason
        )
    }
}

impl std::error::Error for ParseError {}

/// The bytes that followed a complete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeftoverError(pub Vec<u8>);

impl LeftoverError {
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Display for LeftoverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} leftover bytes after value", self.0.len())
    }
}

impl std::error::Error for LeftoverError {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mapping of JSON {} to {to}", from.as_str())]
pub struct InvalidMapping {
    pub from: Kind,
    pub to: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("number {literal} overflows {target}")]
pub struct Overflow {
    pub literal: String,
    pub target: &'static str,
}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Error {
    #[cold]
    pub(crate) fn invalid_mapping(from: Kind, to: &'static str) -> Self {
        Error::InvalidMapping(InvalidMapping { from, to })
    }

    #[cold]
    pub(crate) fn overflow(literal: &[u8], target: &'static str) -> Self {
        Error::Overflow(Overflow {
            literal: String::from_utf8_lossy(literal).into_owned(),
            target,
        })
    }

    #[cold]
    pub(crate) fn invalid_number(literal: &[u8], target: &'static str) -> Self {
        Error::InvalidNumber {
            literal: String::from_utf8_lossy(literal).into_owned(),
            target,
        }
    }

    /// Returns the parse error if this is one.
    #[inline]
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}
