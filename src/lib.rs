mod bind;
mod encoder;
mod error;
mod index;
mod kind;
mod number;
mod options;
mod parser;
mod pool;
#[cfg(feature = "serde")]
pub mod ser;
mod util;
mod value;

pub use bind::*;
pub use encoder::*;
pub use error::*;
pub use index::*;
pub use kind::*;
pub use number::{FromLiteral, parse_number};
pub use options::*;
pub use parser::*;
pub use pool::{PoolStats, Pools, Stats};
#[cfg(feature = "serde")]
pub use ser::{to_string, to_value, to_vec, to_writer};
pub(crate) use util::*;
pub use value::*;
