#![cfg(feature = "bytes")]

use bytes::{Bytes, BytesMut};

use super::capability::byte_source;
use crate::{Bind, Binder, Result, Value};

/// Copies the raw bytes of a string or number.
impl Bind for Bytes {
    fn bind(&mut self, value: &Value<'_>, _binder: &Binder<'_>) -> Result<()> {
        if let Some(raw) = byte_source(value, "Bytes")? {
            *self = Bytes::copy_from_slice(raw);
        }
        Ok(())
    }
}

/// Reuses the buffer's capacity where possible.
impl Bind for BytesMut {
    fn bind(&mut self, value: &Value<'_>, _binder: &Binder<'_>) -> Result<()> {
        if let Some(raw) = byte_source(value, "BytesMut")? {
            self.clear();
            self.extend_from_slice(raw);
        }
        Ok(())
    }
}
