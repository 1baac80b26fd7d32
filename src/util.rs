#[inline(always)]
#[cold]
pub(crate) fn cold_path() {}

/// The four whitespace bytes JSON allows between tokens.
#[inline(always)]
pub(crate) const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}
