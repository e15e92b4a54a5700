//! Concurrency limit parsing

use std::num::NonZeroUsize;

use crate::{Error, Result};

/// Parse the `<max-concurrency>` argument.
///
/// Accepts a base-10 integer that fits in 32 signed bits, with an optional
/// sign. Zero and negative values are rejected separately from values that
/// do not parse at all, so callers can report distinct exit codes.
pub fn parse_limit(raw: &str) -> Result<NonZeroUsize> {
    let limit: i32 = raw.parse()?;
    if limit <= 0 {
        return Err(Error::NonPositiveLimit(i64::from(limit)));
    }
    usize::try_from(limit)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or(Error::NonPositiveLimit(i64::from(limit)))
}
