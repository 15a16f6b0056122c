//! Background work owned by the composition root rather than the cache.

pub(crate) mod health;
