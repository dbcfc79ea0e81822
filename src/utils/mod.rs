//! Shared helpers: paths, atomic writes, pluralization.

pub mod path;
pub mod plural;
pub mod write;

#[cfg(test)]
pub(crate) mod testutil;
