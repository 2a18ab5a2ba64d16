//! XML utilities: namespace-agnostic lookup and exclusive canonicalization.

pub mod c14n;
pub mod find;
