//! Durable token store for tokendrop.
//!
//! This crate owns all token persistence: a single redb table keyed by raw
//! token id bytes, with values holding the wire-encoded record. redb gives
//! the store one writer at a time, snapshot reads, and iteration in raw
//! key-byte order.

pub mod error;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use store::TokenStore;
