//! Filesystem blob storage for tokendrop.
//!
//! This crate stores the bytes of uploaded files, one directory per token
//! (named by the hex id) with files named by their original filename. It
//! knows nothing about the token store; it is pure path-addressed storage
//! with an explicit overwrite-on-write policy.

pub mod error;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use store::{BlobStore, BlobWriter, ByteStream};
