//! Core domain types and shared logic for tokendrop.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Token identifiers and records
//! - The wire codec for single tokens and token lists
//! - Shared configuration types

pub mod codec;
pub mod config;
pub mod error;
pub mod token;

pub use error::{Error, Result};
pub use token::{Token, TokenId};

/// Default token id size: 16 bytes (128 bits).
pub const DEFAULT_ID_SIZE: usize = 16;

/// Literal body returned by the single-token endpoint for an unknown id.
/// Clients match on this exact text, so it is part of the wire contract.
pub const NO_SUCH_TOKEN: &str = "no such token";
