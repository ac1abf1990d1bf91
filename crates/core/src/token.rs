//! Token identifiers and records.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Opaque token identifier: a fixed-length random byte sequence.
///
/// Serialized as its raw bytes; displayed and parsed as lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(Vec<u8>);

impl TokenId {
    /// Wrap raw id bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse from a hex string.
    pub fn parse_hex(s: &str) -> crate::Result<Self> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| crate::Error::MalformedId(format!("invalid hex id {s:?}: {e}")))
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex encoding of the id, used for URLs and blob directory names.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Length of the id in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the id is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.to_hex())
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A token record: the identifier plus its minting time and the filename
/// bound to it by a completed upload.
///
/// `name` is empty until an upload binds a file. The id and timestamp never
/// change after minting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Token identifier (primary key).
    pub id: TokenId,
    /// When the token was minted.
    #[serde(rename = "t", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Filename bound to this token; empty means no file yet.
    #[serde(default)]
    pub name: String,
}

impl Token {
    /// Mint a fresh, unbound token record.
    pub fn new(id: TokenId, created_at: OffsetDateTime) -> Self {
        Self {
            id,
            created_at,
            name: String::new(),
        }
    }

    /// Whether a file has been bound to this token.
    pub fn bound(&self) -> bool {
        !self.name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_roundtrip() {
        let id = TokenId::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(id.to_hex(), "deadbeef");
        assert_eq!(TokenId::parse_hex("deadbeef").unwrap(), id);
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert!(TokenId::parse_hex("not hex").is_err());
        assert!(TokenId::parse_hex("abc").is_err()); // odd length
    }

    #[test]
    fn new_token_is_unbound() {
        let token = Token::new(
            TokenId::from_bytes(vec![1, 2, 3]),
            OffsetDateTime::now_utc(),
        );
        assert!(!token.bound());
        assert!(token.name.is_empty());
    }
}
