//! Wire codec for token records and token lists.
//!
//! The same encoding serves two purposes: the value bytes persisted in the
//! token store, and the response bodies handed to clients. A token encodes
//! to `{ "id": <bytes>, "t": <rfc3339>, "name": <string> }`; a list encodes
//! to an ordered sequence of such objects. Decoding rejects malformed input;
//! the only defaulted field is an absent `name`, which decodes to `""`.

use crate::error::{Error, Result};
use crate::token::Token;

/// Encode a single token record.
pub fn encode(token: &Token) -> Result<Vec<u8>> {
    serde_json::to_vec(token).map_err(|e| Error::Codec(format!("encode token: {e}")))
}

/// Decode a single token record.
pub fn decode(bytes: &[u8]) -> Result<Token> {
    serde_json::from_slice(bytes).map_err(|e| Error::Codec(format!("decode token: {e}")))
}

/// Encode an ordered sequence of tokens.
pub fn encode_list(tokens: &[Token]) -> Result<Vec<u8>> {
    serde_json::to_vec(tokens).map_err(|e| Error::Codec(format!("encode token list: {e}")))
}

/// Decode an ordered sequence of tokens.
pub fn decode_list(bytes: &[u8]) -> Result<Vec<Token>> {
    serde_json::from_slice(bytes).map_err(|e| Error::Codec(format!("decode token list: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenId;
    use time::macros::datetime;

    fn sample(id: &[u8], name: &str) -> Token {
        Token {
            id: TokenId::from_bytes(id.to_vec()),
            created_at: datetime!(2024-05-01 12:00:00 UTC),
            name: name.to_string(),
        }
    }

    #[test]
    fn single_roundtrip() {
        let token = sample(&[1, 2, 3, 4], "report.pdf");
        let decoded = decode(&encode(&token).unwrap()).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn list_roundtrip_preserves_order() {
        let tokens = vec![sample(&[0xff], ""), sample(&[0x00], "a"), sample(&[0x7f], "b")];
        let decoded = decode_list(&encode_list(&tokens).unwrap()).unwrap();
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn absent_name_decodes_to_empty() {
        let bytes = br#"{"id":[9,9],"t":"2024-05-01T12:00:00Z"}"#;
        let token = decode(bytes).unwrap();
        assert_eq!(token.name, "");
        assert!(!token.bound());
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(decode(b"not json").is_err());
        // Missing required fields must not be guessed.
        assert!(decode(br#"{"name":"x"}"#).is_err());
        assert!(decode_list(br#"{"id":[1]}"#).is_err());
    }
}
