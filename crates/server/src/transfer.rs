//! Orchestration between token metadata and blob content.
//!
//! The coordinator owns the two-phase upload protocol: a token must already
//! exist before any content is accepted, content is made durable before the
//! token record is updated, and a token only becomes downloadable once its
//! `name` field is bound. A crash between the blob commit and the metadata
//! update leaves an orphan blob but never a token pointing at missing data.

use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokendrop_core::{codec, Token, TokenId};
use tokendrop_metadata::{MetadataError, TokenStore};
use tokendrop_storage::{BlobStore, ByteStream, StorageError};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("malformed token id: {0}")]
    MalformedId(String),

    #[error("no such token: {0}")]
    UnknownToken(String),

    #[error("no file bound to token: {0}")]
    NoFileBound(String),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Codec(#[from] tokendrop_core::Error),
}

pub type TransferResult<T> = Result<T, TransferError>;

/// Mediates every operation that touches both the token store and the blob
/// store. Shared across request handlers behind an `Arc`.
pub struct TransferCoordinator {
    tokens: Arc<TokenStore>,
    blobs: Arc<BlobStore>,
    id_size: usize,
}

impl TransferCoordinator {
    pub fn new(tokens: Arc<TokenStore>, blobs: Arc<BlobStore>, id_size: usize) -> Self {
        Self {
            tokens,
            blobs,
            id_size,
        }
    }

    /// Mints a fresh unbound token and persists it.
    pub async fn create_token(&self) -> TransferResult<Token> {
        let token = self.tokens.generate(self.id_size).await?;
        tracing::info!(token = %token.id, "token created");
        Ok(token)
    }

    /// Receives file content for an existing token.
    ///
    /// The token is looked up before the first byte is written so that an
    /// invalid id never creates anything on disk. On any stream or write
    /// error the partially written temp file is discarded.
    pub async fn upload<S>(&self, id_hex: &str, filename: &str, stream: S) -> TransferResult<u64>
    where
        S: Stream<Item = std::io::Result<Bytes>>,
    {
        let id = parse_id(id_hex)?;
        if self.tokens.get(&id).await?.is_none() {
            return Err(TransferError::UnknownToken(id.to_hex()));
        }

        let dir = id.to_hex();
        let mut writer = self.blobs.writer(&dir, filename).await?;

        futures::pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    writer.abort().await;
                    return Err(StorageError::Io(e).into());
                }
            };
            if let Err(e) = writer.write(chunk).await {
                writer.abort().await;
                return Err(e.into());
            }
        }
        let written = writer.finish().await?;

        // Content is durable at this point; only now may the token record
        // make it discoverable.
        self.tokens.update(&id, filename).await?;

        tracing::info!(token = %id, filename, bytes = written, "file bound to token");
        Ok(written)
    }

    /// Resolves a token to its stored content.
    ///
    /// Fails for unknown tokens and for tokens that were created but never
    /// had a file bound to them.
    pub async fn download(&self, id_hex: &str) -> TransferResult<(ByteStream, String)> {
        let id = parse_id(id_hex)?;
        let token = self
            .tokens
            .get(&id)
            .await?
            .ok_or_else(|| TransferError::UnknownToken(id.to_hex()))?;
        if !token.bound() {
            return Err(TransferError::NoFileBound(id.to_hex()));
        }

        let stream = self.blobs.read(&id.to_hex(), &token.name).await?;
        tracing::debug!(token = %id, filename = %token.name, "download started");
        Ok((stream, token.name))
    }

    /// All known tokens, encoded for the wire.
    pub async fn list(&self) -> TransferResult<Vec<u8>> {
        let tokens = self.tokens.list().await?;
        Ok(codec::encode_list(&tokens)?)
    }

    /// The raw stored record for one token.
    pub async fn single(&self, id_hex: &str) -> TransferResult<Vec<u8>> {
        let id = parse_id(id_hex)?;
        Ok(self.tokens.serialized_single(&id).await?)
    }
}

fn parse_id(id_hex: &str) -> TransferResult<TokenId> {
    TokenId::parse_hex(id_hex).map_err(|e| TransferError::MalformedId(e.to_string()))
}
