//! The redb-backed token store.

use crate::error::{MetadataError, MetadataResult};
use rand::rngs::OsRng;
use rand::TryRngCore;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;
use tokendrop_core::{codec, Token, TokenId};

/// The single logical namespace holding all token records, keyed by raw id
/// bytes. Key order is byte order, which is the order `list` observes.
const TOKENS_TABLE: TableDefinition<'static, &'static [u8], &'static [u8]> =
    TableDefinition::new("tokens");

/// Durable mapping from token id to wire-encoded token record.
///
/// redb transactions are synchronous, so every database access runs on the
/// blocking thread pool. Mutations go through a serialized write transaction;
/// reads observe a consistent snapshot that may trail an in-flight write.
#[derive(Clone)]
pub struct TokenStore {
    db: Arc<Database>,
}

impl TokenStore {
    /// Open (or create) the store at `path` and ensure the token table
    /// exists. Safe to call on every startup.
    pub fn open(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path)?;

        // Opening the table inside a committed write transaction is the
        // idempotent "create bucket if not exists" step; without it the
        // first read-only transaction would fail on a missing table.
        let txn = db.begin_write()?;
        txn.open_table(TOKENS_TABLE)?;
        txn.commit()?;

        tracing::debug!(path = %path.display(), "token store opened");

        Ok(Self { db: Arc::new(db) })
    }

    /// Mint a token: `id_size` bytes from the OS entropy source, stamped
    /// with the current time, persisted before it is returned. A token that
    /// was not persisted never existed from the caller's point of view.
    ///
    /// There is no existence check before the insert; id uniqueness is
    /// probabilistic and accepted as such at 128-bit ids.
    pub async fn generate(&self, id_size: usize) -> MetadataResult<Token> {
        if id_size == 0 {
            return Err(MetadataError::InvalidIdSize);
        }

        let mut buf = vec![0u8; id_size];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| MetadataError::RandomSource(e.to_string()))?;

        let token = Token::new(TokenId::from_bytes(buf), OffsetDateTime::now_utc());
        self.insert(&token).await?;
        Ok(token)
    }

    /// Persist a token record, overwriting any record with the same id.
    pub async fn insert(&self, token: &Token) -> MetadataResult<()> {
        let encoded = codec::encode(token)?;
        let key = token.id.as_bytes().to_vec();
        let db = self.db.clone();

        run_blocking(move || {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(TOKENS_TABLE)?;
                table.insert(key.as_slice(), encoded.as_slice())?;
            }
            txn.commit()?;
            Ok(())
        })
        .await
    }

    /// Point lookup. An absent id is `None`, not an error.
    pub async fn get(&self, id: &TokenId) -> MetadataResult<Option<Token>> {
        let raw = self.raw_get(id).await?;
        match raw {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Bind `name` to an existing token via read-modify-write inside a
    /// single write transaction (atomic against other writers). Fails with
    /// `NoSuchToken` if the id was never generated; it must not insert.
    pub async fn update(&self, id: &TokenId, name: &str) -> MetadataResult<Token> {
        let key = id.as_bytes().to_vec();
        let name = name.to_string();
        let db = self.db.clone();

        run_blocking(move || {
            let txn = db.begin_write()?;
            let updated;
            {
                let mut table = txn.open_table(TOKENS_TABLE)?;
                let existing = table.get(key.as_slice())?.map(|v| v.value().to_vec());
                let bytes = match existing {
                    Some(bytes) => bytes,
                    // Dropping the transaction aborts it; the store stays
                    // unchanged.
                    None => return Err(MetadataError::NoSuchToken(hex::encode(&key))),
                };

                let mut token = codec::decode(&bytes)?;
                token.name = name;
                let encoded = codec::encode(&token)?;
                table.insert(key.as_slice(), encoded.as_slice())?;
                updated = token;
            }
            txn.commit()?;
            Ok(updated)
        })
        .await
    }

    /// All records, in ascending raw id byte order. This is the table's
    /// iteration order, not creation order, and callers may rely on it.
    pub async fn list(&self) -> MetadataResult<Vec<Token>> {
        let db = self.db.clone();

        run_blocking(move || {
            let txn = db.begin_read()?;
            let table = txn.open_table(TOKENS_TABLE)?;
            let mut tokens = Vec::new();
            for entry in table.iter()? {
                let (_, value) = entry?;
                tokens.push(codec::decode(value.value())?);
            }
            Ok(tokens)
        })
        .await
    }

    /// The already-encoded record bytes for a point lookup, avoiding a
    /// decode/re-encode round trip. Fails with `NoSuchToken` when absent.
    pub async fn serialized_single(&self, id: &TokenId) -> MetadataResult<Vec<u8>> {
        let hex_id = id.to_hex();
        self.raw_get(id)
            .await?
            .ok_or(MetadataError::NoSuchToken(hex_id))
    }

    async fn raw_get(&self, id: &TokenId) -> MetadataResult<Option<Vec<u8>>> {
        let key = id.as_bytes().to_vec();
        let db = self.db.clone();

        run_blocking(move || {
            let txn = db.begin_read()?;
            let table = txn.open_table(TOKENS_TABLE)?;
            Ok(table.get(key.as_slice())?.map(|v| v.value().to_vec()))
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> MetadataResult<T>
where
    F: FnOnce() -> MetadataResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MetadataError::Internal(format!("store task failed: {e}")))?
}
