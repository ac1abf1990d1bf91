//! HTTP client for a tokendrop server.
//!
//! Wraps the full endpoint surface: session login, token creation and
//! listing, single-token lookup, streaming upload with progress reporting,
//! and download. The session cookie issued at login is held in the client's
//! cookie store and sent automatically on later calls.

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode, Url};
use tokendrop_core::{codec, Token, NO_SUCH_TOKEN};
use tokio::sync::mpsc::UnboundedSender;

/// Upload payloads are fed to the transport in chunks of this size; one
/// progress event is emitted per chunk.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

pub struct TransferClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TransferClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid base url")?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    /// Establishes a session with the configured credentials.
    pub async fn login(&self, user: &str, pass: &str) -> Result<()> {
        let response = self
            .http
            .get(self.endpoint("login")?)
            .basic_auth(user, Some(pass))
            .send()
            .await
            .context("login request failed")?;
        if !response.status().is_success() {
            bail!("login rejected: {}", response.status());
        }
        tracing::debug!(user, "session established");
        Ok(())
    }

    /// Mints a fresh token. Requires a prior [`login`](Self::login).
    pub async fn create(&self) -> Result<Token> {
        let response = self
            .http
            .get(self.endpoint("create")?)
            .send()
            .await
            .context("create request failed")?;
        let body = expect_success(response, "create").await?;
        codec::decode(&body).context("create: malformed token record")
    }

    /// All tokens known to the server. Requires a prior login.
    pub async fn list(&self) -> Result<Vec<Token>> {
        let response = self
            .http
            .get(self.endpoint("list")?)
            .send()
            .await
            .context("list request failed")?;
        let body = expect_success(response, "list").await?;
        codec::decode_list(&body).context("list: malformed token list")
    }

    /// Looks up one token record. Returns `None` when the server answers
    /// with the unknown-token sentinel.
    pub async fn single(&self, id_hex: &str) -> Result<Option<Token>> {
        let mut url = self.endpoint("single")?;
        url.query_pairs_mut().append_pair("id", id_hex);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("single request failed")?;

        let status = response.status();
        let body = response.bytes().await.context("single: reading body")?;
        if status == StatusCode::NOT_FOUND && body.as_ref() == NO_SUCH_TOKEN.as_bytes() {
            return Ok(None);
        }
        if !status.is_success() {
            bail!("single rejected: {status}: {}", String::from_utf8_lossy(&body));
        }
        Ok(Some(codec::decode(&body).context("single: malformed token record")?))
    }

    /// Uploads `content` under an existing token.
    ///
    /// The payload is streamed in fixed-size chunks; for each chunk handed
    /// to the transport, its size is sent to `progress` if a sender is
    /// given. Sending never blocks the upload, and the sum of all reported
    /// sizes equals `content.len()`. A dropped receiver is ignored.
    pub async fn upload(
        &self,
        id_hex: &str,
        filename: &str,
        content: Vec<u8>,
        progress: Option<UnboundedSender<usize>>,
    ) -> Result<()> {
        let total = content.len() as u64;
        let chunks: Vec<Bytes> = content
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(Bytes::copy_from_slice)
            .collect();
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            if let Some(progress) = &progress {
                let _ = progress.send(chunk.len());
            }
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .context("upload: invalid mime type")?;
        // The id field goes first; the server verifies the token before it
        // accepts any file bytes.
        let form = Form::new().text("id", id_hex.to_string()).part("file", part);

        let response = self
            .http
            .post(self.endpoint("transfer")?)
            .multipart(form)
            .send()
            .await
            .context("transfer request failed")?;
        expect_success(response, "transfer").await?;
        tracing::debug!(id = id_hex, filename, bytes = total, "upload complete");
        Ok(())
    }

    /// Downloads the file bound to a token. Returns the server-reported
    /// filename and the content.
    pub async fn download(&self, id_hex: &str) -> Result<(String, Vec<u8>)> {
        let mut url = self.endpoint("download")?;
        url.query_pairs_mut().append_pair("id", id_hex);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("download request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("download rejected: {status}: {body}");
        }

        let name = filename_from_disposition(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok()),
        )
        .context("download: missing filename in content-disposition")?;

        let mut content = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            content.extend_from_slice(&chunk.context("download: reading body")?);
        }
        Ok((name, content))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path {path:?}"))
    }
}

async fn expect_success(response: reqwest::Response, what: &str) -> Result<Vec<u8>> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .with_context(|| format!("{what}: reading body"))?;
    if !status.is_success() {
        bail!("{what} rejected: {status}: {}", String::from_utf8_lossy(&body));
    }
    Ok(body.to_vec())
}

/// Extracts the filename from `attachment; filename="..."`.
fn filename_from_disposition(value: Option<&str>) -> Option<String> {
    let value = value?;
    let (_, rest) = value.split_once("filename=")?;
    let rest = rest.trim();
    let name = rest
        .strip_prefix('"')
        .and_then(|r| r.split('"').next())
        .unwrap_or_else(|| rest.split(';').next().unwrap_or(rest).trim());
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::filename_from_disposition;

    #[test]
    fn disposition_quoted_filename() {
        assert_eq!(
            filename_from_disposition(Some(r#"attachment; filename="report.pdf""#)),
            Some("report.pdf".to_string())
        );
    }

    #[test]
    fn disposition_unquoted_filename() {
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=data.bin")),
            Some("data.bin".to_string())
        );
    }

    #[test]
    fn disposition_missing_filename() {
        assert_eq!(filename_from_disposition(Some("inline")), None);
        assert_eq!(filename_from_disposition(None), None);
    }
}
