//! Request handlers. Thin translations between HTTP and the coordinator.

use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::Deserialize;
use tokendrop_core::codec;
use tokendrop_metadata::MetadataError;

use crate::auth;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::transfer::TransferError;

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

/// GET /login
///
/// Accepts either an existing session cookie or Basic credentials. A
/// successful login re-issues the session cookie either way, so a client
/// can refresh its session by logging in again.
pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let auth = &state.config.auth;
    if !auth::check_cookie(&headers, auth) && !auth::check_basic(&headers, auth) {
        let mut response = ApiError::Unauthorized.into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Basic realm=\"tokendrop\""),
        );
        return Ok(response);
    }

    let cookie = HeaderValue::from_str(&auth::session_cookie(auth))
        .map_err(|e| ApiError::Internal(format!("session cookie not encodable: {e}")))?;
    let mut response = StatusCode::NO_CONTENT.into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    tracing::info!(user = %auth.user, "session established");
    Ok(response)
}

/// GET /create
pub async fn create(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    auth::require_session(&headers, &state.config.auth)?;
    let token = state.coordinator.create_token().await?;
    let body = codec::encode(&token).map_err(TransferError::from)?;
    Ok(json_bytes(body))
}

/// GET /list
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    auth::require_session(&headers, &state.config.auth)?;
    let body = state.coordinator.list().await?;
    Ok(json_bytes(body))
}

/// GET /single?id=<hex>
///
/// Returns the stored record bytes verbatim. An unknown id answers with the
/// literal sentinel body rather than a structured error; clients match on
/// that exact text.
pub async fn single(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Response> {
    match state.coordinator.single(&query.id).await {
        Ok(body) => Ok(json_bytes(body)),
        Err(TransferError::Metadata(MetadataError::NoSuchToken(_))) => {
            Ok((StatusCode::NOT_FOUND, tokendrop_core::NO_SUCH_TOKEN).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /transfer
///
/// Multipart upload with two parts: a text `id` field followed by a `file`
/// part. The id must arrive first so the token can be verified before any
/// file bytes are accepted; the file part is streamed straight into the
/// blob store without buffering.
pub async fn transfer(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<StatusCode> {
    let mut id: Option<String> = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("id") => {
                id = Some(field.text().await.map_err(bad_multipart)?);
            }
            Some("file") => {
                let id = id.ok_or_else(|| {
                    ApiError::BadRequest("id field must precede file part".to_string())
                })?;
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        ApiError::BadRequest("file part missing filename".to_string())
                    })?;
                let stream = field.map(|chunk| chunk.map_err(std::io::Error::other));
                state.coordinator.upload(&id, &filename, stream).await?;
                return Ok(StatusCode::OK);
            }
            // Unknown parts are skipped.
            _ => {}
        }
    }
    Err(ApiError::BadRequest("missing file part".to_string()))
}

/// GET /download?id=<hex>
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Response> {
    let (stream, name) = state.coordinator.download(&query.id).await?;
    // Quotes and backslashes would corrupt the quoted-string form of the
    // header value.
    let name = name.replace(['"', '\\'], "_");
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{name}\""))
        .map_err(|e| ApiError::Internal(format!("filename not encodable: {e}")))?;
    let mut response = Body::from_stream(stream).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    Ok(response)
}

fn json_bytes(body: Vec<u8>) -> Response {
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}

fn bad_multipart(e: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("multipart: {e}"))
}
