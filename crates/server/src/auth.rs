//! Session handling for the administrative endpoints.
//!
//! Authentication is deliberately simple: a single configured user/password
//! pair, accepted either as HTTP Basic credentials (at login) or as a cookie
//! whose name is the user and whose value is the password. Transfer
//! endpoints are not gated; possession of a token id is the capability.

use axum::http::{header, HeaderMap};
use base64::Engine;
use tokendrop_core::config::AuthConfig;

use crate::error::{ApiError, ApiResult};

/// Cookie lifetime handed out at login, one year in seconds.
const SESSION_MAX_AGE: u64 = 365 * 24 * 60 * 60;

/// Checks an `Authorization: Basic ...` header against the configured pair.
pub fn check_basic(headers: &HeaderMap, auth: &AuthConfig) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Some(encoded) = value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(credentials) = String::from_utf8(decoded) else {
        return false;
    };
    match credentials.split_once(':') {
        Some((user, pass)) => user == auth.user && pass == auth.pass,
        None => false,
    }
}

/// Checks the request cookies for a valid session cookie.
pub fn check_cookie(headers: &HeaderMap, auth: &AuthConfig) -> bool {
    let Some(cookies) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    cookies.split(';').map(str::trim).any(|pair| {
        pair.split_once('=')
            .map(|(name, value)| name == auth.user && value == auth.pass)
            .unwrap_or(false)
    })
}

/// The `Set-Cookie` value issued by a successful login.
pub fn session_cookie(auth: &AuthConfig) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/",
        auth.user, auth.pass, SESSION_MAX_AGE
    )
}

/// Gate for endpoints that require an established session.
pub fn require_session(headers: &HeaderMap, auth: &AuthConfig) -> ApiResult<()> {
    if check_cookie(headers, auth) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}
