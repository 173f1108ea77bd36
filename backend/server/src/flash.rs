//! # Flash Messages
//!
//! A rejected form redirects the user back to where they came from. The error message
//! rides along in a short-lived `flash` cookie and is shown, then cleared, by the next
//! page the user lands on.
//!
//! The cookie value is URL-safe base64 so any message text survives the header.
use axum::{
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, REFERER, SET_COOKIE},
    },
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::error::ValidationError;

pub const FLASH_COOKIE: &str = "flash";

pub fn encode(message: &str) -> HeaderValue {
    let cookie = format!(
        "{FLASH_COOKIE}={}; Path=/; Max-Age=60; HttpOnly; SameSite=Lax",
        URL_SAFE_NO_PAD.encode(message)
    );

    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static("flash=; Path=/"))
}

pub fn clear() -> HeaderValue {
    HeaderValue::from_static("flash=; Path=/; Max-Age=0")
}

/// Reads the flash message from the request cookies, if one was set.
pub fn read(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == FLASH_COOKIE)
        .and_then(|(_, value)| URL_SAFE_NO_PAD.decode(value).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

/// The referring page, or the home page when there is none.
pub fn back(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .filter(|referer| !referer.is_empty())
        .unwrap_or("/")
        .to_string()
}

/// Flash the error and send the user back.
pub fn reject(headers: &HeaderMap, error: &ValidationError) -> Response {
    (
        AppendHeaders([(SET_COOKIE, encode(&error.message))]),
        Redirect::to(&back(headers)),
    )
        .into_response()
}
