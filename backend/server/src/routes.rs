use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State as Shared,
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tracing::info;

use crate::{entry::Entry, error::AppError, flash, state::State, validate::Payload};

#[derive(Serialize)]
pub struct EntriesView {
    pub title: &'static str,
    pub entries: Vec<Entry>,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct PostView {
    pub title: &'static str,
    pub error: Option<String>,
}

/// Responds with the view, consuming any pending flash message.
fn render<T: Serialize>(headers: &HeaderMap, view: impl FnOnce(Option<String>) -> T) -> Response {
    match flash::read(headers) {
        Some(message) => (
            AppendHeaders([(SET_COOKIE, flash::clear())]),
            Json(view(Some(message))),
        )
            .into_response(),
        None => Json(view(None)).into_response(),
    }
}

pub async fn list_handler(
    Shared(state): Shared<Arc<State>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let entries = state.entries.all().await?;

    Ok(render(&headers, |error| EntriesView {
        title: "Entries",
        entries,
        error,
    }))
}

pub async fn form_handler(headers: HeaderMap) -> Response {
    render(&headers, |error| PostView {
        title: "Post",
        error,
    })
}

pub async fn submit_handler(
    Shared(state): Shared<Arc<State>>,
    Extension(Payload(payload)): Extension<Payload>,
) -> Result<Redirect, AppError> {
    let entry = Entry::from_payload(&payload)?;
    state.entries.append(&entry).await?;

    info!("New entry: {}", entry.title);

    Ok(Redirect::to("/"))
}
