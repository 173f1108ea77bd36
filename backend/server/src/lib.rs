//! Documentation of a small guestbook service.
//!
//! Visitors post entries (a title, a body, optionally a username) and everyone can read
//! them back, newest first.
//!
//!
//!
//! # General Infrastructure
//! - Single axum server, one tokio task per request
//! - Redis holds every entry in one list, see [`database`]
//! - One Redis connection manager, opened before the listener binds and shared by all requests
//! - Views are returned as JSON view models, templating lives elsewhere
//!
//!
//!
//! # Routes
//!
//! | Method | Path    | Handler                          |
//! |--------|---------|----------------------------------|
//! | GET    | `/`     | [`routes::list_handler`]         |
//! | GET    | `/post` | [`routes::form_handler`]         |
//! | POST   | `/post` | [`routes::submit_handler`]       |
//!
//! `POST /post` sits behind [`validate::validate_payload`]:
//! - `entry[title]` is required
//! - `entry[title]` must have more than 3 characters
//!
//! A rejected post is redirected back to the referring page with the message in the
//! `flash` cookie, see [`flash`].
//!
//!
//!
//! # Notes
//!
//! ## Errors
//! - Validation failures are never server faults, they only flash and redirect
//! - Redis failures and unreadable stored entries abort the request with a 500
//! - A stored entry that is not valid JSON fails the whole listing, no partial pages
//!
//!
//!
//! # Setup
//!
//! Environment, defaults in brackets.
//! - `RUST_PORT` (1111)
//! - `REDIS_HOST` (localhost)
//! - `REDIS_PORT` (6379)
//! - `REDIS_PASSWORD`, also read from `/run/secrets/REDIS_PASSWORD` (none)
//! - `ENTRIES_KEY` (entries)
//!
//! Run with logs.
//! ```sh
//! RUST_LOG=info cargo run -p guestbook
//! ```
//!
//! Post an entry.
//! ```sh
//! curl -i -d 'entry[title]=Hello&entry[body]=First!' http://localhost:1111/post
//! ```
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod entry;
pub mod error;
pub mod field;
pub mod flash;
pub mod routes;
pub mod state;
pub mod utils;
pub mod validate;

use error::AppError;
use routes::{form_handler, list_handler, submit_handler};
use state::State;
use validate::{Rules, length_above, required, validate_payload};

pub fn app(state: Arc<State>) -> Router {
    let entry_rules = Arc::new(Rules::new([
        required("entry[title]"),
        length_above("entry[title]", 3),
    ]));

    let submit = post(submit_handler).layer(middleware::from_fn_with_state(
        entry_rules,
        validate_payload,
    ));

    Router::new()
        .route("/", get(list_handler))
        .route("/post", get(form_handler).merge(submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> Result<(), AppError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?;
    info!("Server running on {address}");

    axum::serve(listener, app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::InternalError(Box::new(e)))?;

    drop(state);
    info!("Server shut down, Redis connection closed");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
