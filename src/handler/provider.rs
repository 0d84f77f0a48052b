//! `/api/auth/:provider`: the entry point of every provider login.
//!
//! Browsers only ever POST here (from the login page's forms); a plain GET is
//! sent back to the login page. Everything after picking the strategy belongs
//! to the [`Authenticate`] implementation.

use crate::{
    auth::Authenticate,
    error::AuthError,
    server::{AppState, LOGIN_PATH},
    strategy::Strategy,
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::Request,
    response::{Redirect, Response},
};
use std::collections::HashMap;
use tracing::instrument;

#[instrument]
pub async fn loader() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

#[instrument(skip(state, params, request), fields(provider = ?params.get("provider")))]
pub async fn action<A: Authenticate>(
    State(state): State<AppState<A>>,
    Path(params): Path<HashMap<String, String>>,
    request: Request<Body>,
) -> Result<Response, AuthError> {
    delegate(&state.authenticator, &params, request).await
}

/// Where the provider sends the browser back to once the user has signed in.
#[instrument(skip(state, params, request), fields(provider = ?params.get("provider")))]
pub async fn callback<A: Authenticate>(
    State(state): State<AppState<A>>,
    Path(params): Path<HashMap<String, String>>,
    request: Request<Body>,
) -> Result<Response, AuthError> {
    delegate(&state.authenticator, &params, request).await
}

async fn delegate<A: Authenticate>(
    authenticator: &A,
    params: &HashMap<String, String>,
    request: Request<Body>,
) -> Result<Response, AuthError> {
    let provider = params.get("provider").ok_or(AuthError::MissingProvider)?;
    let strategy = Strategy::parse(provider)?;
    authenticator.authenticate(strategy, request).await
}
