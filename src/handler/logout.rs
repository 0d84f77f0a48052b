use crate::server::{expired_session_cookie, COOKIE_NAME};
use async_session::{MemoryStore, SessionStore};
use axum::{
    extract::{State, TypedHeader},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect},
};
use tracing::instrument;

#[instrument(skip(store, cookies))]
pub async fn logout(
    State(store): State<MemoryStore>,
    cookies: Option<TypedHeader<headers::Cookie>>,
) -> impl IntoResponse {
    let session_cookie = cookies
        .as_ref()
        .and_then(|TypedHeader(cookies)| cookies.get(COOKIE_NAME));

    if let Some(cookie) = session_cookie {
        match store.load_session(cookie.to_string()).await {
            Ok(Some(session)) => {
                if let Err(err) = store.destroy_session(session).await {
                    tracing::error!("failed to destroy session: {}", err);
                }
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("ignoring unreadable session cookie: {}", err),
        }
    }

    ([(SET_COOKIE, expired_session_cookie())], Redirect::to("/"))
}
