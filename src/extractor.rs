use crate::auth::UserProfile;
use crate::server::{AuthRedirect, COOKIE_NAME};
use async_session::{MemoryStore, SessionStore};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, TypedHeader},
    http::request::Parts,
    RequestPartsExt,
};

/// The signed in user. Requests without a live session are redirected to the login page.
#[derive(Debug, Clone)]
pub struct Profile {
    inner: UserProfile,
}

impl Profile {
    pub fn profile(&self) -> &UserProfile {
        &self.inner
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Profile
where
    MemoryStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = MemoryStore::from_ref(state);

        let cookies = parts
            .extract::<Option<TypedHeader<headers::Cookie>>>()
            .await
            .ok()
            .flatten()
            .ok_or(AuthRedirect)?;
        let session_cookie = cookies.get(COOKIE_NAME).ok_or(AuthRedirect)?;

        let session = store
            .load_session(session_cookie.to_string())
            .await
            .map_err(|err| {
                tracing::warn!("discarding unreadable session cookie: {}", err);
                AuthRedirect
            })?
            .ok_or(AuthRedirect)?;

        let profile = session
            .get::<UserProfile>("profile")
            .ok_or(AuthRedirect)?;

        Ok(Profile { inner: profile })
    }
}
