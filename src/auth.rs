use crate::{
    error::AuthError,
    server::{session_cookie, LOGIN_PATH, USER_PATH},
    strategy::Strategy,
    Config,
};
use anyhow::Context;
use async_lock::RwLock;
use async_session::{MemoryStore, Session, SessionStore};
use axum::{
    async_trait,
    body::Body,
    http::{header::SET_COOKIE, HeaderMap, Request, Uri},
    response::{IntoResponse, Redirect, Response},
};
use openidconnect::{
    core::{CoreAuthenticationFlow, CoreClient, CoreIdTokenClaims, CoreProviderMetadata},
    reqwest::async_http_client,
    AccessToken, AccessTokenHash, AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl,
    Nonce, OAuth2TokenResponse, RedirectUrl, Scope,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

/// How long a user has to finish signing in at the provider.
pub const LOGIN_TTL: Duration = Duration::from_secs(10 * 60);

/// Hands a request off to the login flow of an authentication strategy.
///
/// Implementations own everything provider specific: the redirect to the
/// provider, the callback exchange and the resulting session. The route
/// handlers only decide which strategy a request is for.
#[async_trait]
pub trait Authenticate: Clone + Send + Sync + 'static {
    async fn authenticate(
        &self,
        strategy: Strategy,
        request: Request<Body>,
    ) -> Result<Response, AuthError>;

    /// Strategies offered on the login page.
    fn strategies(&self) -> Vec<Strategy> {
        Strategy::ALL.to_vec()
    }
}

#[derive(Clone, Debug)]
pub struct PendingLogin {
    strategy: Strategy,
    nonce: Nonce,
    created_at: Instant,
}

/// Logins that were sent to a provider and have not come back yet, keyed by
/// the CSRF state handed to the provider. Entries older than the TTL are
/// dropped whenever a new login starts and never honoured by a callback.
#[derive(Clone, Debug)]
pub struct PendingLogins {
    ttl: Duration,
    logins: Arc<RwLock<HashMap<String, PendingLogin>>>,
}

impl Default for PendingLogins {
    fn default() -> Self {
        Self::new(LOGIN_TTL)
    }
}

impl PendingLogins {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            logins: Arc::default(),
        }
    }

    pub async fn remember(&self, state: String, strategy: Strategy, nonce: Nonce) {
        let mut logins = self.logins.write().await;
        logins.retain(|_, login| login.created_at.elapsed() < self.ttl);
        logins.insert(
            state,
            PendingLogin {
                strategy,
                nonce,
                created_at: Instant::now(),
            },
        );
    }

    /// Removes the login for `state`. A state is only good for one callback,
    /// only for the strategy that issued it and only within the TTL.
    pub async fn take(&self, state: &str, strategy: Strategy) -> Result<Nonce, AuthError> {
        match self.logins.write().await.remove(state) {
            Some(login) if login.created_at.elapsed() >= self.ttl => {
                tracing::warn!(%strategy, "login state expired");
                Err(AuthError::UnknownState)
            }
            Some(login) if login.strategy == strategy => Ok(login.nonce),
            Some(login) => {
                tracing::warn!(expected = %login.strategy, got = %strategy, "state used by another strategy");
                Err(AuthError::UnknownState)
            }
            None => Err(AuthError::UnknownState),
        }
    }

    pub async fn discard(&self, state: &str) {
        self.logins.write().await.remove(state);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.logins.read().await.len()
    }
}

/// What a request to a strategy is asking for, judged by its query string.
#[derive(Debug, PartialEq, Eq)]
enum Phase {
    Authorize,
    Callback {
        code: String,
        state: String,
    },
    Denied {
        error: String,
        description: Option<String>,
        state: Option<String>,
    },
}

impl Phase {
    fn from_uri(uri: &Uri) -> Self {
        let mut params: HashMap<String, String> = uri
            .query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(error) = params.remove("error") {
            return Phase::Denied {
                error,
                description: params.remove("error_description"),
                state: params.remove("state"),
            };
        }

        match (params.remove("code"), params.remove("state")) {
            (Some(code), Some(state)) => Phase::Callback { code, state },
            _ => Phase::Authorize,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub strategy: Strategy,
    pub subject: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

impl UserProfile {
    fn from_claims(strategy: Strategy, claims: &CoreIdTokenClaims) -> Self {
        Self {
            strategy,
            subject: claims.subject().as_str().to_owned(),
            nickname: claims
                .nickname()
                .and_then(|n| n.get(None))
                .map(|n| n.to_string()),
            email: claims.email().map(|e| e.as_str().to_owned()),
            picture: claims
                .picture()
                .and_then(|p| p.get(None))
                .map(|url| url.to_string()),
        }
    }

    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.subject)
    }
}

/// OpenID Connect implementation of [`Authenticate`].
#[derive(Clone, Debug)]
pub struct Authenticator {
    clients: Arc<HashMap<Strategy, CoreClient>>,
    pending: PendingLogins,
    sessions: MemoryStore,
}

impl Authenticator {
    pub async fn discover(config: &Config, sessions: MemoryStore) -> anyhow::Result<Self> {
        let base_url = config.server.base_url.trim_end_matches('/');
        let mut clients = HashMap::new();

        for (strategy, settings) in &config.strategies {
            let issuer = settings
                .issuer_url
                .as_deref()
                .or_else(|| strategy.default_issuer())
                .with_context(|| format!("{}ISSUER_URL must be set", strategy.env_prefix()))?;

            let issuer_url = IssuerUrl::new(issuer.to_string())?;
            let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, async_http_client)
                .await
                .with_context(|| format!("discovering {strategy} at {issuer}"))?;

            let client = CoreClient::from_provider_metadata(
                provider_metadata,
                ClientId::new(settings.client_id.clone()),
                Some(ClientSecret::new(settings.client_secret.clone())),
            )
            .set_redirect_uri(RedirectUrl::new(format!(
                "{base_url}/api/auth/{strategy}/callback"
            ))?);

            tracing::info!(%strategy, issuer, "strategy ready");
            clients.insert(*strategy, client);
        }

        Ok(Self::from_clients(clients, sessions))
    }

    pub fn from_clients(clients: HashMap<Strategy, CoreClient>, sessions: MemoryStore) -> Self {
        Self {
            clients: Arc::new(clients),
            pending: PendingLogins::default(),
            sessions,
        }
    }

    async fn authorize(&self, strategy: Strategy, client: &CoreClient) -> Response {
        let (auth_url, csrf_token, nonce) = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .add_scope(Scope::new("profile".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .url();

        self.pending
            .remember(csrf_token.secret().to_owned(), strategy, nonce)
            .await;

        tracing::debug!(%strategy, "redirecting to provider");
        Redirect::to(auth_url.as_str()).into_response()
    }

    async fn complete(
        &self,
        strategy: Strategy,
        client: &CoreClient,
        code: String,
        state: String,
    ) -> Result<Response, AuthError> {
        let nonce = self.pending.take(&state, strategy).await?;

        let token_response = client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .context("exchanging authorization code")?;

        let id_token = token_response
            .extra_fields()
            .id_token()
            .ok_or(AuthError::MissingIdToken)?;
        let id_token_verifier = client.id_token_verifier();
        let claims = id_token
            .claims(&id_token_verifier, &nonce)
            .context("verifying ID token")?;

        if let Some(expected_access_token_hash) = claims.access_token_hash() {
            let signing_alg = id_token
                .signing_alg()
                .context("reading ID token signing algorithm")?;
            let actual = AccessTokenHash::from_token(token_response.access_token(), &signing_alg)
                .context("hashing access token")?;

            if actual != *expected_access_token_hash {
                return Err(AuthError::AccessTokenHashMismatch);
            }
        }

        let profile = UserProfile::from_claims(strategy, claims);
        tracing::info!(%strategy, subject = %profile.subject, "login completed");

        let headers = self
            .save_and_get_cookie_header(token_response.access_token(), &profile)
            .await?;

        Ok((headers, Redirect::to(USER_PATH)).into_response())
    }

    async fn save_and_get_cookie_header(
        &self,
        access_token: &AccessToken,
        profile: &UserProfile,
    ) -> anyhow::Result<HeaderMap> {
        let mut session = Session::new();
        session.insert("access_token", access_token)?;
        session.insert("profile", profile)?;

        let cookie = self
            .sessions
            .store_session(session)
            .await?
            .context("cookie string not found")?;

        let mut headers = HeaderMap::new();
        headers.insert(SET_COOKIE, session_cookie(&cookie).parse()?);

        Ok(headers)
    }
}

#[async_trait]
impl Authenticate for Authenticator {
    async fn authenticate(
        &self,
        strategy: Strategy,
        request: Request<Body>,
    ) -> Result<Response, AuthError> {
        let client = self
            .clients
            .get(&strategy)
            .ok_or(AuthError::StrategyNotConfigured(strategy))?;

        match Phase::from_uri(request.uri()) {
            Phase::Authorize => Ok(self.authorize(strategy, client).await),
            Phase::Callback { code, state } => self.complete(strategy, client, code, state).await,
            Phase::Denied {
                error,
                description,
                state,
            } => {
                tracing::warn!(%strategy, %error, ?description, "provider denied login");
                if let Some(state) = state {
                    self.pending.discard(&state).await;
                }
                Ok(Redirect::to(LOGIN_PATH).into_response())
            }
        }
    }

    fn strategies(&self) -> Vec<Strategy> {
        Strategy::ALL
            .into_iter()
            .filter(|strategy| self.clients.contains_key(strategy))
            .collect()
    }
}
