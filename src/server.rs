use crate::{
    auth::{Authenticate, Authenticator},
    handler, Config,
};
use async_session::MemoryStore;
use axum::{
    extract::FromRef,
    http::Request,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::routing::SpaRouter;
use std::time::Duration;
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::Span;

pub const COOKIE_NAME: &str = "auth-session";

pub const LOGIN_PATH: &str = "/login";
pub const USER_PATH: &str = "/user";

pub fn session_cookie(value: &str) -> String {
    format!("{COOKIE_NAME}={value}; SameSite=Lax; Path=/; HttpOnly")
}

pub fn expired_session_cookie() -> String {
    format!("{COOKIE_NAME}=; SameSite=Lax; Path=/; HttpOnly; Max-Age=0")
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    // `MemoryStore` keeps sessions for the lifetime of the process only.
    let store = MemoryStore::new();
    let authenticator = Authenticator::discover(&config, store.clone()).await?;
    let app = app(AppState {
        authenticator,
        store,
    });

    tracing::info!("listening on {}", config.server.addr);
    axum::Server::bind(&config.server.addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn app<A: Authenticate>(state: AppState<A>) -> Router {
    Router::new()
        .route("/", get(handler::home))
        .route(LOGIN_PATH, get(handler::login::<A>))
        .route(
            "/api/auth/:provider",
            get(handler::provider::loader).post(handler::provider::action::<A>),
        )
        .route(
            "/api/auth/:provider/callback",
            get(handler::provider::callback::<A>),
        )
        .route(USER_PATH, get(handler::user))
        .route("/logout", get(handler::logout))
        .with_state(state)
        .merge(SpaRouter::new("/public", "static"))
        .layer(
            TraceLayer::new_for_http()
                .on_request(|request: &Request<_>, _span: &Span| {
                    tracing::info!("{} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &Response, latency: Duration, _span: &Span| {
                    tracing::info!("{} in {:?}", response.status(), latency);
                })
                .on_failure(
                    |error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                        tracing::error!("{} after {:?}", error, latency);
                    },
                ),
        )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("shutting down");
}

#[derive(Clone)]
pub struct AppState<A> {
    pub authenticator: A,
    pub store: MemoryStore,
}

impl<A> FromRef<AppState<A>> for MemoryStore {
    fn from_ref(state: &AppState<A>) -> Self {
        state.store.clone()
    }
}

pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::temporary(LOGIN_PATH).into_response()
    }
}
