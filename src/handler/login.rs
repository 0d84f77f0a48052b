use super::HtmlTemplate;
use crate::{
    auth::Authenticate,
    server::AppState,
    strategy::Strategy,
};
use askama::Template;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    strategies: Vec<Strategy>,
}

/// Login page with one sign-in button per available strategy.
#[instrument(skip(state))]
pub async fn login<A: Authenticate>(State(state): State<AppState<A>>) -> impl IntoResponse {
    HtmlTemplate(LoginTemplate {
        strategies: state.authenticator.strategies(),
    })
}
