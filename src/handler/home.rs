use super::HtmlTemplate;
use crate::server::{LOGIN_PATH, USER_PATH};
use askama::Template;
use axum::response::IntoResponse;
use tracing::instrument;

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate<'a> {
    login_path: &'a str,
    user_path: &'a str,
}

#[instrument]
pub async fn home() -> impl IntoResponse {
    HtmlTemplate(HomeTemplate {
        login_path: LOGIN_PATH,
        user_path: USER_PATH,
    })
}
