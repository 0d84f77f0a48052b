use super::HtmlTemplate;
use crate::extractor::Profile;
use askama::Template;
use axum::response::IntoResponse;
use tracing::instrument;

#[derive(Template)]
#[template(path = "user.html")]
struct UserTemplate {
    name: String,
    provider: &'static str,
    email: Option<String>,
    picture: Option<String>,
}

#[instrument]
pub async fn user(user: Profile) -> impl IntoResponse {
    let profile = user.profile();
    let template = UserTemplate {
        name: profile.display_name().to_string(),
        provider: profile.strategy.label(),
        email: profile.email.clone(),
        picture: profile.picture.clone(),
    };

    HtmlTemplate(template)
}
