use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

pub mod home;
pub mod login;
pub mod logout;
pub mod provider;
pub mod user;

pub use home::home;
pub use login::login;
pub use logout::logout;
pub use user::user;

/// Page rendered from an askama template.
///
/// Render failures are logged with the template type and answered with a
/// plain 500 so template internals never reach the browser.
pub(crate) struct HtmlTemplate<T>(pub(crate) T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!(
                    template = std::any::type_name::<T>(),
                    "failed to render page: {}",
                    err
                );
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use std::fmt;

    #[derive(Template)]
    #[template(source = "<p>{{ greeting }}</p>", ext = "html")]
    struct Greeting<'a> {
        greeting: &'a str,
    }

    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[derive(Template)]
    #[template(source = "{{ value }}", ext = "html")]
    struct BrokenPage {
        value: Broken,
    }

    #[test]
    fn renders_escaped_html() {
        let response = HtmlTemplate(Greeting { greeting: "<hi>" }).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[test]
    fn render_failure_is_a_server_error() {
        let response = HtmlTemplate(BrokenPage { value: Broken }).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
