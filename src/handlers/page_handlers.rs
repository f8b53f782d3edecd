//! Static-ish pages: home, terms and the sitemap.

use crate::{models::tab::Tab, state::AppState, views};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Local;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    pub tab: Option<String>,
}

/// `GET /` — without `?tab=` redirect to the default tab, otherwise render it.
pub async fn home(Query(q): Query<HomeQuery>) -> Response {
    match q.tab.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        None => Redirect::to(&format!("/?tab={}", Tab::default())).into_response(),
        Some(raw) => {
            let tab = raw.parse::<Tab>().unwrap_or_default();
            Html(views::index_page(tab, None)).into_response()
        }
    }
}

/// `GET /terms`
pub async fn terms() -> Html<&'static str> {
    Html(views::terms_page())
}

/// `GET /sitemap.xml`
pub async fn sitemap(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let root = site_root(state.public_url.as_deref(), &headers);
    let xml = views::sitemap(&root, Local::now().date_naive());

    let mut response = xml.into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/xml"),
    );
    response
}

/// Base URL ending in `/`: the configured public URL, else rebuilt from
/// `X-Forwarded-Proto` and `Host`.
fn site_root(public_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = public_url {
        let url = url.trim();
        return if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{}/", url)
        };
    }

    let scheme = first_header_value(headers, "x-forwarded-proto").unwrap_or("http");
    let host = first_header_value(headers, header::HOST.as_str()).unwrap_or("localhost");
    format!("{}://{}/", scheme, host)
}

/// First comma-separated value of a header, trimmed.
fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
