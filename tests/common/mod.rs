#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use forum::{
    AppState,
    auth::{CurrentUser, SESSION_COOKIE, SessionKeys},
    build_app,
    entities::{comment, post},
    store::Store,
};
use poem::{Endpoint, test::TestClient};
use sea_orm::{ActiveModelTrait, Set};

pub const SECRET: &str = "test-secret-test-secret-test-secret";

pub async fn state() -> Arc<AppState> {
    Arc::new(AppState {
        store: Store::connect("sqlite::memory:").await.unwrap(),
        sessions: SessionKeys::new(SECRET, 1),
    })
}

pub fn client(state: &Arc<AppState>) -> TestClient<impl Endpoint> {
    TestClient::new(build_app(state.clone()))
}

pub async fn user(state: &AppState, name: &str) -> CurrentUser {
    let created = state
        .store
        .create_user(name.to_string(), "unused".to_string())
        .await
        .unwrap();
    CurrentUser {
        id: created.id,
        username: created.username,
    }
}

/// `Cookie` header value that logs the request in as `user`.
pub fn session(state: &AppState, user: &CurrentUser) -> String {
    format!("{SESSION_COOKIE}={}", state.sessions.issue(user).unwrap())
}

pub fn at_hour(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 25, hour, 0, 0).unwrap()
}

pub async fn post_at(state: &AppState, author: &CurrentUser, title: &str, hour: u32) -> post::Model {
    post::ActiveModel {
        title: Set(title.to_string()),
        text: Set(format!("{title} body")),
        author_id: Set(author.id),
        date_added: Set(at_hour(hour)),
        ..Default::default()
    }
    .insert(state.store.connection())
    .await
    .unwrap()
}

pub async fn comment_at(
    state: &AppState,
    author: &CurrentUser,
    post_id: i32,
    content: &str,
    hour: u32,
) -> comment::Model {
    comment::ActiveModel {
        content: Set(content.to_string()),
        post_id: Set(post_id),
        author_id: Set(author.id),
        date_added: Set(at_hour(hour)),
        ..Default::default()
    }
    .insert(state.store.connection())
    .await
    .unwrap()
}

pub async fn body(resp: poem::test::TestResponse) -> String {
    resp.0.into_body().into_string().await.unwrap()
}

/// Asserts that `needles` appear in `haystack` in the given order.
pub fn assert_in_order(haystack: &str, needles: &[&str]) {
    let positions: Vec<usize> = needles
        .iter()
        .map(|n| haystack.find(n).unwrap_or_else(|| panic!("{n:?} not found")))
        .collect();
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "expected order {needles:?}, found positions {positions:?}"
    );
}
