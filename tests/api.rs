mod common;

use common::*;
use poem::http::StatusCode;
use serde_json::Value;

async fn json(resp: poem::test::TestResponse) -> Value {
    serde_json::from_str(&body(resp).await).unwrap()
}

#[tokio::test]
async fn posts_are_paginated_newest_first() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    for hour in 0..5 {
        post_at(&state, &alice, &format!("post {hour}"), hour).await;
    }
    let cli = client(&state);

    let resp = cli.get("/api/posts?page=1&per_page=2").send().await;
    resp.assert_status_is_ok();
    let page = json(resp).await;
    let titles: Vec<&str> = page
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["post 4", "post 3"]);
    assert_eq!(page[0]["author"], "alice");

    let resp = cli.get("/api/posts?page=3&per_page=2").send().await;
    let last = json(resp).await;
    assert_eq!(last.as_array().unwrap().len(), 1);
    assert_eq!(last[0]["title"], "post 0");
}

#[tokio::test]
async fn single_post_and_its_comments() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let p = post_at(&state, &alice, "Topic", 1).await;
    comment_at(&state, &alice, p.id, "older", 2).await;
    comment_at(&state, &alice, p.id, "newer", 3).await;
    let cli = client(&state);

    let resp = cli.get(format!("/api/posts/{}", p.id)).send().await;
    resp.assert_status_is_ok();
    assert_eq!(json(resp).await["title"], "Topic");

    let resp = cli.get(format!("/api/posts/{}/comments", p.id)).send().await;
    resp.assert_status_is_ok();
    let comments = json(resp).await;
    assert_eq!(comments[0]["content"], "newer");
    assert_eq!(comments[1]["content"], "older");
}

#[tokio::test]
async fn missing_post_is_404() {
    let state = state().await;
    let cli = client(&state);
    cli.get("/api/posts/9").send().await.assert_status(StatusCode::NOT_FOUND);
    cli.get("/api/posts/9/comments")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
