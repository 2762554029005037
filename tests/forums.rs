mod common;

use common::*;
use forum::entities::{comment, post};
use poem::http::StatusCode;
use sea_orm::EntityTrait;

#[tokio::test]
async fn index_renders_for_anonymous_visitors() {
    let state = state().await;
    let resp = client(&state).get("/").send().await;
    resp.assert_status_is_ok();
    assert!(body(resp).await.contains("Browse posts"));
}

#[tokio::test]
async fn posts_are_listed_newest_first() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    post_at(&state, &alice, "Tuesday thoughts", 9).await;
    post_at(&state, &alice, "Wednesday news", 14).await;
    post_at(&state, &alice, "Monday rant", 2).await;

    let resp = client(&state).get("/posts/").send().await;
    resp.assert_status_is_ok();
    assert_in_order(
        &body(resp).await,
        &["Wednesday news", "Tuesday thoughts", "Monday rant"],
    );
}

#[tokio::test]
async fn post_detail_lists_comments_newest_first() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let bob = user(&state, "bob").await;
    let p = post_at(&state, &alice, "Gardening", 1).await;
    comment_at(&state, &bob, p.id, "first reply", 2).await;
    comment_at(&state, &alice, p.id, "third reply", 6).await;
    comment_at(&state, &bob, p.id, "second reply", 4).await;

    let resp = client(&state).get(format!("/posts/{}/", p.id)).send().await;
    resp.assert_status_is_ok();
    let html = body(resp).await;
    assert!(html.contains("Gardening body"));
    assert_in_order(&html, &["third reply", "second reply", "first reply"]);
}

#[tokio::test]
async fn unknown_post_is_not_found() {
    let state = state().await;
    let resp = client(&state).get("/posts/404/").send().await;
    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_new_post_redirects_to_login() {
    let state = state().await;
    let cli = client(&state);

    let resp = cli.get("/new_post/").send().await;
    resp.assert_status(StatusCode::SEE_OTHER);
    resp.assert_header("location", "/accounts/login/?next=%2Fnew_post%2F");

    let resp = cli
        .post("/new_post/")
        .form(&[("title", "sneaky"), ("text", "no session")])
        .send()
        .await;
    resp.assert_status(StatusCode::SEE_OTHER);
    resp.assert_header("location", "/accounts/login/?next=%2Fnew_post%2F");

    let posts = post::Entity::find().all(state.store.connection()).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn login_redirect_keeps_the_query_string() {
    let state = state().await;
    let cli = client(&state);

    let resp = cli.get("/new_post/?draft=1&x=a%20b").send().await;
    resp.assert_status(StatusCode::SEE_OTHER);
    resp.assert_header(
        "location",
        "/accounts/login/?next=%2Fnew_post%2F%3Fdraft%3D1%26x%3Da%2520b",
    );

    let resp = cli
        .get("/accounts/login/?next=%2Fnew_post%2F%3Fdraft%3D1")
        .send()
        .await;
    resp.assert_status_is_ok();
    assert!(body(resp).await.contains("name=\"next\" value=\"/new_post/?draft=1\""));
}

#[tokio::test]
async fn tampered_session_is_treated_as_anonymous() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let cookie = format!("{}x", session(&state, &alice));

    let resp = client(&state)
        .get("/new_post/")
        .header("cookie", cookie)
        .send()
        .await;
    resp.assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn new_post_form_renders_for_members() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let resp = client(&state)
        .get("/new_post/")
        .header("cookie", session(&state, &alice))
        .send()
        .await;
    resp.assert_status_is_ok();
    let html = body(resp).await;
    assert!(html.contains("name=\"title\""));
    assert!(html.contains("Hello, alice."));
}

#[tokio::test]
async fn new_post_sets_author_and_redirects_to_list() {
    let state = state().await;
    let alice = user(&state, "alice").await;

    let resp = client(&state)
        .post("/new_post/")
        .header("cookie", session(&state, &alice))
        .form(&[("title", "  Hello forum  "), ("text", "First!")])
        .send()
        .await;
    resp.assert_status(StatusCode::SEE_OTHER);
    resp.assert_header("location", "/posts/");

    let posts = post::Entity::find().all(state.store.connection()).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Hello forum");
    assert_eq!(posts[0].text, "First!");
    assert_eq!(posts[0].author_id, alice.id);
}

#[tokio::test]
async fn invalid_post_rerenders_form_without_saving() {
    let state = state().await;
    let alice = user(&state, "alice").await;

    let resp = client(&state)
        .post("/new_post/")
        .header("cookie", session(&state, &alice))
        .form(&[("title", "<b>kept</b>"), ("text", "   ")])
        .send()
        .await;
    resp.assert_status_is_ok();
    let html = body(resp).await;
    assert!(html.contains("This field is required."));
    assert!(html.contains("value=\"&lt;b&gt;kept&lt;/b&gt;\""));

    let posts = post::Entity::find().all(state.store.connection()).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn new_comment_is_attached_server_side() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let bob = user(&state, "bob").await;
    let p = post_at(&state, &alice, "Question", 1).await;

    let resp = client(&state)
        .post(format!("/new_comment/{}/", p.id))
        .header("cookie", session(&state, &bob))
        .form(&[("content", "An answer"), ("post_id", "999"), ("author_id", "1")])
        .send()
        .await;
    resp.assert_status(StatusCode::SEE_OTHER);
    resp.assert_header("location", format!("/posts/{}/", p.id));

    let comments = comment::Entity::find().all(state.store.connection()).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].content, "An answer");
    assert_eq!(comments[0].post_id, p.id);
    assert_eq!(comments[0].author_id, bob.id);
}

#[tokio::test]
async fn new_comment_on_unknown_post_is_not_found() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let cli = client(&state);

    let resp = cli
        .get("/new_comment/77/")
        .header("cookie", session(&state, &alice))
        .send()
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);

    let resp = cli
        .post("/new_comment/77/")
        .header("cookie", session(&state, &alice))
        .form(&[("content", "into the void")])
        .send()
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_comment_is_rejected() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let p = post_at(&state, &alice, "Question", 1).await;

    let resp = client(&state)
        .post(format!("/new_comment/{}/", p.id))
        .header("cookie", session(&state, &alice))
        .form(&[("content", "")])
        .send()
        .await;
    resp.assert_status_is_ok();
    assert!(body(resp).await.contains("errorlist"));
    let comments = comment::Entity::find().all(state.store.connection()).await.unwrap();
    assert!(comments.is_empty());
}

#[tokio::test]
async fn edit_form_is_prefilled_for_the_author() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let p = post_at(&state, &alice, "Question", 1).await;
    let c = comment_at(&state, &alice, p.id, "original words", 2).await;

    let resp = client(&state)
        .get(format!("/edit_comment/{}/", c.id))
        .header("cookie", session(&state, &alice))
        .send()
        .await;
    resp.assert_status_is_ok();
    assert!(body(resp).await.contains(">original words</textarea>"));
}

#[tokio::test]
async fn editing_someone_elses_comment_is_not_found() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let mallory = user(&state, "mallory").await;
    let p = post_at(&state, &alice, "Question", 1).await;
    let c = comment_at(&state, &alice, p.id, "alice wrote this", 2).await;
    let cli = client(&state);

    let resp = cli
        .get(format!("/edit_comment/{}/", c.id))
        .header("cookie", session(&state, &mallory))
        .send()
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);

    let resp = cli
        .post(format!("/edit_comment/{}/", c.id))
        .header("cookie", session(&state, &mallory))
        .form(&[("content", "mallory was here")])
        .send()
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);

    let stored = comment::Entity::find_by_id(c.id)
        .one(state.store.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.content, "alice wrote this");
}

#[tokio::test]
async fn editing_own_comment_persists_and_redirects_to_post() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let p = post_at(&state, &alice, "Question", 1).await;
    let c = comment_at(&state, &alice, p.id, "typo'd", 2).await;

    let resp = client(&state)
        .post(format!("/edit_comment/{}/", c.id))
        .header("cookie", session(&state, &alice))
        .form(&[("content", "fixed")])
        .send()
        .await;
    resp.assert_status(StatusCode::SEE_OTHER);
    resp.assert_header("location", format!("/posts/{}/", p.id));

    let stored = comment::Entity::find_by_id(c.id)
        .one(state.store.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.content, "fixed");
    assert_eq!(stored.author_id, alice.id);
    assert_eq!(stored.post_id, p.id);
}

#[tokio::test]
async fn invalid_edit_keeps_old_content() {
    let state = state().await;
    let alice = user(&state, "alice").await;
    let p = post_at(&state, &alice, "Question", 1).await;
    let c = comment_at(&state, &alice, p.id, "keep me", 2).await;

    let resp = client(&state)
        .post(format!("/edit_comment/{}/", c.id))
        .header("cookie", session(&state, &alice))
        .form(&[("content", "  ")])
        .send()
        .await;
    resp.assert_status_is_ok();

    let stored = comment::Entity::find_by_id(c.id)
        .one(state.store.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.content, "keep me");
}
