use std::sync::Arc;

use poem::{
    IntoResponse, Response, handler,
    web::{Data, Form, Html, Path, Redirect},
};

use super::templates;
use crate::AppState;
use crate::auth::{CurrentUser, Viewer};
use crate::forms::{CommentForm, FormErrors, PostForm};

#[handler]
pub async fn index(viewer: Viewer) -> Html<String> {
    Html(templates::index(&viewer))
}

#[handler]
pub async fn post_list(Data(state): Data<&Arc<AppState>>, viewer: Viewer) -> poem::Result<Html<String>> {
    let posts = state.store.list_posts().await?;
    Ok(Html(templates::posts(&viewer, &posts)))
}

/// A single post with its comments, newest first.
#[handler]
pub async fn post_detail(
    Data(state): Data<&Arc<AppState>>,
    Path(post_id): Path<i32>,
    viewer: Viewer,
) -> poem::Result<Html<String>> {
    let post = state.store.find_post(post_id).await?;
    let comments = state.store.comments_for_post(post_id).await?;
    Ok(Html(templates::post(&viewer, &post, &comments)))
}

#[handler]
pub async fn new_post_form(Data(user): Data<&CurrentUser>) -> Html<String> {
    Html(templates::new_post(
        &Viewer::from(user),
        &PostForm::default(),
        &FormErrors::default(),
    ))
}

#[handler]
pub async fn create_post(
    Data(state): Data<&Arc<AppState>>,
    Data(user): Data<&CurrentUser>,
    Form(form): Form<PostForm>,
) -> poem::Result<Response> {
    match form.clean() {
        Ok(form) => {
            state.store.create_post(user.id, form.title, form.text).await?;
            Ok(Redirect::see_other("/posts/").into_response())
        }
        Err((form, errors)) => {
            Ok(Html(templates::new_post(&Viewer::from(user), &form, &errors)).into_response())
        }
    }
}

#[handler]
pub async fn new_comment_form(
    Data(state): Data<&Arc<AppState>>,
    Data(user): Data<&CurrentUser>,
    Path(post_id): Path<i32>,
) -> poem::Result<Html<String>> {
    let post = state.store.find_post(post_id).await?;
    Ok(Html(templates::new_comment(
        &Viewer::from(user),
        &post.record,
        &CommentForm::default(),
        &FormErrors::default(),
    )))
}

#[handler]
pub async fn create_comment(
    Data(state): Data<&Arc<AppState>>,
    Data(user): Data<&CurrentUser>,
    Path(post_id): Path<i32>,
    Form(form): Form<CommentForm>,
) -> poem::Result<Response> {
    let post = state.store.find_post(post_id).await?;
    match form.clean() {
        Ok(form) => {
            state
                .store
                .create_comment(post_id, user.id, form.content)
                .await?;
            Ok(Redirect::see_other(format!("/posts/{post_id}/")).into_response())
        }
        Err((form, errors)) => Ok(Html(templates::new_comment(
            &Viewer::from(user),
            &post.record,
            &form,
            &errors,
        ))
        .into_response()),
    }
}

/// Pre-filled form for a comment the requester wrote. Anyone else gets a 404.
#[handler]
pub async fn edit_comment_form(
    Data(state): Data<&Arc<AppState>>,
    Data(user): Data<&CurrentUser>,
    Path(comment_id): Path<i32>,
) -> poem::Result<Html<String>> {
    let comment = state.store.owned_comment(comment_id, user.id).await?;
    let post = state.store.find_post(comment.post_id).await?;
    let form = CommentForm::with_content(comment.content.clone());
    Ok(Html(templates::edit_comment(
        &Viewer::from(user),
        &post.record,
        &comment,
        &form,
        &FormErrors::default(),
    )))
}

#[handler]
pub async fn update_comment(
    Data(state): Data<&Arc<AppState>>,
    Data(user): Data<&CurrentUser>,
    Path(comment_id): Path<i32>,
    Form(form): Form<CommentForm>,
) -> poem::Result<Response> {
    let comment = state.store.owned_comment(comment_id, user.id).await?;
    match form.clean() {
        Ok(form) => {
            let post_id = comment.post_id;
            state.store.update_comment(comment, form.content).await?;
            Ok(Redirect::see_other(format!("/posts/{post_id}/")).into_response())
        }
        Err((form, errors)) => {
            let post = state.store.find_post(comment.post_id).await?;
            Ok(Html(templates::edit_comment(
                &Viewer::from(user),
                &post.record,
                &comment,
                &form,
                &errors,
            ))
            .into_response())
        }
    }
}
