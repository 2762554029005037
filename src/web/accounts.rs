use std::sync::Arc;

use poem::{
    IntoResponse, Response, handler,
    web::{
        Data, Form, Html, Query, Redirect,
        cookie::CookieJar,
    },
};
use serde::Deserialize;
use tracing::info;

use super::templates;
use crate::AppState;
use crate::auth::{self, CurrentUser, Viewer};
use crate::error::ForumError;
use crate::forms::{FormErrors, LoginForm, RegisterForm, safe_next};

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

fn username_taken(viewer: &Viewer, form: &RegisterForm) -> Response {
    let mut errors = FormErrors::default();
    errors.add_field("username", "A user with that username already exists.");
    Html(templates::register(viewer, form, &errors)).into_response()
}

fn start_session(state: &AppState, jar: &CookieJar, user: &CurrentUser) -> poem::Result<()> {
    let token = state.sessions.issue(user)?;
    jar.add(state.sessions.cookie(token));
    Ok(())
}

#[handler]
pub async fn login_form(viewer: Viewer, Query(query): Query<NextQuery>) -> Html<String> {
    let next = safe_next(query.next.as_deref());
    Html(templates::login(&viewer, "", next, &FormErrors::default()))
}

#[handler]
pub async fn login(
    Data(state): Data<&Arc<AppState>>,
    jar: &CookieJar,
    viewer: Viewer,
    Form(form): Form<LoginForm>,
) -> poem::Result<Response> {
    let form = match form.clean() {
        Ok(form) => form,
        Err((form, errors)) => {
            let next = safe_next(form.next.as_deref());
            return Ok(Html(templates::login(&viewer, &form.username, next, &errors)).into_response());
        }
    };

    let found = state.store.find_user_by_username(&form.username).await?;
    let verified = auth::verify_user_password(
        &form.password,
        found.as_ref().map(|u| u.password_hash.as_str()),
    )?;
    let user = match found {
        Some(user) if verified => user,
        _ => {
            info!(username = %form.username, "failed login");
            let mut errors = FormErrors::default();
            errors.add_general(BAD_CREDENTIALS);
            let next = safe_next(form.next.as_deref());
            return Ok(Html(templates::login(&viewer, &form.username, next, &errors)).into_response());
        }
    };

    let current = CurrentUser {
        id: user.id,
        username: user.username,
    };
    start_session(state, jar, &current)?;
    info!(user_id = current.id, "logged in");
    let target = safe_next(form.next.as_deref()).unwrap_or("/");
    Ok(Redirect::see_other(target).into_response())
}

#[handler]
pub async fn logout(jar: &CookieJar, viewer: Viewer) -> Redirect {
    if let Some(user) = viewer.0 {
        info!(user_id = user.id, "logged out");
    }
    jar.add(auth::expired_session_cookie());
    Redirect::see_other("/")
}

#[handler]
pub async fn register_form(viewer: Viewer) -> Html<String> {
    Html(templates::register(
        &viewer,
        &RegisterForm::default(),
        &FormErrors::default(),
    ))
}

#[handler]
pub async fn register(
    Data(state): Data<&Arc<AppState>>,
    jar: &CookieJar,
    viewer: Viewer,
    Form(form): Form<RegisterForm>,
) -> poem::Result<Response> {
    let form = match form.clean() {
        Ok(form) => form,
        Err((form, errors)) => {
            return Ok(Html(templates::register(&viewer, &form, &errors)).into_response());
        }
    };

    if state.store.find_user_by_username(&form.username).await?.is_some() {
        return Ok(username_taken(&viewer, &form));
    }

    let hash = auth::hash_password(&form.password)?;
    // A concurrent registration can still win the unique index.
    let user = match state.store.create_user(form.username.clone(), hash).await {
        Ok(user) => user,
        Err(ForumError::UsernameTaken) => return Ok(username_taken(&viewer, &form)),
        Err(e) => return Err(e.into()),
    };
    start_session(
        state,
        jar,
        &CurrentUser {
            id: user.id,
            username: user.username,
        },
    )?;
    Ok(Redirect::see_other("/").into_response())
}
