//! HTML surface of the forum.

use poem::{EndpointExt, Route, get, post};

use crate::auth::LoginRequired;

pub mod accounts;
pub mod forums;
pub mod templates;

pub fn routes() -> Route {
    Route::new()
        .at("/", get(forums::index))
        .at("/posts/", get(forums::post_list))
        .at("/posts/:post_id/", get(forums::post_detail))
        .at(
            "/new_post/",
            get(forums::new_post_form)
                .post(forums::create_post)
                .with(LoginRequired),
        )
        .at(
            "/new_comment/:post_id/",
            get(forums::new_comment_form)
                .post(forums::create_comment)
                .with(LoginRequired),
        )
        .at(
            "/edit_comment/:comment_id/",
            get(forums::edit_comment_form)
                .post(forums::update_comment)
                .with(LoginRequired),
        )
        .at(
            "/accounts/login/",
            get(accounts::login_form).post(accounts::login),
        )
        .at("/accounts/logout/", post(accounts::logout))
        .at(
            "/accounts/register/",
            get(accounts::register_form).post(accounts::register),
        )
}
