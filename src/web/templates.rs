//! Server-rendered pages. Every user-supplied string goes through [`escape`].

use std::fmt::Write;

use crate::auth::{LOGIN_PATH, Viewer};
use crate::entities::{comment, post};
use crate::forms::{CommentForm, FormErrors, PostForm, RegisterForm, PASSWORD_MIN, TITLE_MAX, USERNAME_MAX};
use crate::store::Authored;

const DATE_FORMAT: &str = "%b %-d, %Y %H:%M";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(viewer: &Viewer, title: &str, body: &str) -> String {
    let account = match viewer.username() {
        Some(name) => format!(
            "<span>Hello, {}.</span>\
             <form class=\"inline\" method=\"post\" action=\"/accounts/logout/\">\
             <button type=\"submit\">Log out</button></form>",
            escape(name)
        ),
        None => format!(
            "<a href=\"/accounts/register/\">Register</a> <a href=\"{LOGIN_PATH}\">Log in</a>"
        ),
    };
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} | Forum</title>\n</head>\n<body>\n\
         <nav><a href=\"/\">Forum</a> <a href=\"/posts/\">Posts</a> {account}</nav>\n\
         <main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn error_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"errorlist\">");
    for message in messages {
        let _ = write!(out, "<li>{}</li>", escape(message));
    }
    out.push_str("</ul>");
    out
}

pub fn index(viewer: &Viewer) -> String {
    layout(
        viewer,
        "Home",
        "<h1>Forum</h1>\n<p>Read what people are talking about, then join in.</p>\n\
         <p><a href=\"/posts/\">Browse posts</a></p>",
    )
}

pub fn posts(viewer: &Viewer, posts: &[Authored<post::Model>]) -> String {
    let mut body = String::from("<h1>Posts</h1>\n<p><a href=\"/new_post/\">Add a new post</a></p>\n<ul>\n");
    if posts.is_empty() {
        body.push_str("<li>No posts have been added yet.</li>\n");
    }
    for entry in posts {
        let p = &entry.record;
        let _ = writeln!(
            body,
            "<li><a href=\"/posts/{}/\">{}</a> by {} on {}</li>",
            p.id,
            escape(&p.title),
            escape(&entry.author),
            p.date_added.format(DATE_FORMAT),
        );
    }
    body.push_str("</ul>");
    layout(viewer, "Posts", &body)
}

pub fn post(
    viewer: &Viewer,
    entry: &Authored<post::Model>,
    comments: &[Authored<comment::Model>],
) -> String {
    let p = &entry.record;
    let mut body = format!(
        "<article>\n<h1>{}</h1>\n<p class=\"meta\">by {} on {}</p>\n<div class=\"text\">{}</div>\n</article>\n\
         <h2>Comments</h2>\n<p><a href=\"/new_comment/{}/\">Add a comment</a></p>\n<ul>\n",
        escape(&p.title),
        escape(&entry.author),
        p.date_added.format(DATE_FORMAT),
        escape(&p.text),
        p.id,
    );
    if comments.is_empty() {
        body.push_str("<li>There are no comments for this post yet.</li>\n");
    }
    let viewer_id = viewer.0.as_ref().map(|u| u.id);
    for entry in comments {
        let c = &entry.record;
        let edit = if viewer_id == Some(c.author_id) {
            format!(" <a href=\"/edit_comment/{}/\">Edit comment</a>", c.id)
        } else {
            String::new()
        };
        let _ = writeln!(
            body,
            "<li><p class=\"meta\">{} on {}</p><p>{}</p>{edit}</li>",
            escape(&entry.author),
            c.date_added.format(DATE_FORMAT),
            escape(&c.content),
        );
    }
    body.push_str("</ul>");
    layout(viewer, &p.title, &body)
}

pub fn new_post(viewer: &Viewer, form: &PostForm, errors: &FormErrors) -> String {
    let body = format!(
        "<h1>Add a new post</h1>\n<form method=\"post\" action=\"/new_post/\">\n{general}\
         <p><label for=\"id_title\">Title:</label>{title_errors}\
         <input type=\"text\" name=\"title\" id=\"id_title\" maxlength=\"{TITLE_MAX}\" value=\"{title}\"></p>\n\
         <p><label for=\"id_text\">Text:</label>{text_errors}\
         <textarea name=\"text\" id=\"id_text\">{text}</textarea></p>\n\
         <button type=\"submit\">Add post</button>\n</form>",
        general = error_list(errors.general()),
        title_errors = error_list(errors.field("title")),
        title = escape(&form.title),
        text_errors = error_list(errors.field("text")),
        text = escape(&form.text),
    );
    layout(viewer, "New post", &body)
}

fn comment_form(action: &str, button: &str, form: &CommentForm, errors: &FormErrors) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">\n{general}\
         <p><label for=\"id_content\">Content:</label>{content_errors}\
         <textarea name=\"content\" id=\"id_content\">{content}</textarea></p>\n\
         <button type=\"submit\">{button}</button>\n</form>",
        general = error_list(errors.general()),
        content_errors = error_list(errors.field("content")),
        content = escape(&form.content),
    )
}

pub fn new_comment(viewer: &Viewer, p: &post::Model, form: &CommentForm, errors: &FormErrors) -> String {
    let body = format!(
        "<p><a href=\"/posts/{id}/\">{title}</a></p>\n<h1>Add a comment</h1>\n{form}",
        id = p.id,
        title = escape(&p.title),
        form = comment_form(&format!("/new_comment/{}/", p.id), "Add comment", form, errors),
    );
    layout(viewer, "New comment", &body)
}

pub fn edit_comment(
    viewer: &Viewer,
    p: &post::Model,
    c: &comment::Model,
    form: &CommentForm,
    errors: &FormErrors,
) -> String {
    let body = format!(
        "<p><a href=\"/posts/{id}/\">{title}</a></p>\n<h1>Edit comment</h1>\n{form}",
        id = p.id,
        title = escape(&p.title),
        form = comment_form(&format!("/edit_comment/{}/", c.id), "Save changes", form, errors),
    );
    layout(viewer, "Edit comment", &body)
}

pub fn login(viewer: &Viewer, username: &str, next: Option<&str>, errors: &FormErrors) -> String {
    let next_input = next
        .map(|n| format!("<input type=\"hidden\" name=\"next\" value=\"{}\">\n", escape(n)))
        .unwrap_or_default();
    let body = format!(
        "<h1>Log in</h1>\n<form method=\"post\" action=\"{LOGIN_PATH}\">\n{general}\
         <p><label for=\"id_username\">Username:</label>{username_errors}\
         <input type=\"text\" name=\"username\" id=\"id_username\" value=\"{username}\"></p>\n\
         <p><label for=\"id_password\">Password:</label>{password_errors}\
         <input type=\"password\" name=\"password\" id=\"id_password\"></p>\n\
         {next_input}<button type=\"submit\">Log in</button>\n</form>\n\
         <p>No account? <a href=\"/accounts/register/\">Register</a></p>",
        general = error_list(errors.general()),
        username_errors = error_list(errors.field("username")),
        username = escape(username),
        password_errors = error_list(errors.field("password")),
    );
    layout(viewer, "Log in", &body)
}

pub fn register(viewer: &Viewer, form: &RegisterForm, errors: &FormErrors) -> String {
    let body = format!(
        "<h1>Register</h1>\n<form method=\"post\" action=\"/accounts/register/\">\n{general}\
         <p><label for=\"id_username\">Username:</label>{username_errors}\
         <input type=\"text\" name=\"username\" id=\"id_username\" maxlength=\"{USERNAME_MAX}\" value=\"{username}\"></p>\n\
         <p><label for=\"id_password\">Password:</label>{password_errors}\
         <input type=\"password\" name=\"password\" id=\"id_password\" minlength=\"{PASSWORD_MIN}\"></p>\n\
         <p><label for=\"id_password_confirm\">Password confirmation:</label>{confirm_errors}\
         <input type=\"password\" name=\"password_confirm\" id=\"id_password_confirm\"></p>\n\
         <button type=\"submit\">Register</button>\n</form>",
        general = error_list(errors.general()),
        username_errors = error_list(errors.field("username")),
        username = escape(&form.username),
        password_errors = error_list(errors.field("password")),
        confirm_errors = error_list(errors.field("password_confirm")),
    );
    layout(viewer, "Register", &body)
}
