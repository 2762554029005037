use std::sync::{Arc, LazyLock};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use poem::{
    Endpoint, FromRequest, IntoResponse, Middleware, Request, RequestBody, Response,
    web::{
        Redirect,
        cookie::{Cookie, SameSite},
    },
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::AppState;
use crate::error::Result;

pub const SESSION_COOKIE: &str = "forum_session";
pub const LOGIN_PATH: &str = "/accounts/login/";

/// The authenticated user behind a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Checked against when the username is unknown, so both paths cost one argon2 run.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("dummy password for timing").ok());

/// Verifies `password` against the stored hash, or burns an equivalent check
/// against a throwaway hash when there is no such user.
pub fn verify_user_password(password: &str, stored: Option<&str>) -> Result<bool> {
    match stored {
        Some(hash) => verify_password(password, hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            Ok(false)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    iat: i64,
    exp: i64,
}

/// Signs and checks the session token carried in [`SESSION_COOKIE`].
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &CurrentUser) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Anything that fails to decode, is expired, or carries a bad subject is anonymous.
    pub fn verify(&self, token: &str) -> Option<CurrentUser> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| debug!(error = %e, "rejected session token"))
            .ok()?;
        let id = data.claims.sub.parse().ok()?;
        Some(CurrentUser {
            id,
            username: data.claims.username,
        })
    }

    pub fn cookie(&self, token: String) -> Cookie {
        let mut cookie = Cookie::new_with_str(SESSION_COOKIE, token);
        cookie.set_http_only(true);
        cookie.set_path("/");
        cookie.set_same_site(SameSite::Lax);
        if let Ok(max_age) = self.ttl.to_std() {
            cookie.set_max_age(max_age);
        }
        cookie
    }
}

/// A cookie that overwrites the session cookie and expires immediately.
pub fn expired_session_cookie() -> Cookie {
    let mut cookie = Cookie::new_with_str(SESSION_COOKIE, "");
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(std::time::Duration::ZERO);
    cookie
}

fn current_user(req: &Request) -> Option<CurrentUser> {
    if let Some(user) = req.extensions().get::<CurrentUser>() {
        return Some(user.clone());
    }
    let Some(state) = req.data::<Arc<AppState>>() else {
        warn!("application state missing, treating request as anonymous");
        return None;
    };
    let cookie = req.cookie().get(SESSION_COOKIE)?;
    state.sessions.verify(cookie.value_str())
}

/// The possibly anonymous user making the request.
#[derive(Clone, Debug, Default)]
pub struct Viewer(pub Option<CurrentUser>);

impl Viewer {
    pub fn username(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.username.as_str())
    }
}

impl From<&CurrentUser> for Viewer {
    fn from(user: &CurrentUser) -> Self {
        Viewer(Some(user.clone()))
    }
}

impl<'a> FromRequest<'a> for Viewer {
    async fn from_request(req: &'a Request, _body: &mut RequestBody) -> poem::Result<Self> {
        Ok(Viewer(current_user(req)))
    }
}

/// Sends anonymous requests to the login page. Authenticated requests reach the
/// wrapped endpoint with a [`CurrentUser`] in the request extensions.
pub struct LoginRequired;

impl<E: Endpoint> Middleware<E> for LoginRequired {
    type Output = LoginRequiredEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        LoginRequiredEndpoint { ep }
    }
}

pub struct LoginRequiredEndpoint<E> {
    ep: E,
}

impl<E: Endpoint> Endpoint for LoginRequiredEndpoint<E> {
    type Output = Response;

    async fn call(&self, mut req: Request) -> poem::Result<Self::Output> {
        match current_user(&req) {
            Some(user) => {
                req.extensions_mut().insert(user);
                self.ep.call(req).await.map(IntoResponse::into_response)
            }
            None => {
                let target = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or_else(|| req.uri().path());
                debug!(target, "anonymous request sent to login");
                Ok(Redirect::see_other(login_url(target)).into_response())
            }
        }
    }
}

pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}
