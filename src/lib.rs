use std::sync::Arc;

use poem::{
    Endpoint, EndpointExt,
    middleware::{CookieJarManager, Cors, Tracing},
};
use poem_openapi::OpenApiService;

pub mod api;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod forms;
pub mod migration;
pub mod store;
pub mod web;

use auth::SessionKeys;
use config::Config;
use store::Store;

/// Shared by every request.
pub struct AppState {
    pub store: Store,
    pub sessions: SessionKeys,
}

impl AppState {
    pub async fn from_config(config: &Config) -> error::Result<Arc<Self>> {
        let store = Store::connect(&config.database_url).await?;
        Ok(Arc::new(Self {
            store,
            sessions: SessionKeys::new(&config.session_secret, config.session_ttl_hours),
        }))
    }
}

/// The whole application: HTML routes, the JSON API under `/api` and its docs under `/docs`.
pub fn build_app(state: Arc<AppState>) -> impl Endpoint {
    let api = OpenApiService::new(api::Api::new(state.clone()), "Forum API", "1.0").server("/api");
    let ui = api.swagger_ui();

    web::routes()
        .nest("/api", api.with(Cors::new()))
        .nest("/docs", ui)
        .with(Tracing)
        .with(CookieJarManager::new())
        .data(state)
}
