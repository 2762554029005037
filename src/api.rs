//! Read-only JSON view of the forum.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use poem_openapi::{
    Object, OpenApi,
    param::{Path, Query},
    payload::Json,
};

use crate::AppState;
use crate::entities::{comment, post};
use crate::store::Authored;

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

#[derive(Object)]
struct PostView {
    id: i32,
    title: String,
    text: String,
    author: String,
    date_added: DateTime<Utc>,
}

impl From<Authored<post::Model>> for PostView {
    fn from(entry: Authored<post::Model>) -> Self {
        let p = entry.record;
        Self {
            id: p.id,
            title: p.title,
            text: p.text,
            author: entry.author,
            date_added: p.date_added,
        }
    }
}

#[derive(Object)]
struct CommentView {
    id: i32,
    post_id: i32,
    content: String,
    author: String,
    date_added: DateTime<Utc>,
}

impl From<Authored<comment::Model>> for CommentView {
    fn from(entry: Authored<comment::Model>) -> Self {
        let c = entry.record;
        Self {
            id: c.id,
            post_id: c.post_id,
            content: c.content,
            author: entry.author,
            date_added: c.date_added,
        }
    }
}

pub struct Api {
    state: Arc<AppState>,
}

impl Api {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl Api {
    /// Posts, newest first (paginated)
    #[oai(path = "/posts", method = "get")]
    async fn list_posts(
        &self,
        Query(page): Query<Option<u64>>,
        Query(per_page): Query<Option<u64>>,
    ) -> poem::Result<Json<Vec<PostView>>> {
        let page = page.unwrap_or(1).max(1) - 1;
        let per = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let rows = self.state.store.page_posts(page, per).await?;
        Ok(Json(rows.into_iter().map(PostView::from).collect()))
    }

    #[oai(path = "/posts/:id", method = "get")]
    async fn get_post(&self, Path(id): Path<i32>) -> poem::Result<Json<PostView>> {
        let post = self.state.store.find_post(id).await?;
        Ok(Json(post.into()))
    }

    /// Comments on a post, newest first
    #[oai(path = "/posts/:id/comments", method = "get")]
    async fn list_comments(&self, Path(id): Path<i32>) -> poem::Result<Json<Vec<CommentView>>> {
        self.state.store.find_post(id).await?;
        let rows = self.state.store.comments_for_post(id).await?;
        Ok(Json(rows.into_iter().map(CommentView::from).collect()))
    }
}
