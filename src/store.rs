use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::entities::{comment, post, user};
use crate::error::{ForumError, Result};
use crate::migration::Migrator;

/// A row together with its author's username.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authored<T> {
    pub record: T,
    pub author: String,
}

impl<T> Authored<T> {
    fn from_pair((record, author): (T, Option<user::Model>)) -> Self {
        Self {
            record,
            author: author.map(|u| u.username).unwrap_or_default(),
        }
    }
}

/// Data access for the forum. Every query the views need lives here.
#[derive(Clone, Debug)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    /// Connects and brings the schema up to date.
    pub async fn connect(url: &str) -> Result<Self> {
        let mut opts = ConnectOptions::new(url.to_owned());
        // every pooled connection to `:memory:` would otherwise be its own database
        if url.contains(":memory:") {
            opts.max_connections(1).min_connections(1);
        }
        let db = Database::connect(opts).await?;
        Migrator::up(&db, None).await?;
        info!("database ready");
        Ok(Self { db })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// All posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<Authored<post::Model>>> {
        let rows = post::Entity::find()
            .find_also_related(user::Entity)
            .order_by_desc(post::Column::DateAdded)
            .order_by_desc(post::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Authored::from_pair).collect())
    }

    /// One page of posts, newest first. `page` is zero-based.
    pub async fn page_posts(&self, page: u64, per_page: u64) -> Result<Vec<Authored<post::Model>>> {
        let rows = post::Entity::find()
            .find_also_related(user::Entity)
            .order_by_desc(post::Column::DateAdded)
            .order_by_desc(post::Column::Id)
            .paginate(&self.db, per_page)
            .fetch_page(page)
            .await?;
        Ok(rows.into_iter().map(Authored::from_pair).collect())
    }

    pub async fn find_post(&self, id: i32) -> Result<Authored<post::Model>> {
        post::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?
            .map(Authored::from_pair)
            .ok_or(ForumError::NotFound)
    }

    /// Comments on a post, newest first.
    pub async fn comments_for_post(&self, post_id: i32) -> Result<Vec<Authored<comment::Model>>> {
        let rows = comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .find_also_related(user::Entity)
            .order_by_desc(comment::Column::DateAdded)
            .order_by_desc(comment::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Authored::from_pair).collect())
    }

    pub async fn create_post(&self, author_id: i32, title: String, text: String) -> Result<post::Model> {
        let created = post::ActiveModel {
            title: Set(title),
            text: Set(text),
            author_id: Set(author_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        debug!(post_id = created.id, author_id, "post created");
        Ok(created)
    }

    pub async fn create_comment(
        &self,
        post_id: i32,
        author_id: i32,
        content: String,
    ) -> Result<comment::Model> {
        let created = comment::ActiveModel {
            content: Set(content),
            post_id: Set(post_id),
            author_id: Set(author_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        debug!(comment_id = created.id, post_id, author_id, "comment created");
        Ok(created)
    }

    /// Looks up a comment the requester is allowed to edit. A comment owned by
    /// anyone else is reported exactly like a missing one.
    pub async fn owned_comment(&self, comment_id: i32, requester_id: i32) -> Result<comment::Model> {
        let found = comment::Entity::find_by_id(comment_id)
            .one(&self.db)
            .await?
            .ok_or(ForumError::NotFound)?;
        if found.author_id != requester_id {
            debug!(comment_id, requester_id, "comment edit refused for non-author");
            return Err(ForumError::NotFound);
        }
        Ok(found)
    }

    pub async fn update_comment(&self, found: comment::Model, content: String) -> Result<comment::Model> {
        let mut am: comment::ActiveModel = found.into();
        am.content = Set(content);
        Ok(am.update(&self.db).await?)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    /// Fails with [`ForumError::UsernameTaken`] when the unique index rejects the name.
    pub async fn create_user(&self, username: String, password_hash: String) -> Result<user::Model> {
        let created = user::ActiveModel {
            username: Set(username),
            password_hash: Set(password_hash),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ForumError::UsernameTaken,
            _ => ForumError::Database(err),
        })?;
        info!(user_id = created.id, username = %created.username, "user registered");
        Ok(created)
    }
}
