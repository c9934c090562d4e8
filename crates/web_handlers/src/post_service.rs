use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use auth_services::types::Claims;

use crate::error::ApiError;
use crate::post_types::*;

const POST_COLUMNS: &str = r#"
    p.id, p.author_email, p.author_name, p.author_image_url, p.place, p.location,
    p.section_id, p.description, p.lat, p.lng, p.approved, p.created_at
"#;

/// Service for user-submitted posts and the tag catalogue
pub struct PostService {
    pool: PgPool,
}

impl PostService {
    /// Creates a new instance of `PostService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists the posts `viewer` may see, newest first.
    pub async fn list(
        &self,
        viewer: &Viewer,
        filter: &PostFilter,
    ) -> Result<Vec<PostWithMedia>, ApiError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM posts p WHERE 1=1", POST_COLUMNS));

        match viewer {
            Viewer::Anonymous => {
                builder.push(" AND p.approved");
            }
            Viewer::Member(email) => {
                builder
                    .push(" AND (p.approved OR LOWER(p.author_email) = LOWER(")
                    .push_bind(email.clone())
                    .push("))");
            }
            Viewer::Admin => {
                if let Some(approved) = filter.approved {
                    builder.push(" AND p.approved = ").push_bind(approved);
                }
            }
        }
        if let Some(section) = &filter.section {
            builder.push(" AND p.section_id = ").push_bind(section.clone());
        }
        if let Some(tag) = &filter.tag {
            builder
                .push(" AND EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND t.tag_name = ")
                .push_bind(tag.clone())
                .push(")");
        }
        builder.push(" ORDER BY p.created_at DESC, p.id DESC");

        let posts = builder.build_query_as::<Post>().fetch_all(&self.pool).await?;
        self.attach_children(posts).await
    }

    /// Gets one post; hidden posts are reported as `NotFound`.
    pub async fn get(&self, post_id: i64, viewer: &Viewer) -> Result<PostWithMedia, ApiError> {
        let post = self.find(post_id).await?;
        if !viewer.can_see(&post) {
            return Err(ApiError::NotFound("Post"));
        }

        self.attach_children(vec![post])
            .await?
            .pop()
            .ok_or(ApiError::NotFound("Post"))
    }

    /// Creates a post authored by the caller, with its media and tags, in
    /// one transaction. Admin posts are approved immediately.
    pub async fn create(&self, author: &Claims, post: &NewPost) -> Result<PostWithMedia, ApiError> {
        let mut tx = self.pool.begin().await?;

        let post_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (
                author_email, author_name, author_image_url, place, location,
                section_id, description, lat, lng, approved
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&author.email)
        .bind(&author.name)
        .bind(&post.author_image)
        .bind(&post.place)
        .bind(&post.location)
        .bind(&post.section)
        .bind(&post.description)
        .bind(post.lat)
        .bind(post.lng)
        .bind(author.is_admin)
        .fetch_one(&mut *tx)
        .await?;

        for (order, url) in post.media.iter().enumerate() {
            sqlx::query(
                "INSERT INTO post_media (post_id, media_url, display_order) VALUES ($1, $2, $3)",
            )
            .bind(post_id)
            .bind(url)
            .bind(order as i32)
            .execute(&mut *tx)
            .await?;
        }

        for tag in &post.tags {
            sqlx::query("INSERT INTO post_tags (post_id, tag_name) VALUES ($1, $2)")
                .bind(post_id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO tags (tag_name) VALUES ($1) ON CONFLICT DO NOTHING")
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        log::info!(
            "📝 Post {} about '{}' submitted by {} (approved: {})",
            post_id,
            post.place,
            author.email,
            author.is_admin
        );
        self.get(post_id, &Viewer::Admin).await
    }

    /// Sets the moderation flag of a post.
    pub async fn set_approved(&self, post_id: i64, approved: bool) -> Result<(), ApiError> {
        let result = sqlx::query("UPDATE posts SET approved = $2 WHERE id = $1")
            .bind(post_id)
            .bind(approved)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Post"));
        }

        log::info!("Post {} approved = {}", post_id, approved);
        Ok(())
    }

    /// Deletes a post; only its author or an admin may do so.
    pub async fn delete(&self, post_id: i64, caller: &Claims) -> Result<(), ApiError> {
        let post = self.find(post_id).await?;
        caller.ensure_self_or_admin(&post.author_email, "delete posts by")?;

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        log::info!("🗑️ Post {} deleted by {}", post_id, caller.email);
        Ok(())
    }

    /// Lists the tag catalogue alphabetically.
    pub async fn list_tags(&self) -> Result<Vec<String>, ApiError> {
        let tags = sqlx::query_scalar("SELECT tag_name FROM tags ORDER BY tag_name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    /// Adds a tag to the catalogue; adding an existing tag is a no-op.
    pub async fn add_tag(&self, tag_name: &str) -> Result<(), ApiError> {
        sqlx::query("INSERT INTO tags (tag_name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(tag_name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find(&self, post_id: i64) -> Result<Post, ApiError> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts p WHERE p.id = $1",
            POST_COLUMNS
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("Post"))
    }

    async fn attach_children(&self, posts: Vec<Post>) -> Result<Vec<PostWithMedia>, ApiError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();

        let media = sqlx::query_as::<_, MediaRow>(
            r#"
            SELECT post_id, media_url FROM post_media
            WHERE post_id = ANY($1)
            ORDER BY post_id, display_order
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let tags = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT post_id, tag_name FROM post_tags
            WHERE post_id = ANY($1)
            ORDER BY post_id, tag_name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut media_by_post: HashMap<i64, Vec<String>> = HashMap::new();
        for row in media {
            media_by_post.entry(row.post_id).or_default().push(row.media_url);
        }
        let mut tags_by_post: HashMap<i64, Vec<String>> = HashMap::new();
        for row in tags {
            tags_by_post.entry(row.post_id).or_default().push(row.tag_name);
        }

        Ok(posts
            .into_iter()
            .map(|post| PostWithMedia {
                media: media_by_post.remove(&post.id).unwrap_or_default(),
                tags: tags_by_post.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }
}
