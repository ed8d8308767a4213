use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Blog row with the poster's username already resolved.
#[derive(Debug, Clone, FromRow)]
pub struct BlogRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub genre: String,
    pub image_url: Option<String>,
    pub posted_by: Uuid,
    pub posted_by_username: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub posted_by: Uuid,
    pub posted_by_username: String,
    pub body: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct LikeRow {
    pub blog_id: Uuid,
    pub user_id: Uuid,
}

const BLOG_SELECT: &str = r#"
    SELECT b.id, b.title, b.content, b.genre, b.image_url, b.posted_by,
           u.username AS posted_by_username, b.created_at
    FROM blogs b
    JOIN users u ON u.id = b.posted_by
"#;

/// Escapes `\`, `%` and `_` so user input matches literally under ILIKE.
pub fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl BlogRow {
    pub async fn insert(
        db: &PgPool,
        title: &str,
        content: &str,
        genre: &str,
        image_url: Option<&str>,
        posted_by: Uuid,
    ) -> anyhow::Result<BlogRow> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO blogs (title, content, genre, image_url, posted_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(genre)
        .bind(image_url)
        .bind(posted_by)
        .fetch_one(db)
        .await?;

        let blog = Self::find(db, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("blog vanished after insert"))?;
        Ok(blog)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<BlogRow>> {
        let blog = sqlx::query_as::<_, BlogRow>(&format!("{BLOG_SELECT} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(blog)
    }

    /// All blogs, newest first.
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<BlogRow>> {
        let blogs =
            sqlx::query_as::<_, BlogRow>(&format!("{BLOG_SELECT} ORDER BY b.created_at DESC"))
                .fetch_all(db)
                .await?;
        Ok(blogs)
    }

    /// Case-insensitive substring match on genre.
    pub async fn by_genre(db: &PgPool, genre: &str) -> anyhow::Result<Vec<BlogRow>> {
        let pattern = format!("%{}%", escape_like(genre));
        let blogs = sqlx::query_as::<_, BlogRow>(&format!(
            "{BLOG_SELECT} WHERE b.genre ILIKE $1 ORDER BY b.created_at DESC"
        ))
        .bind(pattern)
        .fetch_all(db)
        .await?;
        Ok(blogs)
    }

    pub async fn by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<BlogRow>> {
        let blogs = sqlx::query_as::<_, BlogRow>(&format!(
            "{BLOG_SELECT} WHERE b.posted_by = $1 ORDER BY b.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(blogs)
    }

    /// Literal substring search over title, content and genre.
    pub async fn search(db: &PgPool, query: &str) -> anyhow::Result<Vec<BlogRow>> {
        let pattern = format!("%{}%", escape_like(query));
        let blogs = sqlx::query_as::<_, BlogRow>(&format!(
            "{BLOG_SELECT}
             WHERE b.title ILIKE $1 OR b.content ILIKE $1 OR b.genre ILIKE $1
             ORDER BY b.created_at DESC"
        ))
        .bind(pattern)
        .fetch_all(db)
        .await?;
        Ok(blogs)
    }

    /// Replaces only the supplied fields; returns None when the blog is absent.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
        genre: Option<&str>,
        image_url: Option<&str>,
    ) -> anyhow::Result<Option<BlogRow>> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE blogs
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                genre = COALESCE($4, genre),
                image_url = COALESCE($5, image_url)
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(genre)
        .bind(image_url)
        .fetch_optional(db)
        .await?;

        match updated {
            Some(id) => Self::find(db, id).await,
            None => Ok(None),
        }
    }

    /// Removes the blog; likes and comments go with it via cascade.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.blog_id, c.posted_by, u.username AS posted_by_username,
           c.body, c.created_at
    FROM comments c
    JOIN users u ON u.id = c.posted_by
"#;

impl CommentRow {
    pub async fn insert(
        db: &PgPool,
        blog_id: Uuid,
        posted_by: Uuid,
        body: &str,
    ) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO comments (blog_id, posted_by, body) VALUES ($1, $2, $3)")
            .bind(blog_id)
            .bind(posted_by)
            .bind(body)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn for_blog(db: &PgPool, blog_id: Uuid) -> anyhow::Result<Vec<CommentRow>> {
        let comments = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.blog_id = $1 ORDER BY c.created_at"
        ))
        .bind(blog_id)
        .fetch_all(db)
        .await?;
        Ok(comments)
    }

    pub async fn for_blogs(db: &PgPool, blog_ids: &[Uuid]) -> anyhow::Result<Vec<CommentRow>> {
        let comments = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.blog_id = ANY($1) ORDER BY c.created_at"
        ))
        .bind(blog_ids)
        .fetch_all(db)
        .await?;
        Ok(comments)
    }

    pub async fn find(
        db: &PgPool,
        blog_id: Uuid,
        comment_id: Uuid,
    ) -> anyhow::Result<Option<CommentRow>> {
        let comment = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.blog_id = $1 AND c.id = $2"
        ))
        .bind(blog_id)
        .bind(comment_id)
        .fetch_optional(db)
        .await?;
        Ok(comment)
    }

    /// Removes exactly this comment.
    pub async fn delete(db: &PgPool, comment_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(db)
            .await?;
        Ok(())
    }
}

pub async fn likes_for_blog(db: &PgPool, blog_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
    let likes: Vec<Uuid> =
        sqlx::query_scalar("SELECT user_id FROM blog_likes WHERE blog_id = $1")
            .bind(blog_id)
            .fetch_all(db)
            .await?;
    Ok(likes)
}

pub async fn likes_for_blogs(db: &PgPool, blog_ids: &[Uuid]) -> anyhow::Result<Vec<LikeRow>> {
    let likes = sqlx::query_as::<_, LikeRow>(
        "SELECT blog_id, user_id FROM blog_likes WHERE blog_id = ANY($1)",
    )
    .bind(blog_ids)
    .fetch_all(db)
    .await?;
    Ok(likes)
}

/// Toggles the caller's membership in the like set. Both branches are single
/// atomic statements, so concurrent toggles never lose updates. Returns
/// whether the blog is now liked, plus the resulting set.
pub async fn toggle_like(
    db: &PgPool,
    blog_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<(bool, Vec<Uuid>)> {
    let removed = sqlx::query("DELETE FROM blog_likes WHERE blog_id = $1 AND user_id = $2")
        .bind(blog_id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

    let liked = if removed == 0 {
        sqlx::query(
            "INSERT INTO blog_likes (blog_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(blog_id)
        .bind(user_id)
        .execute(db)
        .await?;
        true
    } else {
        false
    };

    let likes = likes_for_blog(db, blog_id).await?;
    Ok((liked, likes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like(r"back\slash"), r"back\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn escape_like_leaves_regex_metacharacters_alone() {
        // ILIKE has no regex semantics; `<script>` must come through literally.
        assert_eq!(escape_like("<script>"), "<script>");
        assert_eq!(escape_like("a.b*c"), "a.b*c");
    }
}
