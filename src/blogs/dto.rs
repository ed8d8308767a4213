use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::blogs::repo::{BlogRow, CommentRow, LikeRow};

#[derive(Debug, Clone, Serialize)]
pub struct Poster {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct CommentDetail {
    pub id: Uuid,
    pub text: String,
    pub posted_by: Poster,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Full blog representation: poster, like set and comments resolved.
#[derive(Debug, Serialize)]
pub struct BlogDetail {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub genre: String,
    pub image_url: Option<String>,
    pub posted_by: Poster,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentDetail>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Listing shape for filtered queries (genre, user, search): no comments.
#[derive(Debug, Serialize)]
pub struct BlogSummary {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub genre: String,
    pub image_url: Option<String>,
    pub posted_by: Poster,
    pub likes: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub message: String,
    pub likes: Vec<Uuid>,
}

impl From<CommentRow> for CommentDetail {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            text: row.body,
            posted_by: Poster {
                id: row.posted_by,
                username: row.posted_by_username,
            },
            created_at: row.created_at,
        }
    }
}

impl BlogDetail {
    pub fn assemble(blog: BlogRow, likes: Vec<Uuid>, comments: Vec<CommentRow>) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            content: blog.content,
            genre: blog.genre,
            image_url: blog.image_url,
            posted_by: Poster {
                id: blog.posted_by,
                username: blog.posted_by_username,
            },
            likes,
            comments: comments.into_iter().map(CommentDetail::from).collect(),
            created_at: blog.created_at,
        }
    }

    /// Groups shared comment/like fetches back onto their blogs, preserving
    /// the blogs' order.
    pub fn assemble_all(
        blogs: Vec<BlogRow>,
        likes: Vec<LikeRow>,
        comments: Vec<CommentRow>,
    ) -> Vec<Self> {
        let mut likes_by_blog: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for like in likes {
            likes_by_blog.entry(like.blog_id).or_default().push(like.user_id);
        }
        let mut comments_by_blog: HashMap<Uuid, Vec<CommentRow>> = HashMap::new();
        for comment in comments {
            comments_by_blog
                .entry(comment.blog_id)
                .or_default()
                .push(comment);
        }
        blogs
            .into_iter()
            .map(|blog| {
                let likes = likes_by_blog.remove(&blog.id).unwrap_or_default();
                let comments = comments_by_blog.remove(&blog.id).unwrap_or_default();
                Self::assemble(blog, likes, comments)
            })
            .collect()
    }
}

impl BlogSummary {
    pub fn assemble_all(blogs: Vec<BlogRow>, likes: Vec<LikeRow>) -> Vec<Self> {
        let mut likes_by_blog: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for like in likes {
            likes_by_blog.entry(like.blog_id).or_default().push(like.user_id);
        }
        blogs
            .into_iter()
            .map(|blog| Self {
                id: blog.id,
                title: blog.title,
                content: blog.content,
                genre: blog.genre,
                image_url: blog.image_url,
                posted_by: Poster {
                    id: blog.posted_by,
                    username: blog.posted_by_username,
                },
                likes: likes_by_blog.remove(&blog.id).unwrap_or_default(),
                created_at: blog.created_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_row(id: Uuid) -> BlogRow {
        BlogRow {
            id,
            title: "t".into(),
            content: "c".into(),
            genre: "g".into(),
            image_url: None,
            posted_by: Uuid::new_v4(),
            posted_by_username: "alice".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn assemble_all_groups_by_blog_and_keeps_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let liker = Uuid::new_v4();
        let blogs = vec![blog_row(a), blog_row(b)];
        let likes = vec![LikeRow {
            blog_id: b,
            user_id: liker,
        }];
        let comments = vec![CommentRow {
            id: Uuid::new_v4(),
            blog_id: a,
            posted_by: Uuid::new_v4(),
            posted_by_username: "bob".into(),
            body: "hi".into(),
            created_at: OffsetDateTime::now_utc(),
        }];

        let details = BlogDetail::assemble_all(blogs, likes, comments);
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].id, a);
        assert_eq!(details[0].comments.len(), 1);
        assert!(details[0].likes.is_empty());
        assert_eq!(details[1].id, b);
        assert_eq!(details[1].likes, vec![liker]);
        assert!(details[1].comments.is_empty());
    }

    #[test]
    fn comment_detail_exposes_text_field() {
        let row = CommentRow {
            id: Uuid::new_v4(),
            blog_id: Uuid::new_v4(),
            posted_by: Uuid::new_v4(),
            posted_by_username: "bob".into(),
            body: "nice post".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&CommentDetail::from(row)).unwrap();
        assert!(json.contains("\"text\":\"nice post\""));
        assert!(json.contains("\"username\":\"bob\""));
    }
}
