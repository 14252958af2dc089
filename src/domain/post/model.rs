use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{Attachment, AttachmentType, Post};

/// One cached feed row. The attachment triple is flattened into nullable
/// columns; `visible` gates membership of the page window handed to the UI.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PostEntity {
    pub id: i64,
    pub author_id: i64,
    pub author: String,
    pub author_avatar: String,
    pub content: String,
    pub published: DateTime<Utc>,
    pub liked_by_me: bool,
    pub likes: i64,
    pub attachment_url: Option<String>,
    pub attachment_description: Option<String>,
    pub attachment_type: Option<String>,
    pub visible: bool,
}

impl PostEntity {
    pub fn from_dto(post: &Post, visible: bool) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            author: post.author.clone(),
            author_avatar: post.author_avatar.clone(),
            content: post.content.clone(),
            published: post.published,
            liked_by_me: post.liked_by_me,
            likes: post.likes,
            attachment_url: post.attachment.as_ref().map(|a| a.url.clone()),
            attachment_description: post.attachment.as_ref().map(|a| a.description.clone()),
            attachment_type: post.attachment.as_ref().map(|a| attachment_kind_str(a.kind)),
            visible,
        }
    }

    pub fn to_dto(&self) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id,
            author: self.author.clone(),
            author_avatar: self.author_avatar.clone(),
            content: self.content.clone(),
            published: self.published,
            liked_by_me: self.liked_by_me,
            likes: self.likes,
            attachment: self.attachment(),
            owned_by_me: false,
        }
    }

    fn attachment(&self) -> Option<Attachment> {
        let url = self.attachment_url.clone()?;
        let kind = parse_attachment_kind(self.attachment_type.as_deref()?)?;
        Some(Attachment {
            url,
            description: self.attachment_description.clone().unwrap_or_default(),
            kind,
        })
    }
}

pub fn to_entities(posts: &[Post], visible: bool) -> Vec<PostEntity> {
    posts
        .iter()
        .map(|post| PostEntity::from_dto(post, visible))
        .collect()
}

fn attachment_kind_str(kind: AttachmentType) -> String {
    match kind {
        AttachmentType::Image => "IMAGE".to_string(),
    }
}

fn parse_attachment_kind(raw: &str) -> Option<AttachmentType> {
    match raw {
        "IMAGE" => Some(AttachmentType::Image),
        _ => None,
    }
}
