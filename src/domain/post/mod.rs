pub mod model;

pub use model::{to_entities, PostEntity};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as the backend serves it and the UI consumes it.
///
/// `owned_by_me` never comes over the wire; it is recomputed against the
/// current identity on every presentation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub author_id: i64,
    pub author: String,
    pub author_avatar: String,
    pub content: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub published: DateTime<Utc>,
    pub liked_by_me: bool,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    #[serde(skip)]
    pub owned_by_me: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AttachmentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttachmentType {
    Image,
}

/// A draft submitted through `save`; the server assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub content: String,
    pub attachment: Option<Attachment>,
}

/// Handle of an uploaded media file, returned by the media endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    pub id: String,
}

/// An in-memory file queued for upload.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content: Vec<u8>,
}
