use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;

use crate::domain::auth::{AppAuth, AuthToken};
use crate::domain::post::{Media, MediaUpload, NewPost, Post};
use crate::error::{AppError, AppResult};

/// The posts backend as the sync core sees it. Every method returns a
/// classified error: transport failures map to `Network`, non-2xx responses
/// to `Api { status, message }`.
#[async_trait]
pub trait PostApi: Send + Sync {
    async fn get_latest(&self, count: i64) -> AppResult<Vec<Post>>;
    async fn get_before(&self, id: i64, count: i64) -> AppResult<Vec<Post>>;
    async fn get_after(&self, id: i64, count: i64) -> AppResult<Vec<Post>>;
    async fn get_newer(&self, id: i64) -> AppResult<Vec<Post>>;
    async fn like_by_id(&self, id: i64) -> AppResult<Post>;
    async fn unlike_by_id(&self, id: i64) -> AppResult<Post>;
    async fn save(&self, post: &NewPost) -> AppResult<Post>;
    async fn delete_by_id(&self, id: i64) -> AppResult<()>;
    async fn upload(&self, upload: MediaUpload) -> AppResult<Media>;
    async fn sign_in(&self, login: &str, pass: &str) -> AppResult<AuthToken>;
    async fn sign_up(&self, login: &str, pass: &str, name: &str) -> AppResult<AuthToken>;
}

/// reqwest-backed implementation. The bearer token is read from [`AppAuth`]
/// per request, so identity changes apply without rebuilding the client.
pub struct HttpPostApi {
    http_client: reqwest::Client,
    base_url: String,
    auth: Arc<AppAuth>,
}

impl HttpPostApi {
    pub fn new(base_url: String, auth: Arc<AppAuth>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url,
            auth,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/api/{}", self.base_url.trim_end_matches('/'), path);
        let mut request = self.http_client.request(method, url);
        if let Some(AuthToken { token, .. }) = self.auth.token() {
            request = request.header("Authorization", token);
        }
        request
    }
}

async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AppError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json::<T>().await?)
}

async fn expect_success(response: reqwest::Response) -> AppResult<()> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AppError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(())
}

#[async_trait]
impl PostApi for HttpPostApi {
    async fn get_latest(&self, count: i64) -> AppResult<Vec<Post>> {
        let response = self
            .request(reqwest::Method::GET, "posts/latest")
            .query(&[("count", count)])
            .send()
            .await?;
        parse(response).await
    }

    async fn get_before(&self, id: i64, count: i64) -> AppResult<Vec<Post>> {
        let response = self
            .request(reqwest::Method::GET, &format!("posts/{id}/before"))
            .query(&[("count", count)])
            .send()
            .await?;
        parse(response).await
    }

    async fn get_after(&self, id: i64, count: i64) -> AppResult<Vec<Post>> {
        let response = self
            .request(reqwest::Method::GET, &format!("posts/{id}/after"))
            .query(&[("count", count)])
            .send()
            .await?;
        parse(response).await
    }

    async fn get_newer(&self, id: i64) -> AppResult<Vec<Post>> {
        let response = self
            .request(reqwest::Method::GET, &format!("posts/{id}/newer"))
            .send()
            .await?;
        parse(response).await
    }

    async fn like_by_id(&self, id: i64) -> AppResult<Post> {
        let response = self
            .request(reqwest::Method::POST, &format!("posts/{id}/likes"))
            .send()
            .await?;
        parse(response).await
    }

    async fn unlike_by_id(&self, id: i64) -> AppResult<Post> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("posts/{id}/likes"))
            .send()
            .await?;
        parse(response).await
    }

    async fn save(&self, post: &NewPost) -> AppResult<Post> {
        // The server assigns the real id; drafts always go up with id 0.
        let body = serde_json::json!({
            "id": 0,
            "content": post.content,
            "attachment": post.attachment,
        });
        let response = self
            .request(reqwest::Method::POST, "posts")
            .json(&body)
            .send()
            .await?;
        parse(response).await
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("posts/{id}"))
            .send()
            .await?;
        expect_success(response).await
    }

    async fn upload(&self, upload: MediaUpload) -> AppResult<Media> {
        let part = multipart::Part::bytes(upload.content).file_name(upload.file_name);
        let form = multipart::Form::new().part("file", part);
        let response = self
            .request(reqwest::Method::POST, "media")
            .multipart(form)
            .send()
            .await?;
        parse(response).await
    }

    async fn sign_in(&self, login: &str, pass: &str) -> AppResult<AuthToken> {
        let params = [("login", login), ("pass", pass)];
        let response = self
            .request(reqwest::Method::POST, "users/authentication")
            .form(&params)
            .send()
            .await?;
        parse(response).await
    }

    async fn sign_up(&self, login: &str, pass: &str, name: &str) -> AppResult<AuthToken> {
        let params = [("login", login), ("pass", pass), ("name", name)];
        let response = self
            .request(reqwest::Method::POST, "users/registration")
            .form(&params)
            .send()
            .await?;
        parse(response).await
    }
}
