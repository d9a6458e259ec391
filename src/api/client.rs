use crate::api::types::{Album, Comment, Page, Photo, Post, User};
use crate::config::ApiConfig;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Header JSONPlaceholder uses to report the size of a paginated collection.
const TOTAL_COUNT_HEADER: &str = "x-total-count";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("Network error: {0}")]
  Network(#[from] reqwest::Error),
  #[error("HTTP error! status: {status}")]
  Status { status: StatusCode, endpoint: String },
  #[error("Malformed response from {endpoint}: {source}")]
  Decode {
    endpoint: String,
    source: serde_json::Error,
  },
  #[error("Invalid API URL {url}: {source}")]
  InvalidUrl {
    url: String,
    source: url::ParseError,
  },
}

/// JSONPlaceholder API client
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
    let base_url = Url::parse(&config.base_url).map_err(|source| ApiError::InvalidUrl {
      url: config.base_url.clone(),
      source,
    })?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_millis(config.timeout_ms))
      .user_agent(concat!("taskdeck/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self { http, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn url(&self, endpoint: &str) -> Result<Url, ApiError> {
    let raw = format!(
      "{}/{}",
      self.base_url.as_str().trim_end_matches('/'),
      endpoint.trim_start_matches('/')
    );
    Url::parse(&raw).map_err(|source| ApiError::InvalidUrl { url: raw, source })
  }

  /// GET `endpoint` and decode the body, returning the reported total count too.
  async fn request<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    query: &[(&str, String)],
  ) -> Result<(T, Option<u64>), ApiError> {
    let result = self.request_inner(endpoint, query).await;
    if let Err(e) = &result {
      error!(endpoint, error = %e, "API request failed");
    }
    result
  }

  async fn request_inner<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    query: &[(&str, String)],
  ) -> Result<(T, Option<u64>), ApiError> {
    let url = self.url(endpoint)?;
    debug!(%url, ?query, "GET");

    let response = self
      .http
      .get(url)
      .header(reqwest::header::CONTENT_TYPE, "application/json")
      .query(query)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      return Err(ApiError::Status {
        status,
        endpoint: endpoint.to_string(),
      });
    }

    let total = response
      .headers()
      .get(TOTAL_COUNT_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.parse::<u64>().ok());

    let bytes = response.bytes().await?;
    let data = serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
      endpoint: endpoint.to_string(),
      source,
    })?;

    Ok((data, total))
  }

  async fn list<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    query: &[(&str, String)],
  ) -> Result<Vec<T>, ApiError> {
    self.request(endpoint, query).await.map(|(items, _)| items)
  }

  async fn page<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    page: u32,
    limit: u32,
  ) -> Result<Page<T>, ApiError> {
    let page = page.max(1);
    let query = [("_page", page.to_string()), ("_limit", limit.to_string())];
    let (items, total) = self.request(endpoint, &query).await?;
    Ok(Page {
      items,
      page,
      limit,
      total,
    })
  }

  // Posts

  pub async fn get_posts(&self) -> Result<Vec<Post>, ApiError> {
    self.list("/posts", &[]).await
  }

  pub async fn get_posts_page(&self, page: u32, limit: u32) -> Result<Page<Post>, ApiError> {
    self.page("/posts", page, limit).await
  }

  pub async fn get_post(&self, id: u64) -> Result<Post, ApiError> {
    self
      .request(&format!("/posts/{}", id), &[])
      .await
      .map(|(post, _)| post)
  }

  pub async fn get_posts_by_user(&self, user_id: u64) -> Result<Vec<Post>, ApiError> {
    self.list("/posts", &[("userId", user_id.to_string())]).await
  }

  pub async fn search_posts(&self, title: &str) -> Result<Vec<Post>, ApiError> {
    self.list("/posts", &[("title_like", title.to_string())]).await
  }

  // Users

  pub async fn get_users(&self) -> Result<Vec<User>, ApiError> {
    self.list("/users", &[]).await
  }

  pub async fn get_user(&self, id: u64) -> Result<User, ApiError> {
    self
      .request(&format!("/users/{}", id), &[])
      .await
      .map(|(user, _)| user)
  }

  pub async fn search_users(&self, name: &str) -> Result<Vec<User>, ApiError> {
    self.list("/users", &[("name_like", name.to_string())]).await
  }

  // Comments

  pub async fn get_comments_for_post(&self, post_id: u64) -> Result<Vec<Comment>, ApiError> {
    self.list("/comments", &[("postId", post_id.to_string())]).await
  }

  pub async fn get_comments_page(&self, page: u32, limit: u32) -> Result<Page<Comment>, ApiError> {
    self.page("/comments", page, limit).await
  }

  // Albums

  pub async fn get_albums(&self) -> Result<Vec<Album>, ApiError> {
    self.list("/albums", &[]).await
  }

  pub async fn get_albums_by_user(&self, user_id: u64) -> Result<Vec<Album>, ApiError> {
    self.list("/albums", &[("userId", user_id.to_string())]).await
  }

  // Photos

  pub async fn get_photos_page(&self, page: u32, limit: u32) -> Result<Page<Photo>, ApiError> {
    self.page("/photos", page, limit).await
  }

  pub async fn get_photos_by_album(&self, album_id: u64) -> Result<Vec<Photo>, ApiError> {
    self.list("/photos", &[("albumId", album_id.to_string())]).await
  }
}

impl std::fmt::Debug for ApiClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ApiClient")
      .field("base_url", &self.base_url.as_str())
      .finish_non_exhaustive()
  }
}
