use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  pub user_id: u64,
  pub id: u64,
  pub title: String,
  pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub username: String,
  pub email: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub website: String,
  #[serde(default)]
  pub address: Address,
  #[serde(default)]
  pub company: Company,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
  #[serde(default)]
  pub street: String,
  #[serde(default)]
  pub suite: String,
  #[serde(default)]
  pub city: String,
  #[serde(default)]
  pub zipcode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub catch_phrase: String,
  #[serde(default)]
  pub bs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub post_id: u64,
  pub id: u64,
  pub name: String,
  pub email: String,
  pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
  pub user_id: u64,
  pub id: u64,
  pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
  pub album_id: u64,
  pub id: u64,
  pub title: String,
  pub url: String,
  pub thumbnail_url: String,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
  pub items: Vec<T>,
  /// 1-based page number
  pub page: u32,
  pub limit: u32,
  /// Total item count, when the server reports one
  pub total: Option<u64>,
}

impl<T> Page<T> {
  /// Whether another page exists after this one.
  ///
  /// Uses the reported total when available; otherwise assumes a full page
  /// means there may be more.
  pub fn has_next(&self) -> bool {
    match self.total {
      Some(total) => u64::from(self.page) * u64::from(self.limit) < total,
      None => self.items.len() >= self.limit as usize,
    }
  }

  pub fn has_previous(&self) -> bool {
    self.page > 1
  }
}
