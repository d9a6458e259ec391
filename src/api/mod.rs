//! JSONPlaceholder REST client.

mod client;
mod types;

pub use client::{ApiClient, ApiError};
pub use types::{Address, Album, Comment, Company, Page, Photo, Post, User};
