pub mod client;
pub mod models;
pub mod resource;

pub use client::{build_http_client, ListQuery, ResourceApi, ResourceClient};
pub use resource::{total_pages, Resource, ResourceKind, PAGE_SIZE};
