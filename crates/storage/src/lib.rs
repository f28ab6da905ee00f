#![forbid(unsafe_code)]

pub mod json;
pub mod repository;

pub use json::{JsonStore, JsonStoreError};
pub use repository::{
    AnalyticsRepository, InMemoryRepository, ProgressRepository, Storage, StorageError,
};
