pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use client::{AudioUpload, MasteringApi, MasteringClient};
pub use error::ApiError;
pub use types::{Audio, AudioStatus, DownloadToken, Mastering, MasteringStatus, VideoStatus};
