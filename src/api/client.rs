use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::{Audio, DownloadToken, Mastering};
use crate::options::MasteringRequest;

const API_URL: &str = "https://api.bakuage.com/v1";

/// A byte stream to be uploaded as a new audio resource.
pub struct AudioUpload {
    /// File name reported in the multipart part.
    pub file_name: String,
    /// Known length of the stream, if any (stdin has none).
    pub length: Option<u64>,
    pub body: reqwest::Body,
}

/// Operations the orchestrator needs from the AI Mastering API.
///
/// [`MasteringClient`] is the HTTP implementation; tests script their own.
#[allow(async_fn_in_trait)]
pub trait MasteringApi {
    async fn create_audio(&self, upload: AudioUpload) -> Result<Audio, ApiError>;

    async fn get_audio(&self, id: i64) -> Result<Audio, ApiError>;

    async fn get_audio_download_token(&self, id: i64) -> Result<DownloadToken, ApiError>;

    async fn create_mastering(&self, request: &MasteringRequest) -> Result<Mastering, ApiError>;

    async fn get_mastering(&self, id: i64) -> Result<Mastering, ApiError>;

    /// Deletes a mastering. Returns `None` when it no longer exists.
    async fn delete_mastering(&self, id: i64) -> Result<Option<Mastering>, ApiError>;

    async fn get_video_download_token(&self, id: i64) -> Result<DownloadToken, ApiError>;
}

/// Builds the HTTP client shared by API calls and signed-URL downloads.
///
/// Only the connect phase is bounded: uploads and downloads of full mixes
/// can legitimately take minutes.
pub fn build_http_client(user_agent: &str) -> Result<Client, ApiError> {
    let client = Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

pub struct MasteringClient {
    access_token: String,
    client: Client,
    base_url: String,
}

impl MasteringClient {
    pub fn new(access_token: String, client: Client) -> Self {
        Self::with_base_url(access_token, client, API_URL.to_string())
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(access_token: String, client: Client, base_url: String) -> Self {
        Self {
            access_token,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json::<T>().await?)
}

impl MasteringApi for MasteringClient {
    async fn create_audio(&self, upload: AudioUpload) -> Result<Audio, ApiError> {
        let part = match upload.length {
            Some(len) => Part::stream_with_length(upload.body, len),
            None => Part::stream(upload.body),
        }
        .file_name(upload.file_name);
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/audios"))
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn get_audio(&self, id: i64) -> Result<Audio, ApiError> {
        self.get_json(&format!("/audios/{id}")).await
    }

    async fn get_audio_download_token(&self, id: i64) -> Result<DownloadToken, ApiError> {
        self.get_json(&format!("/audios/{id}/download_token")).await
    }

    async fn create_mastering(&self, request: &MasteringRequest) -> Result<Mastering, ApiError> {
        let response = self
            .client
            .post(self.url("/masterings"))
            .bearer_auth(&self.access_token)
            .form(&request.form_fields())
            .send()
            .await?;
        decode(response).await
    }

    async fn get_mastering(&self, id: i64) -> Result<Mastering, ApiError> {
        self.get_json(&format!("/masterings/{id}")).await
    }

    async fn delete_mastering(&self, id: i64) -> Result<Option<Mastering>, ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/masterings/{id}")))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        match decode::<Mastering>(response).await {
            Ok(mastering) => Ok(Some(mastering)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_video_download_token(&self, id: i64) -> Result<DownloadToken, ApiError> {
        self.get_json(&format!("/videos/{id}/download_token")).await
    }
}
