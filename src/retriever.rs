//! Downloads finished artifacts through their signed URLs.
//!
//! The API hands out a short-lived pre-authorised link per resource; the
//! bytes are then fetched with a plain GET (no access token) and copied chunk
//! by chunk to a file or stdout.

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::{Client, Response};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::api::{ApiError, Mastering, MasteringApi, VideoStatus};
use crate::error::MasteringError;
use crate::state_machine::Stage;

/// Where an artifact is written. `-` on the command line means stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(arg))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            OutputTarget::Stdout => Path::new("-"),
            OutputTarget::File(path) => path,
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Stdout => f.write_str("stdout"),
            OutputTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches the mastered audio of a succeeded mastering into `target`.
/// Returns the number of bytes written.
pub async fn retrieve_audio(
    api: &impl MasteringApi,
    http: &Client,
    mastering: &Mastering,
    target: &OutputTarget,
) -> Result<u64, MasteringError> {
    let id = mastering.output_audio_id.ok_or_else(|| {
        MasteringError::JobFailed(format!(
            "mastering {} succeeded without an output audio",
            mastering.id
        ))
    })?;
    let token = api
        .get_audio_download_token(id)
        .await
        .map_err(MasteringError::api(Stage::Retrieving))?;
    let written = stream_to(http, &token.download_url, target, Stage::Retrieving).await?;
    tracing::info!("The output audio was saved to {target}");
    Ok(written)
}

/// Fetches the encoded video once its own status is terminal. Anything but
/// `succeeded` is a failure, even though the audio may already be saved.
pub async fn retrieve_video(
    api: &impl MasteringApi,
    http: &Client,
    mastering: &Mastering,
    path: &Path,
) -> Result<u64, MasteringError> {
    if mastering.video_status != VideoStatus::Succeeded {
        return Err(MasteringError::VideoFailed(mastering.video_status));
    }
    let id = mastering.output_video_id.ok_or_else(|| {
        MasteringError::JobFailed(format!(
            "video encode of mastering {} succeeded without an output video",
            mastering.id
        ))
    })?;
    let token = api
        .get_video_download_token(id)
        .await
        .map_err(MasteringError::api(Stage::VideoRetrieving))?;
    let target = OutputTarget::File(path.to_path_buf());
    let written = stream_to(http, &token.download_url, &target, Stage::VideoRetrieving).await?;
    tracing::info!("The output video was saved to {target}");
    Ok(written)
}

/// GETs `url` and copies the body to `target`. The destination is only
/// created (or truncated) once the server has answered with success.
pub async fn stream_to(
    http: &Client,
    url: &str,
    target: &OutputTarget,
    stage: Stage,
) -> Result<u64, MasteringError> {
    let mut response = fetch(http, url, stage).await?;
    match target {
        OutputTarget::Stdout => {
            let mut stdout = tokio::io::stdout();
            copy_body(&mut response, &mut stdout, stage, target.path()).await
        }
        OutputTarget::File(path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .map_err(MasteringError::io(stage, path.clone()))?;
            copy_body(&mut response, &mut file, stage, path).await
        }
    }
}

async fn fetch(http: &Client, url: &str, stage: Stage) -> Result<Response, MasteringError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| MasteringError::api(stage)(ApiError::from(e)))?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(MasteringError::api(stage)(ApiError::Status {
            status: status.as_u16(),
            message,
        }));
    }
    Ok(response)
}

async fn copy_body<W: AsyncWrite + Unpin>(
    response: &mut Response,
    out: &mut W,
    stage: Stage,
    path: &Path,
) -> Result<u64, MasteringError> {
    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| MasteringError::api(stage)(ApiError::from(e)))?
    {
        out.write_all(&chunk)
            .await
            .map_err(|e| MasteringError::io(stage, path)(e))?;
        written += chunk.len() as u64;
    }
    out.flush()
        .await
        .map_err(|e| MasteringError::io(stage, path)(e))?;
    Ok(written)
}
