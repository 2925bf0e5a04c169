//! Uploads local audio (a file or stdin) as a new remote audio resource.

use std::io;
use std::path::PathBuf;

use reqwest::Body;
use tokio_util::io::ReaderStream;

use crate::api::{Audio, AudioUpload, MasteringApi};
use crate::error::MasteringError;
use crate::state_machine::Stage;

/// Where audio bytes come from. `-` on the command line means stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Stdin,
    File(PathBuf),
}

impl AudioSource {
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            AudioSource::Stdin
        } else {
            AudioSource::File(PathBuf::from(arg))
        }
    }

    /// Name sent with the multipart upload.
    pub fn file_name(&self) -> String {
        match self {
            AudioSource::Stdin => "stdin".to_string(),
            AudioSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
        }
    }
}

/// Streams `source` to the service and returns the created audio.
///
/// Every call creates a new resource; uploading the same bytes twice yields
/// two ids. The file handle lives only as long as the request body.
pub async fn upload_audio(
    api: &impl MasteringApi,
    source: &AudioSource,
    stage: Stage,
) -> Result<Audio, MasteringError> {
    let upload = match source {
        AudioSource::Stdin => AudioUpload {
            file_name: source.file_name(),
            length: None,
            body: Body::wrap_stream(ReaderStream::new(tokio::io::stdin())),
        },
        AudioSource::File(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(MasteringError::io(stage, path.clone()))?;
            let metadata = file
                .metadata()
                .await
                .map_err(MasteringError::io(stage, path.clone()))?;
            if metadata.is_dir() {
                return Err(MasteringError::io(stage, path.clone())(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "is a directory",
                )));
            }
            AudioUpload {
                file_name: source.file_name(),
                length: metadata.is_file().then_some(metadata.len()),
                body: Body::wrap_stream(ReaderStream::new(file)),
            }
        }
    };

    let audio = api
        .create_audio(upload)
        .await
        .map_err(MasteringError::api(stage))?;
    tracing::info!(
        "The {} audio was uploaded id {}",
        if stage == Stage::UploadingReference {
            "reference"
        } else {
            "input"
        },
        audio.id
    );
    Ok(audio)
}
