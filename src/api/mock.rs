//! Scripted [`MasteringApi`] used by the poller, classifier and orchestrator
//! tests. Mastering snapshots are served in order from a script; every other
//! call is answered from in-memory state.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use super::client::{AudioUpload, MasteringApi};
use super::error::ApiError;
use super::types::{Audio, AudioStatus, DownloadToken, Mastering, MasteringStatus, VideoStatus};
use crate::options::MasteringRequest;

pub const MASTERING_ID: i64 = 5;
pub const INPUT_AUDIO_ID: i64 = 1;
pub const OUTPUT_AUDIO_ID: i64 = 10;
pub const OUTPUT_VIDEO_ID: i64 = 20;

/// A mastering snapshot with the ids the scripted API hands out.
pub fn mastering(status: MasteringStatus, progression: f64) -> Mastering {
    Mastering {
        id: MASTERING_ID,
        status,
        failure_reason: String::new(),
        progression,
        input_audio_id: INPUT_AUDIO_ID,
        reference_audio_id: None,
        output_audio_id: (status == MasteringStatus::Succeeded).then_some(OUTPUT_AUDIO_ID),
        video_status: VideoStatus::Waiting,
        output_video_id: None,
    }
}

#[derive(Default)]
struct State {
    next_audio_id: i64,
    uploads: Vec<String>,
    audios: HashMap<i64, Audio>,
    requests: Vec<MasteringRequest>,
    script: VecDeque<Mastering>,
    observed: Vec<MasteringStatus>,
    existing: HashSet<i64>,
    deleted: Vec<i64>,
    download_base: String,
    fail_get_mastering: bool,
    fail_delete: bool,
}

pub struct ScriptedApi {
    state: Mutex<State>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_audio_id: INPUT_AUDIO_ID,
                download_base: "http://127.0.0.1:9".to_string(),
                ..Default::default()
            }),
        }
    }

    /// Snapshots returned by successive `get_mastering` calls.
    pub fn with_masterings(self, script: Vec<Mastering>) -> Self {
        self.state.lock().unwrap().script = script.into();
        self
    }

    /// Pre-sets the status an audio will report once uploaded.
    pub fn with_audio_status(self, id: i64, status: AudioStatus, reason: &str) -> Self {
        self.state.lock().unwrap().audios.insert(
            id,
            Audio {
                id,
                file_name: None,
                status,
                failure_reason: reason.to_string(),
            },
        );
        self
    }

    /// Base URL the signed download links point at.
    pub fn with_download_base(self, base: String) -> Self {
        self.state.lock().unwrap().download_base = base;
        self
    }

    pub fn failing_get_mastering(self) -> Self {
        self.state.lock().unwrap().fail_get_mastering = true;
        self
    }

    pub fn failing_delete(self) -> Self {
        self.state.lock().unwrap().fail_delete = true;
        self
    }

    pub fn uploads(&self) -> Vec<String> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn requests(&self) -> Vec<MasteringRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn observed_statuses(&self) -> Vec<MasteringStatus> {
        self.state.lock().unwrap().observed.clone()
    }

    pub fn deleted(&self) -> Vec<i64> {
        self.state.lock().unwrap().deleted.clone()
    }
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        message: "scripted failure".to_string(),
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        message: "not found".to_string(),
    }
}

impl MasteringApi for ScriptedApi {
    async fn create_audio(&self, upload: AudioUpload) -> Result<Audio, ApiError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_audio_id;
        state.next_audio_id += 1;
        state.uploads.push(upload.file_name.clone());
        let audio = state.audios.entry(id).or_insert_with(|| Audio {
            id,
            file_name: None,
            status: AudioStatus::Prepared,
            failure_reason: String::new(),
        });
        audio.file_name = Some(upload.file_name);
        let mut created = audio.clone();
        created.status = AudioStatus::Waiting;
        Ok(created)
    }

    async fn get_audio(&self, id: i64) -> Result<Audio, ApiError> {
        let state = self.state.lock().unwrap();
        state.audios.get(&id).cloned().ok_or_else(not_found)
    }

    async fn get_audio_download_token(&self, id: i64) -> Result<DownloadToken, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(DownloadToken {
            download_url: format!("{}/signed/audio/{id}", state.download_base),
            download_token: format!("audio-{id}"),
        })
    }

    async fn create_mastering(&self, request: &MasteringRequest) -> Result<Mastering, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        state.existing.insert(MASTERING_ID);
        let mut created = mastering(MasteringStatus::Waiting, 0.0);
        created.input_audio_id = request.input_audio_id;
        created.reference_audio_id = request.reference_audio_id;
        Ok(created)
    }

    async fn get_mastering(&self, id: i64) -> Result<Mastering, ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_get_mastering {
            return Err(server_error());
        }
        let reference = state.requests.last().and_then(|r| r.reference_audio_id);
        let mut next = state.script.pop_front().ok_or_else(not_found)?;
        next.id = id;
        if next.reference_audio_id.is_none() {
            next.reference_audio_id = reference;
        }
        state.observed.push(next.status);
        Ok(next)
    }

    async fn delete_mastering(&self, id: i64) -> Result<Option<Mastering>, ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete {
            return Err(server_error());
        }
        if state.existing.remove(&id) {
            state.deleted.push(id);
            Ok(Some(mastering(MasteringStatus::Succeeded, 1.0)))
        } else {
            Ok(None)
        }
    }

    async fn get_video_download_token(&self, id: i64) -> Result<DownloadToken, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(DownloadToken {
            download_url: format!("{}/signed/video/{id}", state.download_base),
            download_token: format!("video-{id}"),
        })
    }
}
