//! Wire types returned by the AI Mastering API.
//!
//! Only the fields the CLI reads are modelled. Status strings are mapped to
//! enums; values this client does not know about land in an `Unknown`
//! variant instead of failing deserialization.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Failure cause reported on a mastering whose input or reference audio could
/// not be prepared by the service.
pub const FAILED_TO_PREPARE: &str = "failed_to_prepare";

/// Lifecycle of an uploaded audio resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStatus {
    Waiting,
    Preparing,
    Prepared,
    Failed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for AudioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AudioStatus::Waiting => "waiting",
            AudioStatus::Preparing => "preparing",
            AudioStatus::Prepared => "prepared",
            AudioStatus::Failed => "failed",
            AudioStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Lifecycle of a mastering job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteringStatus {
    Waiting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Expired,
    #[serde(other)]
    Unknown,
}

impl MasteringStatus {
    /// `waiting` and `processing` are the only non-terminal states.
    pub fn is_pending(self) -> bool {
        matches!(self, MasteringStatus::Waiting | MasteringStatus::Processing)
    }
}

impl fmt::Display for MasteringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MasteringStatus::Waiting => "waiting",
            MasteringStatus::Processing => "processing",
            MasteringStatus::Succeeded => "succeeded",
            MasteringStatus::Failed => "failed",
            MasteringStatus::Canceled => "canceled",
            MasteringStatus::Expired => "expired",
            MasteringStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Video encode sub-status of a mastering. Advances independently of the
/// audio status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    #[default]
    Waiting,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl VideoStatus {
    pub fn is_pending(self) -> bool {
        self == VideoStatus::Waiting
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VideoStatus::Waiting => "waiting",
            VideoStatus::Succeeded => "succeeded",
            VideoStatus::Failed => "failed",
            VideoStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Reads an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An audio resource as reported by `GET /audios/{id}` and `POST /audios`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audio {
    pub id: i64,
    #[serde(default)]
    pub file_name: Option<String>,
    pub status: AudioStatus,
    /// Only meaningful when `status` is `failed`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub failure_reason: String,
}

/// A mastering job as reported by `POST /masterings` and `GET /masterings/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mastering {
    pub id: i64,
    pub status: MasteringStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failure_reason: String,
    /// Fraction in `[0, 1]`; the service does not guarantee it increases.
    #[serde(default, deserialize_with = "null_as_default")]
    pub progression: f64,
    pub input_audio_id: i64,
    #[serde(default)]
    pub reference_audio_id: Option<i64>,
    #[serde(default)]
    pub output_audio_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_status: VideoStatus,
    #[serde(default)]
    pub output_video_id: Option<i64>,
}

impl Mastering {
    /// Progression as a whole percentage, clamped to `0..=100`.
    pub fn progress_percent(&self) -> u64 {
        (self.progression * 100.0).round().clamp(0.0, 100.0) as u64
    }
}

/// A short-lived signed URL for fetching a resource's bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadToken {
    pub download_url: String,
    #[serde(default)]
    pub download_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mastering_deserialize_from_api_format() {
        let json = r#"{
            "id": 42,
            "status": "processing",
            "failure_reason": "",
            "progression": 0.4,
            "input_audio_id": 7,
            "output_audio_id": null,
            "video_status": "waiting",
            "mode": "custom",
            "created_at": "2026-01-01T00:00:00Z"
        }"#;
        let m: Mastering = serde_json::from_str(json).unwrap();
        assert_eq!(m.id, 42);
        assert_eq!(m.status, MasteringStatus::Processing);
        assert_eq!(m.input_audio_id, 7);
        assert_eq!(m.output_audio_id, None);
        assert_eq!(m.reference_audio_id, None);
        assert_eq!(m.progress_percent(), 40);
    }

    #[test]
    fn unknown_status_values_are_tolerated() {
        let json = r#"{"id": 1, "status": "archived", "input_audio_id": 2, "video_status": "encoding"}"#;
        let m: Mastering = serde_json::from_str(json).unwrap();
        assert_eq!(m.status, MasteringStatus::Unknown);
        assert!(!m.status.is_pending());
        assert_eq!(m.video_status, VideoStatus::Unknown);
    }

    #[test]
    fn missing_video_status_defaults_to_waiting() {
        let json = r#"{"id": 1, "status": "succeeded", "input_audio_id": 2, "output_audio_id": 3}"#;
        let m: Mastering = serde_json::from_str(json).unwrap();
        assert_eq!(m.video_status, VideoStatus::Waiting);
        assert_eq!(m.output_audio_id, Some(3));
    }

    #[test]
    fn pending_states() {
        assert!(MasteringStatus::Waiting.is_pending());
        assert!(MasteringStatus::Processing.is_pending());
        assert!(!MasteringStatus::Succeeded.is_pending());
        assert!(!MasteringStatus::Failed.is_pending());
        assert!(!MasteringStatus::Expired.is_pending());
        assert!(VideoStatus::Waiting.is_pending());
        assert!(!VideoStatus::Failed.is_pending());
    }

    #[test]
    fn progress_percent_rounds_and_clamps() {
        let mut m: Mastering =
            serde_json::from_str(r#"{"id": 1, "status": "processing", "input_audio_id": 2}"#)
                .unwrap();
        m.progression = 0.456;
        assert_eq!(m.progress_percent(), 46);
        m.progression = 1.2;
        assert_eq!(m.progress_percent(), 100);
        m.progression = -0.1;
        assert_eq!(m.progress_percent(), 0);
    }

    #[test]
    fn null_fields_read_as_defaults() {
        let json = r#"{"id":5,"status":"processing","failure_reason":null,"progression":null,"input_audio_id":1,"video_status":null}"#;
        let m: Mastering = serde_json::from_str(json).unwrap();
        assert_eq!(m.failure_reason, "");
        assert_eq!(m.progression, 0.0);
        assert_eq!(m.video_status, VideoStatus::Waiting);
        assert!(m.status.is_pending());

        let a: Audio =
            serde_json::from_str(r#"{"id":1,"status":"prepared","failure_reason":null}"#).unwrap();
        assert_eq!(a.failure_reason, "");
        assert_eq!(a.status, AudioStatus::Prepared);
    }

    #[test]
    fn audio_failed_with_reason() {
        let json = r#"{"id": 9, "status": "failed", "failure_reason": "unsupported_format"}"#;
        let a: Audio = serde_json::from_str(json).unwrap();
        assert_eq!(a.status, AudioStatus::Failed);
        assert_eq!(a.failure_reason, "unsupported_format");
        assert_eq!(a.status.to_string(), "failed");
    }
}
