use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::Stage;

/// Separates failures of the plumbing from failures the service reported.
/// Neither is retried; the split decides whether a failed poll is diagnosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The service reported a terminal non-success status.
    Domain(String),
    /// A remote call, local file or stream copy failed.
    Transport(String),
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Domain(msg) => write!(f, "Domain failure: {msg}"),
            FailureKind::Transport(msg) => write!(f, "Transport failure: {msg}"),
        }
    }
}

/// The result of executing one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageOutcome {
    Success,
    Failure(FailureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

/// Which optional stages a run goes through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub reference: bool,
    pub video: bool,
    pub cleanup: bool,
}

/// Book-keeping for a single end-to-end mastering run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub route: Route,
    pub status: RunStatus,
    pub stage: Stage,
    pub stage_history: Vec<Stage>,
    pub input_audio_id: Option<i64>,
    pub reference_audio_id: Option<i64>,
    pub mastering_id: Option<i64>,
    pub output_audio_id: Option<i64>,
    pub output_video_id: Option<i64>,
    pub audio_bytes: u64,
    pub video_bytes: u64,
    pub removed: bool,
    pub started_at: DateTime<Utc>,
}

impl Run {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            status: RunStatus::Pending,
            stage: Stage::UploadingInput,
            stage_history: Vec::new(),
            input_audio_id: None,
            reference_audio_id: None,
            mastering_id: None,
            output_audio_id: None,
            output_video_id: None,
            audio_bytes: 0,
            video_bytes: 0,
            removed: false,
            started_at: Utc::now(),
        }
    }
}

/// Summary produced when a run finishes successfully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub mastering_id: Option<i64>,
    pub input_audio_id: Option<i64>,
    pub reference_audio_id: Option<i64>,
    pub output_audio_id: Option<i64>,
    pub output_video_id: Option<i64>,
    pub status: RunStatus,
    pub stages: Vec<Stage>,
    /// Where the mastered audio went; `-` for stdout.
    pub output: PathBuf,
    pub audio_bytes: u64,
    pub output_video: Option<PathBuf>,
    pub video_bytes: u64,
    pub removed: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl RunReport {
    pub fn from_run(run: &Run, output: PathBuf, output_video: Option<PathBuf>) -> Self {
        let now = Utc::now();
        let mut stages = run.stage_history.clone();
        if stages.last() != Some(&run.stage) {
            stages.push(run.stage);
        }

        Self {
            mastering_id: run.mastering_id,
            input_audio_id: run.input_audio_id,
            reference_audio_id: run.reference_audio_id,
            output_audio_id: run.output_audio_id,
            output_video_id: run.output_video_id,
            status: run.status,
            stages,
            output,
            audio_bytes: run.audio_bytes,
            output_video,
            video_bytes: run.video_bytes,
            removed: run.removed,
            started_at: run.started_at,
            completed_at: now,
            duration_ms: (now - run.started_at).num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_creation_defaults() {
        let run = Run::new(Route::default());
        assert_eq!(run.status, RunStatus::Pending);
        assert_eq!(run.stage, Stage::UploadingInput);
        assert!(run.stage_history.is_empty());
        assert!(run.mastering_id.is_none());
        assert!(!run.removed);
    }

    #[test]
    fn report_from_run_appends_current_stage() {
        let mut run = Run::new(Route::default());
        run.stage_history = vec![Stage::UploadingInput, Stage::Submitting];
        run.stage = Stage::Polling;
        run.mastering_id = Some(5);

        let report = RunReport::from_run(&run, PathBuf::from("out.wav"), None);
        assert_eq!(
            report.stages,
            vec![Stage::UploadingInput, Stage::Submitting, Stage::Polling]
        );
        assert_eq!(report.mastering_id, Some(5));
        assert_eq!(report.output, PathBuf::from("out.wav"));
        assert!(report.duration_ms >= 0);
    }

    #[test]
    fn failure_kind_display() {
        let domain = FailureKind::Domain("failed_to_prepare".into());
        assert_eq!(domain.to_string(), "Domain failure: failed_to_prepare");

        let transport = FailureKind::Transport("timeout".into());
        assert_eq!(transport.to_string(), "Transport failure: timeout");
    }

    #[test]
    fn report_serializes_to_json() {
        let run = Run::new(Route {
            reference: false,
            video: true,
            cleanup: true,
        });
        let report = RunReport::from_run(&run, PathBuf::from("-"), Some("clip.mp4".into()));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["output"], "-");
        assert_eq!(json["output_video"], "clip.mp4");
        assert_eq!(json["stages"][0], "UploadingInput");
    }
}
