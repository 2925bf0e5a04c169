use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::api::{ApiError, VideoStatus};
use crate::state_machine::{FailureKind, Stage};

/// Every way a mastering run can end early.
///
/// Each variant names the stage it came from so the operator can tell which
/// step broke. Only `main` turns these into an exit status.
#[derive(Debug, Error)]
pub enum MasteringError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{} failed: {source}", .stage.describe())]
    Api {
        stage: Stage,
        #[source]
        source: ApiError,
    },

    #[error("{} failed on {}: {source}", .stage.describe(), .path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Full diagnostic chain: job cause plus resource causes when known.
    #[error("{0}")]
    JobFailed(String),

    #[error("video encode failed with status {0}")]
    VideoFailed(VideoStatus),

    #[error("{} gave up after {}s", .stage.describe(), .waited.as_secs())]
    PollTimeout { stage: Stage, waited: Duration },
}

impl MasteringError {
    pub fn api(stage: Stage) -> impl FnOnce(ApiError) -> Self {
        move |source| MasteringError::Api { stage, source }
    }

    pub fn io(stage: Stage, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| MasteringError::Io {
            stage,
            path,
            source,
        }
    }

    /// How the state machine should treat this error.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            MasteringError::JobFailed(_) | MasteringError::VideoFailed(_) => {
                FailureKind::Domain(self.to_string())
            }
            _ => FailureKind::Transport(self.to_string()),
        }
    }

    /// Process exit status: 2 for bad invocation, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            MasteringError::Config(_) => 2,
            _ => 1,
        }
    }
}
