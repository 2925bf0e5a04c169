use std::fmt;

use serde::{Deserialize, Serialize};

use super::run::{FailureKind, Run, RunStatus, StageOutcome};

/// The stages of one mastering run.
///
/// UPLOADING_INPUT → [UPLOADING_REFERENCE] → SUBMITTING → POLLING →
/// RETRIEVING | DIAGNOSING → [VIDEO_POLLING → VIDEO_RETRIEVING] → [CLEANUP] → DONE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    UploadingInput,
    UploadingReference,
    Submitting,
    Polling,
    Retrieving,
    Diagnosing,
    VideoPolling,
    VideoRetrieving,
    Cleanup,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::UploadingInput => write!(f, "UPLOADING_INPUT"),
            Stage::UploadingReference => write!(f, "UPLOADING_REFERENCE"),
            Stage::Submitting => write!(f, "SUBMITTING"),
            Stage::Polling => write!(f, "POLLING"),
            Stage::Retrieving => write!(f, "RETRIEVING"),
            Stage::Diagnosing => write!(f, "DIAGNOSING"),
            Stage::VideoPolling => write!(f, "VIDEO_POLLING"),
            Stage::VideoRetrieving => write!(f, "VIDEO_RETRIEVING"),
            Stage::Cleanup => write!(f, "CLEANUP"),
            Stage::Done => write!(f, "DONE"),
        }
    }
}

impl Stage {
    /// Short operator-facing description used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Stage::UploadingInput => "input audio upload",
            Stage::UploadingReference => "reference audio upload",
            Stage::Submitting => "mastering submission",
            Stage::Polling => "mastering status check",
            Stage::Retrieving => "output audio download",
            Stage::Diagnosing => "failure diagnosis",
            Stage::VideoPolling => "video status check",
            Stage::VideoRetrieving => "output video download",
            Stage::Cleanup => "mastering removal",
            Stage::Done => "finish",
        }
    }
}

/// The result of evaluating a stage transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Advance to the next stage.
    Next(Stage),
    /// The run is over, successfully or not.
    Complete(StageOutcome),
}

/// Drives a [`Run`] through its stages.
pub struct StateMachine;

impl StateMachine {
    /// Compute and apply the next transition for `run` given the outcome of
    /// its current stage.
    ///
    /// - A failed mastering poll moves to `Diagnosing`, which always ends
    ///   the run with a failure.
    /// - `Cleanup` is best-effort: it advances to `Done` whatever happened.
    /// - Any other failure ends the run immediately.
    /// - `Done` is terminal and always returns `Complete(Success)`.
    pub fn next(run: &mut Run, outcome: StageOutcome) -> Transition {
        let transition = match (run.stage, outcome) {
            (Stage::Done, _) => Transition::Complete(StageOutcome::Success),
            (Stage::Cleanup, _) => Transition::Next(Stage::Done),
            (Stage::Diagnosing, StageOutcome::Failure(kind)) => {
                Transition::Complete(StageOutcome::Failure(kind))
            }
            (Stage::Diagnosing, StageOutcome::Success) => Transition::Complete(
                StageOutcome::Failure(FailureKind::Domain("mastering did not succeed".into())),
            ),
            (Stage::Polling, StageOutcome::Failure(FailureKind::Domain(_))) => {
                Transition::Next(Stage::Diagnosing)
            }
            (_, StageOutcome::Failure(kind)) => Transition::Complete(StageOutcome::Failure(kind)),
            (stage, StageOutcome::Success) => Transition::Next(Self::successor(run, stage)),
        };

        match &transition {
            Transition::Next(next_stage) => {
                run.stage_history.push(run.stage);
                run.stage = *next_stage;
                if *next_stage == Stage::Done {
                    run.status = RunStatus::Succeeded;
                }
            }
            Transition::Complete(outcome) => {
                if run.stage_history.last() != Some(&run.stage) {
                    run.stage_history.push(run.stage);
                }
                run.status = match outcome {
                    StageOutcome::Success => RunStatus::Succeeded,
                    StageOutcome::Failure(_) => RunStatus::Failed,
                };
            }
        }

        transition
    }

    fn successor(run: &Run, stage: Stage) -> Stage {
        let after_audio = |run: &Run| {
            if run.route.cleanup {
                Stage::Cleanup
            } else {
                Stage::Done
            }
        };
        match stage {
            Stage::UploadingInput if run.route.reference => Stage::UploadingReference,
            Stage::UploadingInput | Stage::UploadingReference => Stage::Submitting,
            Stage::Submitting => Stage::Polling,
            Stage::Polling => Stage::Retrieving,
            Stage::Retrieving if run.route.video => Stage::VideoPolling,
            Stage::Retrieving => after_audio(run),
            Stage::VideoPolling => Stage::VideoRetrieving,
            Stage::VideoRetrieving => after_audio(run),
            Stage::Diagnosing | Stage::Cleanup | Stage::Done => Stage::Done,
        }
    }
}
