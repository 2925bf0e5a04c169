use reqwest::Client;

use crate::api::{Mastering, MasteringApi, MasteringStatus, VideoStatus};
use crate::classifier::diagnose_failure;
use crate::config::RunPlan;
use crate::error::MasteringError;
use crate::options::MasteringRequest;
use crate::poller::{PollPolicy, wait_for_mastering, wait_for_video};
use crate::retriever::{retrieve_audio, retrieve_video};
use crate::state_machine::{
    FailureKind, Run, RunReport, RunStatus, Stage, StageOutcome, StateMachine, Transition,
};
use crate::ui::MasteringProgress;
use crate::uploader::upload_audio;

/// Drives one mastering through upload, submission, polling, retrieval and
/// cleanup.
pub struct MasteringOrchestrator<A> {
    api: A,
    /// Plain client for signed download URLs.
    http: Client,
    policy: PollPolicy,
}

impl<A: MasteringApi> MasteringOrchestrator<A> {
    pub fn new(api: A, http: Client, policy: PollPolicy) -> Self {
        Self { api, http, policy }
    }

    /// Run the whole pipeline for `plan`. Stops at the first failing stage;
    /// remote objects created before the failure are left in place.
    pub async fn run(
        &self,
        plan: &RunPlan,
        progress: &MasteringProgress,
    ) -> Result<RunReport, MasteringError> {
        plan.validate()?;
        let mut run = Run::new(plan.route());
        run.status = RunStatus::InProgress;

        // UPLOADING_INPUT / UPLOADING_REFERENCE
        let input = settle(
            &mut run,
            upload_audio(&self.api, &plan.input, Stage::UploadingInput).await,
        )?;
        run.input_audio_id = Some(input.id);

        if let Some(reference) = &plan.reference {
            let audio = settle(
                &mut run,
                upload_audio(&self.api, reference, Stage::UploadingReference).await,
            )?;
            run.reference_audio_id = Some(audio.id);
        }

        // SUBMITTING
        let request = MasteringRequest {
            input_audio_id: input.id,
            reference_audio_id: run.reference_audio_id,
            options: plan.options.clone(),
        };
        request.log();
        let created = settle(
            &mut run,
            self.api
                .create_mastering(&request)
                .await
                .map_err(MasteringError::api(Stage::Submitting)),
        )?;
        run.mastering_id = Some(created.id);
        tracing::info!("The mastering started id {}", created.id);
        progress.begin(created.id);

        // POLLING
        let polled = wait_for_mastering(&self.api, created, &self.policy, progress).await;
        progress.end_mastering();
        let mastering = match polled {
            Ok(m) if m.status == MasteringStatus::Succeeded => settle(&mut run, Ok(m))?,
            Ok(m) => return Err(self.diagnose(&mut run, &m).await),
            Err(e) => return settle(&mut run, Err(e)),
        };

        // RETRIEVING
        run.output_audio_id = mastering.output_audio_id;
        run.audio_bytes = settle(
            &mut run,
            retrieve_audio(&self.api, &self.http, &mastering, &plan.output).await,
        )?;

        // VIDEO_POLLING / VIDEO_RETRIEVING
        if let Some(video_path) = &plan.output_video {
            let waited = wait_for_video(&self.api, mastering.clone(), &self.policy, progress)
                .await
                .and_then(|m| match m.video_status {
                    VideoStatus::Succeeded => Ok(m),
                    other => Err(MasteringError::VideoFailed(other)),
                });
            progress.end_video();
            let encoded = settle(&mut run, waited)?;
            run.output_video_id = encoded.output_video_id;
            run.video_bytes = settle(
                &mut run,
                retrieve_video(&self.api, &self.http, &encoded, video_path).await,
            )?;
        }

        // CLEANUP
        if plan.remove {
            let outcome = match remove_mastering(&self.api, mastering.id).await {
                Ok(removed) => {
                    run.removed = removed;
                    StageOutcome::Success
                }
                Err(e) => {
                    tracing::warn!("Failed to remove mastering {}: {e}", mastering.id);
                    StageOutcome::Failure(e.failure_kind())
                }
            };
            StateMachine::next(&mut run, outcome);
        }

        if run.stage != Stage::Done {
            tracing::warn!("run finished in stage {}", run.stage);
        }
        progress.finish();
        Ok(RunReport::from_run(
            &run,
            plan.output.path().to_path_buf(),
            plan.output_video.clone(),
        ))
    }

    /// Handles a terminal non-success mastering: moves the run into
    /// DIAGNOSING and returns the error that ends it.
    async fn diagnose(&self, run: &mut Run, mastering: &Mastering) -> MasteringError {
        let t = StateMachine::next(
            run,
            StageOutcome::Failure(FailureKind::Domain(mastering.failure_reason.clone())),
        );
        debug_assert_eq!(t, Transition::Next(Stage::Diagnosing));

        let err = match diagnose_failure(&self.api, mastering, run.reference_audio_id).await {
            Ok(diagnostic) => MasteringError::JobFailed(diagnostic),
            Err(e) => e,
        };
        StateMachine::next(run, StageOutcome::Failure(err.failure_kind()));
        tracing::debug!(stages = ?run.stage_history, "run failed");
        err
    }
}

/// Deletes the mastering from the service. Returns `false` when it was
/// already gone, so running cleanup twice is harmless.
pub async fn remove_mastering(api: &impl MasteringApi, id: i64) -> Result<bool, MasteringError> {
    match api
        .delete_mastering(id)
        .await
        .map_err(MasteringError::api(Stage::Cleanup))?
    {
        Some(_) => {
            tracing::info!("The mastering {id} was removed");
            Ok(true)
        }
        None => {
            tracing::info!("The mastering {id} was already removed");
            Ok(false)
        }
    }
}

/// Feeds a stage result into the state machine and passes it through.
fn settle<T>(run: &mut Run, result: Result<T, MasteringError>) -> Result<T, MasteringError> {
    match result {
        Ok(value) => {
            let t = StateMachine::next(run, StageOutcome::Success);
            tracing::debug!(transition = ?t, "stage completed");
            Ok(value)
        }
        Err(e) => {
            let t = StateMachine::next(run, StageOutcome::Failure(e.failure_kind()));
            tracing::debug!(transition = ?t, stages = ?run.stage_history, "stage failed");
            Err(e)
        }
    }
}
