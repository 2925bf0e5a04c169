//! Completion waits for the mastering and its video encode.
//!
//! Both waits share a [`PollPolicy`] but are otherwise independent: the video
//! status can lag behind or fail after the audio has succeeded.

use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::api::{Mastering, MasteringApi};
use crate::error::MasteringError;
use crate::state_machine::Stage;
use crate::ui::MasteringProgress;

/// How long to wait between status checks, and for how long overall.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Multiplier applied to the interval after every check; 1.0 keeps it fixed.
    pub backoff_factor: f64,
    pub max_interval: Duration,
    /// Give up once this much time has passed. `None` waits forever.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(60),
            deadline: None,
        }
    }
}

impl PollPolicy {
    /// No delay between checks.
    pub fn immediate() -> Self {
        Self {
            interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay before check number `attempt` (1-based).
    /// delay = interval * backoff_factor^(attempt - 1), capped at max_interval
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.backoff_factor.is_nan() || self.backoff_factor <= 1.0 {
            return self.interval;
        }
        let cap = self.max_interval.max(self.interval);
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.interval.as_secs_f64() * self.backoff_factor.powi(exp);
        Duration::try_from_secs_f64(secs).map_or(cap, |delay| delay.min(cap))
    }
}

/// Waits until the mastering leaves `waiting`/`processing` and returns the
/// first terminal snapshot. Never fetches again after a terminal status.
pub async fn wait_for_mastering(
    api: &impl MasteringApi,
    mut mastering: Mastering,
    policy: &PollPolicy,
    progress: &MasteringProgress,
) -> Result<Mastering, MasteringError> {
    let started = Instant::now();
    let mut attempt = 0;
    while mastering.status.is_pending() {
        attempt += 1;
        pause(policy, attempt, started, Stage::Polling).await?;
        mastering = api
            .get_mastering(mastering.id)
            .await
            .map_err(MasteringError::api(Stage::Polling))?;
        tracing::debug!(
            id = mastering.id,
            status = %mastering.status,
            progression = mastering.progression,
            "polled mastering"
        );
        progress.mastering(&mastering);
    }
    Ok(mastering)
}

/// Waits while the video encode is `waiting`. Returns the snapshot whose
/// video status is terminal; the caller decides whether it is acceptable.
pub async fn wait_for_video(
    api: &impl MasteringApi,
    mut mastering: Mastering,
    policy: &PollPolicy,
    progress: &MasteringProgress,
) -> Result<Mastering, MasteringError> {
    let started = Instant::now();
    let mut attempt = 0;
    while mastering.video_status.is_pending() {
        progress.video(&mastering);
        attempt += 1;
        pause(policy, attempt, started, Stage::VideoPolling).await?;
        mastering = api
            .get_mastering(mastering.id)
            .await
            .map_err(MasteringError::api(Stage::VideoPolling))?;
        tracing::debug!(id = mastering.id, video_status = %mastering.video_status, "polled video");
    }
    Ok(mastering)
}

async fn pause(
    policy: &PollPolicy,
    attempt: u32,
    started: Instant,
    stage: Stage,
) -> Result<(), MasteringError> {
    if let Some(deadline) = policy.deadline {
        let waited = started.elapsed();
        if waited >= deadline {
            return Err(MasteringError::PollTimeout { stage, waited });
        }
    }
    let delay = policy.delay_for_attempt(attempt);
    if !delay.is_zero() {
        sleep(delay).await;
    }
    Ok(())
}
