//! Turns a failed mastering into a readable diagnostic.
//!
//! When the service blames preparation, the input (and reference, if one was
//! sent) audio is fetched so the operator sees the underlying cause, e.g.
//! `unsupported_format`, rather than only `failed_to_prepare`.

use crate::api::types::FAILED_TO_PREPARE;
use crate::api::{Audio, AudioStatus, Mastering, MasteringApi};
use crate::error::MasteringError;
use crate::state_machine::Stage;

/// Builds the diagnostic for a mastering whose terminal status is not
/// `succeeded`. `reference_audio_id` is `Some` only when a reference was
/// configured for this run.
pub async fn diagnose_failure(
    api: &impl MasteringApi,
    mastering: &Mastering,
    reference_audio_id: Option<i64>,
) -> Result<String, MasteringError> {
    let mut diagnostic = format!(
        "mastering failed with status {} because {}",
        mastering.status,
        reason_or_unknown(&mastering.failure_reason)
    );

    if mastering.failure_reason != FAILED_TO_PREPARE {
        return Ok(diagnostic);
    }

    let input = api
        .get_audio(mastering.input_audio_id)
        .await
        .map_err(MasteringError::api(Stage::Diagnosing))?;
    if let Some(detail) = preparation_detail("input", &input) {
        diagnostic.push_str("; ");
        diagnostic.push_str(&detail);
    }

    if let Some(configured) = reference_audio_id {
        let id = mastering.reference_audio_id.unwrap_or(configured);
        let reference = api
            .get_audio(id)
            .await
            .map_err(MasteringError::api(Stage::Diagnosing))?;
        if let Some(detail) = preparation_detail("reference", &reference) {
            diagnostic.push_str("; ");
            diagnostic.push_str(&detail);
        }
    }

    Ok(diagnostic)
}

fn preparation_detail(role: &str, audio: &Audio) -> Option<String> {
    (audio.status != AudioStatus::Prepared).then(|| {
        format!(
            "{role} audio {} preparation failed with status {} because {}",
            audio.id,
            audio.status,
            reason_or_unknown(&audio.failure_reason)
        )
    })
}

fn reason_or_unknown(reason: &str) -> &str {
    if reason.is_empty() {
        "of an unknown reason"
    } else {
        reason
    }
}
