//! Mastering parameters and the request that binds them to uploaded audio.
//!
//! [`MasteringOptions`] is the user-facing option set with the CLI defaults.
//! [`MasteringRequest`] adds the resource ids and flattens everything into
//! the form fields `POST /masterings` expects.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::MasteringError;

/// How the loudness target is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoudnessMode {
    Loudness,
    Rms,
    Peak,
    #[value(name = "youtube_loudness")]
    YoutubeLoudness,
}

impl LoudnessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LoudnessMode::Loudness => "loudness",
            LoudnessMode::Rms => "rms",
            LoudnessMode::Peak => "peak",
            LoudnessMode::YoutubeLoudness => "youtube_loudness",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteringAlgorithm {
    V1,
    V2,
}

impl MasteringAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            MasteringAlgorithm::V1 => "v1",
            MasteringAlgorithm::V2 => "v2",
        }
    }
}

/// How the output ceiling is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeilingMode {
    Peak,
    #[value(name = "true_peak")]
    TruePeak,
    #[value(name = "lowpass_true_peak")]
    LowpassTruePeak,
}

impl CeilingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CeilingMode::Peak => "peak",
            CeilingMode::TruePeak => "true_peak",
            CeilingMode::LowpassTruePeak => "lowpass_true_peak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Wav,
    Mp3,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
        }
    }
}

/// The complete parameter bundle for one mastering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteringOptions {
    /// Target loudness in dB.
    pub target_loudness: f32,
    pub target_loudness_mode: LoudnessMode,
    /// Mastering intensity in `[0, 1]`; 0 disables mastering.
    pub mastering_level: f32,
    pub mastering_algorithm: MasteringAlgorithm,
    /// Output ceiling in dB.
    pub ceiling: f32,
    pub ceiling_mode: CeilingMode,
    pub bass_preservation: bool,
    pub preset: String,
    pub noise_reduction: bool,
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    /// 0 keeps the input sample rate.
    pub sample_rate: u32,
    /// Only used for wav output.
    pub bit_depth: u32,
    pub output_format: OutputFormat,
    pub oversample: u32,
}

impl Default for MasteringOptions {
    fn default() -> Self {
        Self {
            target_loudness: -9.0,
            target_loudness_mode: LoudnessMode::Loudness,
            mastering_level: 0.5,
            mastering_algorithm: MasteringAlgorithm::V2,
            ceiling: -0.5,
            ceiling_mode: CeilingMode::TruePeak,
            bass_preservation: true,
            preset: "generic".to_string(),
            noise_reduction: false,
            low_cut_freq: 20.0,
            high_cut_freq: 20000.0,
            sample_rate: 0,
            bit_depth: 24,
            output_format: OutputFormat::Wav,
            oversample: 2,
        }
    }
}

impl MasteringOptions {
    /// Rejects combinations the service would refuse or misinterpret.
    pub fn validate(&self) -> Result<(), MasteringError> {
        if !(0.0..=1.0).contains(&self.mastering_level) {
            return Err(MasteringError::Config(format!(
                "--mastering-level must be within [0, 1], got {}",
                self.mastering_level
            )));
        }
        if self.low_cut_freq <= 0.0 || self.high_cut_freq <= 0.0 {
            return Err(MasteringError::Config(
                "cut frequencies must be positive".to_string(),
            ));
        }
        if self.low_cut_freq >= self.high_cut_freq {
            return Err(MasteringError::Config(format!(
                "--low-cut-freq ({}) must be below --high-cut-freq ({})",
                self.low_cut_freq, self.high_cut_freq
            )));
        }
        if ![16, 24, 32].contains(&self.bit_depth) {
            return Err(MasteringError::Config(format!(
                "--bit-depth must be 16, 24 or 32, got {}",
                self.bit_depth
            )));
        }
        if ![1, 2].contains(&self.oversample) {
            return Err(MasteringError::Config(format!(
                "--oversample must be 1 or 2, got {}",
                self.oversample
            )));
        }
        if self.preset.trim().is_empty() {
            return Err(MasteringError::Config("--preset must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Everything `POST /masterings` needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MasteringRequest {
    pub input_audio_id: i64,
    pub reference_audio_id: Option<i64>,
    pub options: MasteringOptions,
}

impl MasteringRequest {
    /// Form fields sorted by name.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let o = &self.options;
        let mut fields = vec![
            ("input_audio_id", self.input_audio_id.to_string()),
            ("mode", "custom".to_string()),
            ("target_loudness", o.target_loudness.to_string()),
            ("target_loudness_mode", o.target_loudness_mode.as_str().to_string()),
            ("mastering", (o.mastering_level > 0.0).to_string()),
            ("mastering_matching_level", o.mastering_level.to_string()),
            ("mastering_algorithm", o.mastering_algorithm.as_str().to_string()),
            ("ceiling", o.ceiling.to_string()),
            ("ceiling_mode", o.ceiling_mode.as_str().to_string()),
            ("bass_preservation", o.bass_preservation.to_string()),
            ("preset", o.preset.clone()),
            ("noise_reduction", o.noise_reduction.to_string()),
            ("low_cut_freq", o.low_cut_freq.to_string()),
            ("high_cut_freq", o.high_cut_freq.to_string()),
            ("sample_rate", o.sample_rate.to_string()),
            ("bit_depth", o.bit_depth.to_string()),
            ("output_format", o.output_format.as_str().to_string()),
            ("oversample", o.oversample.to_string()),
        ];
        if let Some(id) = self.reference_audio_id {
            fields.push(("reference_audio_id", id.to_string()));
        }
        fields.sort_by_key(|(name, _)| *name);
        fields
    }

    /// Logs every submitted field, one per line, in name order.
    pub fn log(&self) {
        tracing::info!("Mastering options");
        for (name, value) in self.form_fields() {
            tracing::info!("{name}: {value}");
        }
    }
}
