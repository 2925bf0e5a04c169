//! Command-line interface built on clap.
//!
//! [`Cli`] carries the global flags and the `master` and `completions` subcommands.
//! [`MasterArgs::plan`] turns the parsed flags into the immutable
//! [`RunPlan`](crate::config::RunPlan) the orchestrator consumes.

use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::config::RunPlan;
use crate::options::{CeilingMode, LoudnessMode, MasteringAlgorithm, MasteringOptions, OutputFormat};
use crate::retriever::OutputTarget;
use crate::uploader::AudioSource;

/// AI Mastering API CLI client.
#[derive(Debug, Parser)]
#[command(name = "aimastering", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file. Defaults to ./aimastering.toml when it exists.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enables debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Master an audio.
    #[command(override_usage = "aimastering master --input input.wav --output output.wav [OPTIONS]")]
    Master(MasterArgs),

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Writes the completion script for `shell` to `out`.
pub fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, out);
}

#[derive(Debug, Clone, Args)]
pub struct MasterArgs {
    /// AI Mastering API access token (retrieved from https://aimastering.com/app/developer).
    /// Falls back to AIMASTERING_ACCESS_TOKEN, then the config file.
    #[arg(long)]
    pub access_token: Option<String>,

    /// Input audio file path. If - is specified, stdin is used.
    #[arg(short, long)]
    pub input: String,

    /// Output audio file path. If - is specified, stdout is used.
    #[arg(short, long)]
    pub output: String,

    /// User agent text used for API requests.
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Override the API base URL.
    #[arg(long, hide = true)]
    pub api_base_url: Option<String>,

    /// Reference audio file path.
    #[arg(long)]
    pub reference: Option<String>,

    /// Output video file path. The video is saved only when specified.
    #[arg(long)]
    pub output_video: Option<PathBuf>,

    /// Target loudness in dB.
    #[arg(long, default_value_t = -9.0, allow_negative_numbers = true)]
    pub target_loudness: f32,

    /// Target loudness mode.
    #[arg(long, value_enum, default_value_t = LoudnessMode::Loudness)]
    pub target_loudness_mode: LoudnessMode,

    /// Mastering level in [0, 1]. 0 means disabled.
    #[arg(long, default_value_t = 0.5)]
    pub mastering_level: f32,

    #[arg(long, value_enum, default_value_t = MasteringAlgorithm::V2)]
    pub mastering_algorithm: MasteringAlgorithm,

    /// Output ceiling in dB.
    #[arg(long, default_value_t = -0.5, allow_negative_numbers = true)]
    pub ceiling: f32,

    #[arg(long, value_enum, default_value_t = CeilingMode::TruePeak)]
    pub ceiling_mode: CeilingMode,

    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub bass_preservation: bool,

    /// Mastering preset.
    #[arg(long, default_value = "generic")]
    pub preset: String,

    #[arg(long, default_value_t = false, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub noise_reduction: bool,

    /// Low cut frequency in Hz.
    #[arg(long, default_value_t = 20.0)]
    pub low_cut_freq: f32,

    /// High cut frequency in Hz.
    #[arg(long, default_value_t = 20000.0)]
    pub high_cut_freq: f32,

    /// Sample rate of output. 0 means same as the input.
    #[arg(long, default_value_t = 0)]
    pub sample_rate: u32,

    /// Bit depth of output (16/24/32). Only used when the output format is wav.
    #[arg(long, default_value_t = 24)]
    pub bit_depth: u32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Wav)]
    pub output_format: OutputFormat,

    /// Oversample factor (1/2).
    #[arg(long, default_value_t = 2)]
    pub oversample: u32,

    /// Remove the created mastering before finishing.
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub remove: bool,

    /// Print the run report as JSON when finished.
    #[arg(long, default_value_t = false)]
    pub report: bool,
}

impl MasterArgs {
    pub fn options(&self) -> MasteringOptions {
        MasteringOptions {
            target_loudness: self.target_loudness,
            target_loudness_mode: self.target_loudness_mode,
            mastering_level: self.mastering_level,
            mastering_algorithm: self.mastering_algorithm,
            ceiling: self.ceiling,
            ceiling_mode: self.ceiling_mode,
            bass_preservation: self.bass_preservation,
            preset: self.preset.clone(),
            noise_reduction: self.noise_reduction,
            low_cut_freq: self.low_cut_freq,
            high_cut_freq: self.high_cut_freq,
            sample_rate: self.sample_rate,
            bit_depth: self.bit_depth,
            output_format: self.output_format,
            oversample: self.oversample,
        }
    }

    pub fn plan(&self) -> RunPlan {
        RunPlan {
            input: AudioSource::parse(&self.input),
            output: OutputTarget::parse(&self.output),
            reference: self
                .reference
                .as_deref()
                .filter(|r| !r.is_empty())
                .map(AudioSource::parse),
            output_video: self.output_video.clone(),
            options: self.options(),
            remove: self.remove,
        }
    }
}
