//! Terminal feedback: progress bar while mastering, spinner while the video
//! encodes, and coloured result lines.
//!
//! Everything here writes to stderr so that `--output -` can stream audio on
//! stdout. When stderr is not a terminal the bar is hidden and progress goes
//! through `tracing` instead.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::api::Mastering;
use crate::error::MasteringError;
use crate::state_machine::RunReport;

pub struct MasteringProgress {
    pb: ProgressBar,
    spinner: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl Default for MasteringProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl MasteringProgress {
    /// A progress bar on stderr. Nothing is drawn until [`begin`](Self::begin).
    pub fn new() -> Self {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.yellow} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self::with_bars(pb, spinner)
    }

    /// A progress reporter that never draws; progress is logged instead.
    pub fn hidden() -> Self {
        Self::with_bars(
            ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::hidden()),
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden()),
        )
    }

    fn with_bars(pb: ProgressBar, spinner: ProgressBar) -> Self {
        Self {
            pb,
            spinner,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Starts ticking once mastering `id` has been submitted.
    pub fn begin(&self, id: i64) {
        if !self.pb.is_hidden() {
            self.pb.set_message(format!("mastering {id}"));
            self.pb.enable_steady_tick(Duration::from_millis(100));
        }
    }

    /// Reports the latest mastering progression. Values may go backwards.
    pub fn mastering(&self, mastering: &Mastering) {
        let percent = mastering.progress_percent();
        if self.pb.is_hidden() {
            tracing::info!("waiting for the mastering completion {percent}%");
        } else {
            self.pb.set_position(percent);
        }
    }

    /// Shows a spinner while the video encode is pending.
    pub fn video(&self, mastering: &Mastering) {
        if self.spinner.is_hidden() {
            tracing::info!("waiting for the video encode completion");
        } else if self.spinner.message().is_empty() {
            self.spinner
                .set_message(format!("encoding video for mastering {}", mastering.id));
            self.spinner.enable_steady_tick(Duration::from_millis(100));
        }
    }

    /// Clears the mastering bar once polling is over, before any log line
    /// about retrieval is written to stderr.
    pub fn end_mastering(&self) {
        self.pb.finish_and_clear();
    }

    pub fn end_video(&self) {
        self.spinner.finish_and_clear();
    }

    pub fn finish(&self) {
        self.end_mastering();
        self.end_video();
    }

    pub fn success(&self, report: &RunReport) {
        self.finish();
        eprintln!(
            "  {} Mastering {} saved to {} ({} bytes)",
            self.green.apply_to("✓"),
            report.mastering_id.unwrap_or_default(),
            report.output.display(),
            report.audio_bytes
        );
        if let Some(video) = &report.output_video {
            eprintln!(
                "  {} Video saved to {} ({} bytes)",
                self.green.apply_to("✓"),
                video.display(),
                report.video_bytes
            );
        }
        if report.removed {
            eprintln!("  {} Mastering removed from the service", self.yellow.apply_to("•"));
        }
    }

    pub fn failure(&self, err: &MasteringError) {
        self.finish();
        eprintln!("  {} {err}", self.red.apply_to("✗"));
    }

    /// Prints the run report as pretty JSON.
    pub fn print_report(&self, report: &RunReport) {
        eprintln!();
        eprintln!("{}", self.green.apply_to("─── Run Report ───"));
        eprintln!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mastering(progression: f64) -> Mastering {
        serde_json::from_value(serde_json::json!({
            "id": 3, "status": "processing", "input_audio_id": 1, "progression": progression
        }))
        .unwrap()
    }

    #[test]
    fn hidden_progress_accepts_non_monotonic_updates() {
        let progress = MasteringProgress::hidden();
        progress.begin(3);
        progress.mastering(&mastering(0.8));
        progress.mastering(&mastering(0.4));
        progress.end_mastering();
        assert!(progress.pb.is_finished());
        assert!(!progress.spinner.is_finished());
        progress.video(&mastering(1.0));
        progress.finish();
        assert!(progress.pb.is_hidden());
        assert!(progress.pb.is_finished());
        assert!(progress.spinner.is_finished());
    }
}
