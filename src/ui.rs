//! Terminal interface — spinner and colored output.
//!
//! Uses `indicatif` for the progress spinner and `console` for color
//! styling. [`JobProgress`] visually tracks one job through its states.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::state_machine::{JobOutcome, JobReport, State};

/// Visual progress indicator for a running job.
///
/// Shows an animated spinner while the job is in flight and colored
/// messages for success (green) and failure (red).
pub struct JobProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl JobProgress {
    /// Start the spinner with a job label.
    pub fn start(label: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("{}: {label}", State::Pending));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Update the spinner message to the current state.
    #[allow(dead_code)]
    pub fn update_state(&self, state: State) {
        self.pb.set_message(format!("{state}"));
    }

    /// Stop the spinner and show the terminal outcome.
    pub fn complete(&self, outcome: &JobOutcome) {
        self.pb.finish_and_clear();
        match outcome {
            JobOutcome::Success => {
                println!("  {} Job succeeded", self.green.apply_to("✓"));
            }
            JobOutcome::Failure(reason) => {
                println!("  {} Job failed: {reason}", self.red.apply_to("✗"));
            }
        }
    }

    /// Print the job report as styled, pretty-printed JSON.
    pub fn print_report(&self, report: &JobReport) {
        let status_style = match report.state {
            State::Succeeded => &self.green,
            State::Failed => &self.red,
            _ => &self.yellow,
        };
        println!();
        println!("{}", status_style.apply_to("─── Job Report ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
    }
}
