//! Progress reporting for solve batches and loading steps

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Phase of a batch run, shown as the prefix of its progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    /// Mixed-integer solve of every instance to recover its strategy
    FullSolve,
    /// Continuous re-solves of the predicted candidate strategies
    CandidateSolve,
}

impl BatchStage {
    pub fn label(self) -> &'static str {
        match self {
            BatchStage::FullSolve => "Full MILP solves",
            BatchStage::CandidateSolve => "Candidate strategy solves",
        }
    }
}

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress bar over `len` instances of one solve stage
pub fn batch_progress(stage: BatchStage, len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} instances ({per_sec}, eta {eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▓▒░");
    pb.set_style(style);
    pb.set_prefix(stage.label());
    pb
}

/// Close a batch bar with the instance count and wall time of the stage
pub fn finish_batch(pb: &ProgressBar, stage: BatchStage, elapsed: Duration) {
    pb.finish_with_message(format!(
        "✅ {}: {} instance(s) in {:.2}s",
        stage.label(),
        pb.position(),
        elapsed.as_secs_f64()
    ));
}

/// Finish a spinner with a success message
pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✅ {}", message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_bar_names_its_stage() {
        let pb = batch_progress(BatchStage::CandidateSolve, 4);
        assert_eq!(pb.length(), Some(4));
        assert_eq!(pb.prefix(), "Candidate strategy solves");

        pb.inc(4);
        finish_batch(&pb, BatchStage::CandidateSolve, Duration::from_millis(1500));
        assert!(pb.is_finished());
        assert_eq!(
            pb.message(),
            "✅ Candidate strategy solves: 4 instance(s) in 1.50s"
        );
    }
}
