use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Timing and batching knobs for a run
#[derive(Debug, Clone)]
pub struct Pacing {
    /// Entries taken from one channel per round
    pub batch_size: usize,
    /// Pause after a successful item when more of the batch follows
    pub between_items: Duration,
    /// Pause after a channel's batch produced at least one download
    pub between_channels: Duration,
    /// Consecutive failures that trigger a cooldown
    pub error_threshold: u32,
    pub cooldown: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            batch_size: 2,
            between_items: Duration::from_secs(1),
            between_channels: Duration::from_secs(3),
            error_threshold: 3,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// Consecutive download failures across every channel of a run.
///
/// Shared by all queues so a failure streak in one channel also slows the
/// next one down.
#[derive(Debug, Default)]
pub struct ErrorStreak {
    consecutive: u32,
    cooldowns: u32,
}

impl ErrorStreak {
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Cooldowns served so far
    pub fn cooldowns(&self) -> u32 {
        self.cooldowns
    }

    /// Returns true when a streak was broken.
    pub fn record_success(&mut self) -> bool {
        let recovered = self.consecutive > 0;
        self.consecutive = 0;
        recovered
    }

    /// Returns true when the streak has reached the cooldown threshold.
    pub fn record_failure(&mut self, threshold: u32) -> bool {
        self.consecutive += 1;
        self.consecutive >= threshold
    }

    /// Sleep out the cooldown with a countdown bar.
    pub async fn cool_down(&mut self, duration: Duration) {
        self.cooldowns += 1;

        println!();
        println!(
            "{} Bot protection triggered ({} consecutive failures)",
            style("[ytqueue]").red().bold(),
            style(self.consecutive).yellow()
        );
        println!(
            "{} Waiting {} seconds...",
            style("[ytqueue]").cyan().bold(),
            style(duration.as_secs()).yellow()
        );

        countdown(duration).await;

        println!("{} Resuming", style("[ytqueue]").cyan().bold());
    }
}

async fn countdown(duration: Duration) {
    let secs = duration.as_secs();
    let bar = ProgressBar::new(secs);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.yellow} cooldown [{bar:40.yellow/red}] {pos}/{len}s")
            .unwrap()
            .progress_chars("█▓░"),
    );

    for _ in 0..secs {
        tokio::time::sleep(Duration::from_secs(1)).await;
        bar.inc(1);
    }
    // Sub-second remainder
    tokio::time::sleep(duration - Duration::from_secs(secs)).await;

    bar.finish_and_clear();
}
