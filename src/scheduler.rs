use std::fs;
use std::path::{Path, PathBuf};

use console::style;

use crate::downloader::Fetcher;
use crate::error::{Error, Result};
use crate::pacing::{ErrorStreak, Pacing};
use crate::queue::{ChannelQueue, LIST_SUFFIX};

/// Totals for one scheduler run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rounds: usize,
    pub downloaded: usize,
    pub cooldowns: u32,
}

/// Channel list files in `dir`, sorted by file name
pub fn discover_lists(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::ListsDirMissing(dir.to_path_buf()));
    }

    let mut lists: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(LIST_SUFFIX))
        })
        .collect();
    lists.sort();

    Ok(lists)
}

/// Open a queue per list file. Unreadable lists are reported and skipped.
pub fn open_queues(lists: &[PathBuf], base_output_dir: &Path) -> Vec<ChannelQueue> {
    lists
        .iter()
        .filter_map(|path| match ChannelQueue::open(path, base_output_dir) {
            Ok(queue) => {
                println!(
                    "{} {}: {} pending",
                    style("[ytqueue]").cyan().bold(),
                    queue.name(),
                    style(queue.pending().len()).yellow()
                );
                Some(queue)
            }
            Err(e) => {
                eprintln!(
                    "{} Skipping {}: {}",
                    style("[ytqueue]").red().bold(),
                    path.display(),
                    e
                );
                None
            }
        })
        .collect()
}

/// Sweep every active channel one batch at a time until all are exhausted.
///
/// Channels keep their discovery order. After a batch that downloaded
/// anything the scheduler pauses before moving to the next channel.
pub async fn run<F: Fetcher>(
    mut queues: Vec<ChannelQueue>,
    fetcher: &F,
    pacing: &Pacing,
) -> Result<RunSummary> {
    let mut streak = ErrorStreak::default();
    let mut summary = RunSummary::default();

    queues.retain(|q| !q.is_exhausted());

    while !queues.is_empty() {
        summary.rounds += 1;
        println!();
        println!(
            "{} === Round {} (active: {}) ===",
            style("[ytqueue]").cyan().bold(),
            summary.rounds,
            style(queues.len()).yellow()
        );

        for queue in queues.iter_mut() {
            let downloaded = queue.process_batch(fetcher, pacing, &mut streak).await?;
            summary.downloaded += downloaded;

            if downloaded > 0 {
                tokio::time::sleep(pacing.between_channels).await;
            }
        }

        queues.retain(|q| !q.is_exhausted());
    }

    summary.cooldowns = streak.cooldowns();
    Ok(summary)
}
