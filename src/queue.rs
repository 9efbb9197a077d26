use std::fs;
use std::path::{Path, PathBuf};

use console::style;

use crate::downloader::{FetchJob, Fetcher};
use crate::error::Result;
use crate::extractor::{parse_list, ListEntry, NO_DATE};
use crate::pacing::{ErrorStreak, Pacing};
use crate::sanitize::sanitize_name;
use crate::state::ChannelState;

/// Suffix that marks a file in the lists directory as a channel list
pub const LIST_SUFFIX: &str = "-lista.txt";
const STATE_SUFFIX: &str = "-state.json";

/// Channel name derived from a list file name
pub fn channel_name(list_path: &Path) -> String {
    let file_name = list_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = file_name
        .strip_suffix(LIST_SUFFIX)
        .or_else(|| file_name.strip_suffix(".txt"))
        .unwrap_or(file_name.as_str());

    sanitize_name(stem)
}

/// State file kept beside the list: `foo-lista.txt` -> `foo-lista-state.json`
pub fn state_path(list_path: &Path) -> PathBuf {
    let stem = list_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    list_path.with_file_name(format!("{}{}", stem, STATE_SUFFIX))
}

/// One channel's remaining work for this run
#[derive(Debug)]
pub struct ChannelQueue {
    name: String,
    output_dir: PathBuf,
    state_path: PathBuf,
    state: ChannelState,
    pending: Vec<ListEntry>,
    exhausted: bool,
}

impl ChannelQueue {
    /// Load a list file and its state, keeping only entries not yet completed.
    pub fn open(list_path: &Path, base_output_dir: &Path) -> Result<Self> {
        let content = fs::read_to_string(list_path)?;
        Ok(Self::from_content(list_path, base_output_dir, &content))
    }

    fn from_content(list_path: &Path, base_output_dir: &Path, content: &str) -> Self {
        let name = channel_name(list_path);
        let output_dir = base_output_dir.join(&name);
        let state_path = state_path(list_path);
        let state = ChannelState::load(&state_path);

        let pending: Vec<ListEntry> = parse_list(content)
            .into_iter()
            .filter(|entry| !state.is_completed(&entry.video_id))
            .collect();
        let exhausted = pending.is_empty();

        Self {
            name,
            output_dir,
            state_path,
            state,
            pending,
            exhausted,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[cfg(test)]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[cfg(test)]
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn pending(&self) -> &[ListEntry] {
        &self.pending
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Download up to `pacing.batch_size` entries one after another.
    ///
    /// State is persisted after every attempt. The whole batch leaves
    /// `pending` afterwards whatever the outcome; failed IDs stay out of
    /// `completed` and are retried on the next process run. Returns the
    /// number of successful downloads.
    pub async fn process_batch<F: Fetcher>(
        &mut self,
        fetcher: &F,
        pacing: &Pacing,
        streak: &mut ErrorStreak,
    ) -> Result<usize> {
        if self.pending.is_empty() {
            self.exhausted = true;
            return Ok(0);
        }

        let take = pacing.batch_size.min(self.pending.len());
        let mut succeeded = 0;

        println!();
        println!(
            "{} [{}] Batch... (remaining: {})",
            style("[ytqueue]").cyan().bold(),
            style(self.name.to_uppercase()).bold(),
            style(self.pending.len()).yellow()
        );

        for i in 0..take {
            let entry = &self.pending[i];
            println!(
                "   [{}/{}] Target: \"{}\"",
                i + 1,
                take,
                entry.log_name()
            );
            if std::env::var("DEBUG").is_ok() {
                eprintln!(
                    "DEBUG ENTRY: url={} date={}",
                    entry.url,
                    entry.date.as_deref().unwrap_or(NO_DATE)
                );
            }

            let job = FetchJob {
                video_id: &entry.video_id,
                output_dir: &self.output_dir,
                filename_template: &entry.filename_template,
            };

            match fetcher.fetch(&job).await {
                Ok(()) => {
                    if streak.record_success() {
                        println!("   {} Error streak reset", style("[recovered]").green());
                    }

                    self.state.mark_completed(&entry.video_id);
                    self.state.save(&self.state_path)?;
                    println!("   {}", style("[saved]").green().bold());
                    succeeded += 1;

                    if i + 1 < take {
                        tokio::time::sleep(pacing.between_items).await;
                    }
                }
                Err(e) => {
                    let cool_down = streak.record_failure(pacing.error_threshold);
                    eprintln!(
                        "   {} {}: {}",
                        style("[failed]").red().bold(),
                        entry.video_id,
                        e
                    );
                    eprintln!(
                        "       row: {}",
                        style(entry.raw_line.trim()).dim()
                    );
                    eprintln!(
                        "       consecutive failure #{}",
                        style(streak.consecutive()).yellow()
                    );

                    // Saved on every failure, even when the ID was already listed.
                    self.state.mark_failed(&entry.video_id);
                    self.state.save(&self.state_path)?;

                    if cool_down {
                        streak.cool_down(pacing.cooldown).await;
                    }
                }
            }
        }

        self.pending.drain(..take);
        if self.pending.is_empty() {
            self.exhausted = true;
            println!("   {} Channel finished", style("[done]").green().bold());
        }

        Ok(succeeded)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Replays scripted outcomes and records which IDs were requested.
    pub(crate) struct ScriptedFetcher {
        outcomes: RefCell<VecDeque<bool>>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub fn new(outcomes: &[bool]) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.iter().copied().collect()),
                calls: RefCell::default(),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, job: &FetchJob<'_>) -> Result<()> {
            self.calls.borrow_mut().push(job.video_id.to_string());
            // Runs out of script -> succeed
            if self.outcomes.borrow_mut().pop_front().unwrap_or(true) {
                Ok(())
            } else {
                Err(Error::Spawn(std::io::Error::other("scripted failure")))
            }
        }
    }

    pub(crate) fn video_url(n: usize) -> String {
        format!("https://youtu.be/{}", video_id(n))
    }

    pub(crate) fn video_id(n: usize) -> String {
        format!("VIDEO{:06}", n)
    }

    #[test]
    fn test_channel_name_and_state_path() {
        let list = Path::new("/lists/Moj Kanal Čakovec-lista.txt");
        assert_eq!(channel_name(list), "moj_kanal_cakovec");
        assert_eq!(
            state_path(list),
            PathBuf::from("/lists/Moj Kanal Čakovec-lista-state.json")
        );

        assert_eq!(channel_name(Path::new("/lists/other.txt")), "other");
        assert_eq!(
            state_path(Path::new("/lists/other.txt")),
            PathBuf::from("/lists/other-state.json")
        );
    }

    #[test]
    fn test_open_derives_layout() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("Show-lista.txt");
        fs::write(&list, "20230101|My Vid|https://youtu.be/ABCDEFGHIJK\n").unwrap();

        let queue = ChannelQueue::open(&list, Path::new("/media")).unwrap();
        assert_eq!(queue.name(), "show");
        assert_eq!(queue.output_dir(), Path::new("/media/show"));
        assert_eq!(queue.pending().len(), 1);
        assert_eq!(queue.pending()[0].filename_template, "20230101_my_vid_yt_ABCDEFGHIJK");
        assert!(!queue.is_exhausted());
    }

    #[test]
    fn test_open_missing_list_is_error() {
        let dir = tempdir().unwrap();
        assert!(ChannelQueue::open(&dir.path().join("gone-lista.txt"), dir.path()).is_err());
    }

    #[test]
    fn test_completed_entries_are_filtered() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("chan-lista.txt");
        let lines: Vec<String> = (0..3).map(video_url).collect();
        fs::write(&list, lines.join("\n")).unwrap();

        ChannelState {
            completed: vec![video_id(1)],
            failed: vec![video_id(2)],
        }
        .save(&state_path(&list))
        .unwrap();

        let queue = ChannelQueue::open(&list, dir.path()).unwrap();
        let ids: Vec<&str> = queue.pending().iter().map(|e| e.video_id.as_str()).collect();
        // Failed IDs are only filtered against `completed`, so they come back.
        assert_eq!(ids, vec![video_id(0).as_str(), video_id(2).as_str()]);
    }

    #[test]
    fn test_all_completed_starts_exhausted() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("chan-lista.txt");
        fs::write(&list, format!("# only comments\n{}\n", video_url(0))).unwrap();
        ChannelState {
            completed: vec![video_id(0)],
            failed: vec![],
        }
        .save(&state_path(&list))
        .unwrap();

        let queue = ChannelQueue::open(&list, dir.path()).unwrap();
        assert!(queue.is_exhausted());
    }

    #[test]
    fn test_duplicate_ids_single_pending() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("chan-lista.txt");
        fs::write(
            &list,
            "20230101|First|https://youtu.be/ABCDEFGHIJK\n20230505|Again|https://www.youtube.com/watch?v=ABCDEFGHIJK\n",
        )
        .unwrap();

        let queue = ChannelQueue::open(&list, dir.path()).unwrap();
        assert_eq!(queue.pending().len(), 1);
        assert_eq!(queue.pending()[0].title, "First");
    }

    #[test]
    fn test_corrupt_state_is_fresh() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("chan-lista.txt");
        fs::write(&list, video_url(0)).unwrap();
        fs::write(state_path(&list), "{{{{").unwrap();

        let queue = ChannelQueue::open(&list, dir.path()).unwrap();
        assert_eq!(queue.state(), &ChannelState::default());
        assert_eq!(queue.pending().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_success_persists_and_shrinks() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("chan-lista.txt");
        let lines: Vec<String> = (0..3).map(video_url).collect();
        fs::write(&list, lines.join("\n")).unwrap();

        let mut queue = ChannelQueue::open(&list, dir.path()).unwrap();
        let fetcher = ScriptedFetcher::new(&[true, true]);
        let pacing = Pacing::default();
        let mut streak = ErrorStreak::default();

        let done = queue.process_batch(&fetcher, &pacing, &mut streak).await.unwrap();
        assert_eq!(done, 2);
        assert_eq!(fetcher.calls(), vec![video_id(0), video_id(1)]);
        assert_eq!(queue.pending().len(), 1);
        assert!(!queue.is_exhausted());

        let on_disk = ChannelState::load(&state_path(&list));
        assert_eq!(on_disk.completed, vec![video_id(0), video_id(1)]);

        // A restart picks up where the run stopped.
        let reopened = ChannelQueue::open(&list, dir.path()).unwrap();
        assert_eq!(reopened.pending().len(), 1);
        assert_eq!(reopened.pending()[0].video_id, video_id(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_items_skips_last() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("chan-lista.txt");
        let lines: Vec<String> = (0..3).map(video_url).collect();
        fs::write(&list, lines.join("\n")).unwrap();

        let mut queue = ChannelQueue::open(&list, dir.path()).unwrap();
        let fetcher = ScriptedFetcher::new(&[]);
        let pacing = Pacing::default();
        let mut streak = ErrorStreak::default();

        // Two successes: one pause, none after the last item.
        let started = tokio::time::Instant::now();
        queue.process_batch(&fetcher, &pacing, &mut streak).await.unwrap();
        assert!(started.elapsed() >= pacing.between_items);
        assert!(started.elapsed() < pacing.between_items * 2);

        // A single remaining success does not pause at all.
        let started = tokio::time::Instant::now();
        queue.process_batch(&fetcher, &pacing, &mut streak).await.unwrap();
        assert!(started.elapsed() < pacing.between_items);
        assert!(queue.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_item_leaves_pending_but_not_completed() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("chan-lista.txt");
        fs::write(&list, format!("{}\n{}\n", video_url(0), video_url(1))).unwrap();

        let mut queue = ChannelQueue::open(&list, dir.path()).unwrap();
        let fetcher = ScriptedFetcher::new(&[false, true]);
        let mut streak = ErrorStreak::default();

        let done = queue
            .process_batch(&fetcher, &Pacing::default(), &mut streak)
            .await
            .unwrap();
        assert_eq!(done, 1);
        assert!(queue.pending().is_empty());
        assert!(queue.is_exhausted());
        assert_eq!(streak.consecutive(), 0);

        let on_disk = ChannelState::load(&state_path(&list));
        assert_eq!(on_disk.completed, vec![video_id(1)]);
        assert_eq!(on_disk.failed, vec![video_id(0)]);

        // Nothing left in this run.
        assert_eq!(
            queue.process_batch(&fetcher, &Pacing::default(), &mut streak).await.unwrap(),
            0
        );
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_clears_failed() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("chan-lista.txt");
        fs::write(&list, video_url(0)).unwrap();
        ChannelState {
            completed: vec![],
            failed: vec![video_id(0)],
        }
        .save(&state_path(&list))
        .unwrap();

        let mut queue = ChannelQueue::open(&list, dir.path()).unwrap();
        let fetcher = ScriptedFetcher::new(&[true]);
        let mut streak = ErrorStreak::default();
        queue
            .process_batch(&fetcher, &Pacing::default(), &mut streak)
            .await
            .unwrap();

        let on_disk = ChannelState::load(&state_path(&list));
        assert_eq!(on_disk.completed, vec![video_id(0)]);
        assert!(on_disk.failed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_trigger_one_cooldown() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("chan-lista.txt");
        let lines: Vec<String> = (0..4).map(video_url).collect();
        fs::write(&list, lines.join("\n")).unwrap();

        let mut queue = ChannelQueue::open(&list, dir.path()).unwrap();
        let fetcher = ScriptedFetcher::new(&[false, false, false, true]);
        let pacing = Pacing {
            batch_size: 4,
            ..Pacing::default()
        };
        let mut streak = ErrorStreak::default();

        let started = tokio::time::Instant::now();
        let done = queue.process_batch(&fetcher, &pacing, &mut streak).await.unwrap();

        assert_eq!(done, 1);
        assert_eq!(streak.cooldowns(), 1);
        assert_eq!(streak.consecutive(), 0);
        assert_eq!(fetcher.calls().len(), 4);
        assert!(started.elapsed() >= Duration::from_secs(60));
        assert_eq!(ChannelState::load(&state_path(&list)).failed.len(), 3);
    }
}
