use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};

use console::style;
use tokio::process::Command;
use url::Url;

use crate::config::CookieSource;
use crate::error::{Error, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";

/// Flags shared by every invocation, before cookies and output
const BASE_ARGS: &[&str] = &[
    "-x", // audio only
    "-k", // keep the video as well
    "--audio-format",
    "mp3",
    "--embed-thumbnail",
    "--add-metadata",
    "--write-info-json",
    "--write-description",
    "--write-subs",
    "--sub-lang",
    "hr,en",
    "--write-thumbnail",
    "--convert-thumbnails",
    "png",
    "--user-agent",
    USER_AGENT,
    // Lets yt-dlp fetch the scripts it needs for the player challenge
    "--remote-components",
    "ejs:github",
    "--no-check-certificate",
    "--prefer-free-formats",
    "--restrict-filenames",
];

/// One video to fetch into a channel directory
#[derive(Debug, Clone, Copy)]
pub struct FetchJob<'a> {
    pub video_id: &'a str,
    pub output_dir: &'a Path,
    /// Output file stem without extension
    pub filename_template: &'a str,
}

/// Something that can download a single video, blocking the caller until done
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch(&self, job: &FetchJob<'_>) -> Result<()>;
}

/// Canonical watch URL for a video ID
pub fn watch_url(video_id: &str) -> Result<Url> {
    Ok(Url::parse_with_params(
        "https://www.youtube.com/watch",
        &[("v", video_id)],
    )?)
}

/// The external yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    cookies: CookieSource,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>, cookies: CookieSource) -> Self {
        Self {
            program: program.into(),
            cookies,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument list for one job
    pub fn args(&self, job: &FetchJob<'_>) -> Result<Vec<String>> {
        let output = job
            .output_dir
            .join(format!("{}.%(ext)s", job.filename_template));

        let mut args: Vec<String> = BASE_ARGS.iter().map(|a| a.to_string()).collect();
        args.extend(self.cookies.args());
        args.push("-o".into());
        args.push(output.to_string_lossy().into_owned());
        args.push(watch_url(job.video_id)?.to_string());

        Ok(args)
    }

    /// Runs `<program> --version` to tell whether the binary is usable.
    pub fn is_available(&self) -> bool {
        StdCommand::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

impl Fetcher for YtDlp {
    async fn fetch(&self, job: &FetchJob<'_>) -> Result<()> {
        std::fs::create_dir_all(job.output_dir)?;

        let args = self.args(job)?;

        if std::env::var("DEBUG").is_ok() {
            eprintln!("DEBUG CMD: {} {}", self.program.display(), args.join(" "));
        }

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(Error::Spawn)?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::ToolExit(status))
        }
    }
}

/// Warn early when yt-dlp is missing; every download would fail otherwise.
pub fn check_tool(tool: &YtDlp) {
    if !tool.is_available() {
        eprintln!(
            "{} {} is not installed or not in PATH; downloads will fail",
            style("[ytqueue]").yellow().bold(),
            tool.program().display()
        );
    }
}
