use std::env;
use std::path::{Path, PathBuf};

use crate::pacing::Pacing;

pub const DEFAULT_OUTPUT_DIR: &str = "/Volumes/DOMOVINA1TB/fetch_domovina_tv_output";
const DEFAULT_LISTS_DIR: &str = "automatic/podcasts";
const DEFAULT_COOKIES_FILE: &str = "automatic/cookies.txt";
const DEFAULT_BROWSER: &str = "brave";
const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Where yt-dlp gets its authentication cookies from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    /// Live cookies read out of a local browser profile
    Browser(String),
    /// Netscape-format cookie export
    File(PathBuf),
    None,
}

impl CookieSource {
    /// Prefer live browser cookies, then an existing cookie file.
    pub fn resolve(browser: Option<&str>, cookies_file: &Path) -> Self {
        match browser.map(str::trim) {
            Some(name) if !name.is_empty() && !name.eq_ignore_ascii_case("none") => {
                CookieSource::Browser(name.to_lowercase())
            }
            _ if cookies_file.is_file() => CookieSource::File(cookies_file.to_path_buf()),
            _ => CookieSource::None,
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            CookieSource::Browser(name) => vec!["--cookies-from-browser".into(), name.clone()],
            CookieSource::File(path) => vec!["--cookies".into(), path.to_string_lossy().into_owned()],
            CookieSource::None => Vec::new(),
        }
    }
}

/// Everything besides the output directory that shapes a run
#[derive(Debug, Clone)]
pub struct Settings {
    pub lists_dir: PathBuf,
    pub cookies: CookieSource,
    pub program: PathBuf,
    pub pacing: Pacing,
}

impl Settings {
    /// Defaults, overridden by `YTQUEUE_*` environment variables
    pub fn from_env() -> Self {
        let lists_dir = env::var_os("YTQUEUE_LISTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LISTS_DIR));
        let cookies_file = env::var_os("YTQUEUE_COOKIES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIES_FILE));
        let browser = env::var("YTQUEUE_COOKIES_BROWSER").unwrap_or_else(|_| DEFAULT_BROWSER.to_string());
        let program = env::var_os("YTQUEUE_YT_DLP")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM));

        Self {
            lists_dir,
            cookies: CookieSource::resolve(Some(&browser), &cookies_file),
            program,
            pacing: Pacing::default(),
        }
    }
}
