use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::sanitize::{sanitize_name, UNKNOWN_TITLE};

/// Date sentinel for rows without a usable upload date
pub const NO_DATE: &str = "NA";

/// yt-dlp output field substituted with the real upload date at download time
pub const UPLOAD_DATE_PLACEHOLDER: &str = "%(upload_date)s";

// 11-character video ID after a short link or a `v=` query parameter
static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:youtu\.be/|v=)([0-9A-Za-z_-]{11})").unwrap());

/// One raw row of a list file, before ID resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLine {
    pub url: String,
    pub title: String,
    pub date: String,
}

/// A resolved, deduplicated unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub raw_line: String,
    pub url: String,
    pub video_id: String,
    pub title: String,
    pub date: Option<String>,
    pub filename_template: String,
}

impl ListEntry {
    /// Short label for console output
    pub fn log_name(&self) -> String {
        if self.filename_template.starts_with(UPLOAD_DATE_PLACEHOLDER) {
            let head: String = self.title.chars().take(30).collect();
            format!("[Auto-Date] ...{}...", head)
        } else {
            self.filename_template.clone()
        }
    }
}

/// Parse one list row. Blank rows and `#` comments yield `None`.
///
/// Rows are either a bare URL or `|`-delimited with the URL last:
/// `DATE|TITLE...|URL` or `TITLE|URL`. Anything missing falls back to
/// the title and date sentinels.
pub fn parse_line(line: &str) -> Option<ListLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    if !line.contains('|') {
        return Some(ListLine {
            url: line.to_string(),
            title: UNKNOWN_TITLE.to_string(),
            date: NO_DATE.to_string(),
        });
    }

    let parts: Vec<&str> = line.split('|').collect();
    let url = parts[parts.len() - 1].trim().to_string();

    let (title, date) = match parts.len() {
        2 => (parts[0].trim().to_string(), NO_DATE.to_string()),
        n => (
            parts[1..n - 1].join(" ").trim().to_string(),
            parts[0].trim().to_string(),
        ),
    };

    Some(ListLine { url, title, date })
}

/// Pull the 11-character video ID out of a watch or short URL
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    VIDEO_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_literal_date(date: &str) -> bool {
    date != NO_DATE && date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit())
}

/// Output file stem (no extension) for an entry.
///
/// A literal `YYYYMMDD` date is embedded directly; otherwise yt-dlp fills in
/// the upload date.
pub fn filename_template(date: &str, title: &str, video_id: &str) -> String {
    let safe_title = sanitize_name(title);
    if is_literal_date(date) {
        format!("{}_{}_yt_{}", date, safe_title, video_id)
    } else {
        format!("{}_{}_yt_{}", UPLOAD_DATE_PLACEHOLDER, safe_title, video_id)
    }
}

/// Resolve a single row into an entry, dropping rows without a video ID
pub fn parse_entry(raw: &str) -> Option<ListEntry> {
    let data = parse_line(raw)?;
    let video_id = extract_video_id(&data.url)?;
    let filename_template = filename_template(&data.date, &data.title, &video_id);

    Some(ListEntry {
        raw_line: raw.to_string(),
        date: (data.date != NO_DATE).then_some(data.date),
        url: data.url,
        video_id,
        title: data.title,
        filename_template,
    })
}

/// Parse a whole list file. The first row for a given video ID wins.
pub fn parse_list(content: &str) -> Vec<ListEntry> {
    let mut seen = HashSet::new();

    content
        .lines()
        .filter_map(parse_entry)
        .filter(|entry| seen.insert(entry.video_id.clone()))
        .collect()
}
