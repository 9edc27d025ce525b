use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use time::macros::format_description;

static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern"));

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

/// `YYYY-MM-DD HH:MM` in UTC, used in provider build names.
pub fn now_build_stamp() -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]");
    time::OffsetDateTime::now_utc()
        .format(&fmt)
        .unwrap_or_else(|_| "1970-01-01 00:00".to_string())
}

/// Lowercase, dash-separated form of a device name for provider tags.
pub fn slug(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    NON_SLUG.replace_all(&lower, "-").trim_matches('-').to_string()
}
