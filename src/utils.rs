//! Small helpers for logging and startup checks.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Truncate a string for logging purposes.
///
/// Strings longer than `max` bytes are cut at the nearest char boundary at or
/// below `max` and get `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Collapse runs of whitespace (including newlines from nested markup) to a
/// single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Make sure the directory that will hold `data_file` exists and is writable.
///
/// The directory is created if needed, then a probe file is written next to
/// the data file and removed again.
///
/// # Errors
///
/// Returns the underlying I/O error if the directory cannot be created or the
/// probe cannot be written.
#[instrument(level = "info", skip_all, fields(path = %data_file.display()))]
pub async fn ensure_writable_parent(data_file: &Path) -> io::Result<()> {
    let dir = match data_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let probe = dir.join("..__probe_write__");
    fs::write(&probe, b"").await?;
    let _ = fs::remove_file(&probe).await;
    info!(dir = %dir.display(), "Data directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // 'ñ' is two bytes; cutting at 3 would split the second one.
        let result = truncate_for_log("ññññ", 3);
        assert_eq!(result, "ñ…(+6 bytes)");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Hola\n\t  mundo  "), "Hola mundo");
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace("uno dos"), "uno dos");
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_file = dir.path().join("nested").join("noticias.json");

        ensure_writable_parent(&data_file).await.unwrap();

        assert!(dir.path().join("nested").is_dir());
        assert!(!dir.path().join("nested").join("..__probe_write__").exists());
    }
}
