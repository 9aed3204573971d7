use serde::Serialize;
use std::fs;
use std::path::Path;
use tauri::AppHandle;
use tracing::info;

use crate::constants::HISTORY_FILE;
use crate::paths::resolve_data_path;
use crate::progress::{ConversionRecord, ConversionStage};

/// Prepend a snapshot of a finished conversion, stamped with the current
/// time. The log is newest-first, uncapped, and never deduplicated:
/// converting the same pair twice produces two entries.
pub fn add_to_history(
    history: &[ConversionRecord],
    entry: &ConversionRecord,
) -> Vec<ConversionRecord> {
    let mut stamped = entry.clone();
    stamped.converted_at = Some(chrono::Local::now().to_rfc3339());

    let mut updated = Vec::with_capacity(history.len() + 1);
    updated.push(stamped);
    updated.extend_from_slice(history);
    updated
}

/// Remove the first entry matching `(path, output_path)`. Identity is the
/// pair, not the path alone, so the same input converted to two different
/// outputs stays as two deletable entries.
pub fn delete_history_item(
    history: &[ConversionRecord],
    path: &str,
    output_path: Option<&str>,
) -> (Vec<ConversionRecord>, bool) {
    let Some(index) = history
        .iter()
        .position(|item| item.path == path && item.output_path.as_deref() == output_path)
    else {
        return (history.to_vec(), false);
    };

    let mut updated = history.to_vec();
    updated.remove(index);
    (updated, true)
}

pub fn find_history_item<'a>(
    history: &'a [ConversionRecord],
    path: &str,
    output_path: Option<&str>,
) -> Option<&'a ConversionRecord> {
    history
        .iter()
        .find(|item| item.path == path && item.output_path.as_deref() == output_path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

pub fn get_history_stats(history: &[ConversionRecord]) -> HistoryStats {
    HistoryStats {
        total: history.len(),
        successful: history
            .iter()
            .filter(|item| item.status == ConversionStage::Success)
            .count(),
        failed: history
            .iter()
            .filter(|item| item.status == ConversionStage::Error)
            .count(),
    }
}

pub fn read_history_file(path: &Path) -> Result<Vec<ConversionRecord>, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

pub fn write_history_file(path: &Path, history: &[ConversionRecord]) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(history).map_err(|e| e.to_string())?;
    fs::write(path, raw).map_err(|e| e.to_string())
}

/// Load the persisted history. A missing file is a normal first run and
/// yields an empty log; a present-but-unreadable file is an error the
/// caller surfaces (and then degrades to an empty log).
pub(crate) fn load_history(app: &AppHandle) -> Result<Vec<ConversionRecord>, String> {
    let path = resolve_data_path(app, HISTORY_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let history = read_history_file(&path)?;
    info!("Loaded {} history entries", history.len());
    Ok(history)
}

pub(crate) fn save_history_file(
    app: &AppHandle,
    history: &[ConversionRecord],
) -> Result<(), String> {
    let path = resolve_data_path(app, HISTORY_FILE);
    write_history_file(&path, history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressUpdate;

    fn success_record(path: &str, output_path: &str) -> ConversionRecord {
        let record = ConversionRecord::pending(path);
        crate::progress::update_conversion_progress(
            &[record],
            path,
            ProgressUpdate::succeeded("done", output_path),
        )
        .remove(0)
    }

    #[test]
    fn add_prepends_and_stamps() {
        let history = add_to_history(&[], &success_record("/a.md", "/a.docx"));
        let history = add_to_history(&history, &success_record("/b.md", "/b.docx"));

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].path, "/b.md");
        assert_eq!(history[1].path, "/a.md");
        assert!(history[0].converted_at.is_some());
    }

    #[test]
    fn same_pair_twice_is_two_entries() {
        let entry = success_record("/a.md", "/a.docx");
        let history = add_to_history(&[], &entry);
        let history = add_to_history(&history, &entry);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn delete_matches_the_full_pair() {
        let history = add_to_history(&[], &success_record("/a.md", "/a.docx"));
        let history = add_to_history(&history, &success_record("/a.md", "/a.html"));

        let (updated, deleted) = delete_history_item(&history, "/a.md", Some("/a.docx"));
        assert!(deleted);
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].output_path.as_deref(), Some("/a.html"));

        let (unchanged, deleted) = delete_history_item(&updated, "/a.md", Some("/a.docx"));
        assert!(!deleted);
        assert_eq!(unchanged.len(), 1);
    }

    #[test]
    fn delete_removes_only_the_first_duplicate() {
        let entry = success_record("/a.md", "/a.docx");
        let history = add_to_history(&[], &entry);
        let history = add_to_history(&history, &entry);

        let (updated, deleted) = delete_history_item(&history, "/a.md", Some("/a.docx"));
        assert!(deleted);
        assert_eq!(updated.len(), 1);
    }

    #[test]
    fn find_matches_pair_or_nothing() {
        let history = add_to_history(&[], &success_record("/a.md", "/a.docx"));
        assert!(find_history_item(&history, "/a.md", Some("/a.docx")).is_some());
        assert!(find_history_item(&history, "/a.md", Some("/a.html")).is_none());
        assert!(find_history_item(&history, "/a.md", None).is_none());
    }

    #[test]
    fn stats_count_by_status() {
        let mut history = add_to_history(&[], &success_record("/a.md", "/a.docx"));
        let failed = crate::progress::update_conversion_progress(
            &[ConversionRecord::pending("/b.md")],
            "/b.md",
            ProgressUpdate::failed("boom"),
        )
        .remove(0);
        history = add_to_history(&history, &failed);

        let stats = get_history_stats(&history);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let history = add_to_history(&[], &success_record("/a.md", "/a.docx"));
        write_history_file(&path, &history).unwrap();

        let loaded = read_history_file(&path).unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn reads_legacy_entries_without_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[{"path":"/a.md","status":"success","message":"ok","isSuccess":true,"outputPath":"/a.docx"}]"#,
        )
        .unwrap();

        let loaded = read_history_file(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].converted_at.is_none());
        assert_eq!(loaded[0].output_path.as_deref(), Some("/a.docx"));
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();
        assert!(read_history_file(&path).is_err());
    }
}
