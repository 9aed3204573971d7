// Conversion orchestration: single-file (asks where to save) and batch
// (derives output paths, never prompts). Batch runs strictly one file at
// a time and always to completion; one bad file never aborts the rest.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tauri::{AppHandle, Emitter, State};
use tracing::warn;

use crate::constants::{CONVERT_SUCCESS_MESSAGE, MISSING_PANDOC_MESSAGE};
use crate::errors::AppError;
use crate::formats::{InputFormat, OutputFormat};
use crate::history::{add_to_history, save_history_file};
use crate::message::{
    emit_message, emit_result_message, format_conversion_result_message, MessageType,
    ResultMessage,
};
use crate::pandoc::{self, ConversionOptions};
use crate::paths::resolve_pandoc_path;
use crate::progress::{
    find_progress_entry, update_conversion_progress, ConversionRecord, ProgressUpdate,
};
use crate::state::AppState;

pub(crate) struct SingleOutcome {
    pub success: bool,
    pub output_path: Option<String>,
    pub progress: Vec<ConversionRecord>,
    pub message: String,
}

pub(crate) struct BatchOutcome {
    pub success_count: usize,
    pub error_count: usize,
    pub progress: Vec<ConversionRecord>,
    pub new_history: Vec<ConversionRecord>,
}

pub(crate) struct StartOutcome {
    pub progress: Vec<ConversionRecord>,
    pub history: Vec<ConversionRecord>,
    pub message: ResultMessage,
}

/// File stem of the input plus the new extension, e.g. `notes.md` ->
/// `notes.docx`. Only the last extension is stripped.
pub(crate) fn suggested_output_name(input_path: &str, extension: &str) -> String {
    let stem = Path::new(input_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    format!("{}.{}", stem, extension)
}

/// Batch-mode output path: same directory, same stem, new extension.
pub(crate) fn derived_output_path(input_path: &str, extension: &str) -> PathBuf {
    let input = Path::new(input_path);
    let directory = input.parent().unwrap_or_else(|| Path::new("."));
    directory.join(suggested_output_name(input_path, extension))
}

fn success_message(backend_message: String) -> String {
    if backend_message.is_empty() {
        CONVERT_SUCCESS_MESSAGE.to_string()
    } else {
        backend_message
    }
}

/// Single-file flow. The save prompt blocks until the user picks a
/// location or cancels; cancellation is a non-error outcome that returns
/// the file to the queue.
pub(crate) fn convert_single_with<C, D>(
    input_path: &str,
    input_format: InputFormat,
    output_format: OutputFormat,
    progress: &[ConversionRecord],
    convert: C,
    prompt_save: D,
) -> SingleOutcome
where
    C: Fn(&ConversionOptions) -> Result<String, String>,
    D: FnOnce(&Path, &str, &str) -> Option<PathBuf>,
{
    if find_progress_entry(progress, input_path).is_none() {
        return SingleOutcome {
            success: false,
            output_path: None,
            progress: progress.to_vec(),
            message: "File not found in the conversion list".to_string(),
        };
    }

    let mut updated =
        update_conversion_progress(progress, input_path, ProgressUpdate::converting());

    let input = Path::new(input_path);
    let basename = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(input_path);
    let directory = input.parent().unwrap_or_else(|| Path::new("."));
    let suggested = suggested_output_name(input_path, output_format.extension());

    let Some(output_path) = prompt_save(directory, &suggested, output_format.extension()) else {
        updated = update_conversion_progress(&updated, input_path, ProgressUpdate::cancelled());
        return SingleOutcome {
            success: false,
            output_path: None,
            progress: updated,
            message: format!("Conversion of \"{}\" was cancelled", basename),
        };
    };
    let output_path = output_path.to_string_lossy().to_string();

    let options = ConversionOptions {
        input_path: input_path.to_string(),
        output_format,
        output_path: output_path.clone(),
        input_format,
    };

    match convert(&options) {
        Ok(result) => {
            let message = success_message(result);
            updated = update_conversion_progress(
                &updated,
                input_path,
                ProgressUpdate::succeeded(message.clone(), output_path.clone()),
            );
            SingleOutcome {
                success: true,
                output_path: Some(output_path),
                progress: updated,
                message,
            }
        }
        Err(err) => {
            warn!("Conversion of '{}' failed: {}", input_path, err);
            let message = format!("Conversion failed: {}", err);
            updated = update_conversion_progress(
                &updated,
                input_path,
                ProgressUpdate::failed(message.clone()),
            );
            SingleOutcome {
                success: false,
                output_path: None,
                progress: updated,
                message,
            }
        }
    }
}

/// Batch flow: sequential, no prompts, no early abort. Successful files
/// are snapshotted into a fresh history accumulator (newest first).
pub(crate) fn convert_batch_with<C>(
    input_paths: &[String],
    input_format: InputFormat,
    output_format: OutputFormat,
    progress: &[ConversionRecord],
    convert: C,
) -> BatchOutcome
where
    C: Fn(&ConversionOptions) -> Result<String, String>,
{
    let mut updated = progress.to_vec();
    let mut new_history: Vec<ConversionRecord> = Vec::new();
    let mut success_count = 0;
    let mut error_count = 0;

    for current_path in input_paths {
        if find_progress_entry(&updated, current_path).is_none() {
            warn!("Skipping file {}, not found in progress list", current_path);
            continue;
        }

        updated =
            update_conversion_progress(&updated, current_path, ProgressUpdate::converting());

        let output_path = derived_output_path(current_path, output_format.extension())
            .to_string_lossy()
            .to_string();

        let options = ConversionOptions {
            input_path: current_path.clone(),
            output_format,
            output_path: output_path.clone(),
            input_format,
        };

        match convert(&options) {
            Ok(result) => {
                updated = update_conversion_progress(
                    &updated,
                    current_path,
                    ProgressUpdate::succeeded(success_message(result), output_path),
                );
                if let Some((_, entry)) = find_progress_entry(&updated, current_path) {
                    new_history = add_to_history(&new_history, entry);
                }
                success_count += 1;
            }
            Err(err) => {
                warn!("Conversion of '{}' failed: {}", current_path, err);
                updated = update_conversion_progress(
                    &updated,
                    current_path,
                    ProgressUpdate::failed(format!("Conversion failed: {}", err)),
                );
                error_count += 1;
            }
        }
    }

    BatchOutcome {
        success_count,
        error_count,
        progress: updated,
        new_history,
    }
}

/// Top-level dispatch over the selected paths. Zero files is a warning,
/// one file goes through the prompting single flow, more than one goes
/// through the batch flow with new history entries prepended ahead of the
/// existing log.
pub(crate) fn start_conversion_with<C, D>(
    input_paths: &[String],
    input_format: InputFormat,
    output_format: OutputFormat,
    progress: &[ConversionRecord],
    history: &[ConversionRecord],
    convert: C,
    prompt_save: D,
) -> StartOutcome
where
    C: Fn(&ConversionOptions) -> Result<String, String>,
    D: FnOnce(&Path, &str, &str) -> Option<PathBuf>,
{
    if input_paths.is_empty() {
        return StartOutcome {
            progress: progress.to_vec(),
            history: history.to_vec(),
            message: ResultMessage::new(MessageType::Warning, "Select input files first"),
        };
    }

    if input_paths.len() == 1 {
        let result = convert_single_with(
            &input_paths[0],
            input_format,
            output_format,
            progress,
            convert,
            prompt_save,
        );

        let mut updated_history = history.to_vec();
        if result.success && result.output_path.is_some() {
            if let Some((_, entry)) = find_progress_entry(&result.progress, &input_paths[0]) {
                updated_history = add_to_history(history, entry);
            }
        }

        let kind = if result.success {
            MessageType::Success
        } else {
            // Cancellation and per-file errors were already recorded on
            // the ledger entry; the summary stays informational.
            MessageType::Info
        };

        StartOutcome {
            progress: result.progress,
            history: updated_history,
            message: ResultMessage::new(kind, result.message),
        }
    } else {
        let result =
            convert_batch_with(input_paths, input_format, output_format, progress, convert);

        let message =
            format_conversion_result_message(result.success_count, result.error_count);

        let mut updated_history = result.new_history;
        updated_history.extend_from_slice(history);

        StartOutcome {
            progress: result.progress,
            history: updated_history,
            message,
        }
    }
}

fn prompt_save_path(directory: &Path, suggested: &str, extension: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Choose save location")
        .set_directory(directory)
        .set_file_name(suggested)
        .add_filter(extension.to_uppercase(), &[extension])
        .save_file()
}

fn run_start_conversion(
    app: &AppHandle,
    state: &AppState,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> ResultMessage {
    let input_paths = state.input_paths.lock().unwrap().clone();
    let progress = state.progress.lock().unwrap().clone();
    let history = state.history.lock().unwrap().clone();
    let (pandoc, keep_history) = {
        let settings = state.settings.lock().unwrap();
        (resolve_pandoc_path(&settings), settings.keep_history)
    };

    let convert = |options: &ConversionOptions| match pandoc.as_deref() {
        Some(path) => pandoc::convert(path, options),
        None => Err(MISSING_PANDOC_MESSAGE.to_string()),
    };

    let outcome = start_conversion_with(
        &input_paths,
        input_format,
        output_format,
        &progress,
        &history,
        convert,
        prompt_save_path,
    );

    let history_changed = outcome.history.len() != history.len();

    *state.progress.lock().unwrap() = outcome.progress.clone();
    let _ = app.emit("conversion:progress", outcome.progress);

    if history_changed {
        *state.history.lock().unwrap() = outcome.history.clone();
        let _ = app.emit("history:updated", outcome.history.clone());
        if keep_history {
            if let Err(err) = save_history_file(app, &outcome.history) {
                warn!("Failed to save history: {}", err);
                crate::emit_error(app, AppError::Storage(err), Some("Saving history"));
            }
        }
    }

    emit_result_message(app, &outcome.message);
    outcome.message
}

#[tauri::command]
pub(crate) fn start_conversion(
    app: AppHandle,
    state: State<'_, AppState>,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<ResultMessage, String> {
    // The app never runs two conversions at once.
    if state.converting.swap(true, Ordering::AcqRel) {
        let message = ResultMessage::new(MessageType::Warning, "A conversion is already running.");
        emit_result_message(&app, &message);
        return Ok(message);
    }

    let message = run_start_conversion(&app, &state, input_format, output_format);
    state.converting.store(false, Ordering::Release);
    Ok(message)
}

#[tauri::command]
pub(crate) fn generate_preview(
    app: AppHandle,
    state: State<'_, AppState>,
    input_format: InputFormat,
) -> Result<String, String> {
    let input_paths = state.input_paths.lock().unwrap().clone();
    if input_paths.is_empty() {
        emit_message(&app, MessageType::Warning, "Select a file first");
        return Err("No input files selected".to_string());
    }
    if input_paths.len() > 1 {
        emit_message(
            &app,
            MessageType::Warning,
            "Preview does not support multiple files",
        );
        return Err("Preview is limited to a single file".to_string());
    }

    let pandoc = {
        let settings = state.settings.lock().unwrap();
        pandoc::required_pandoc(&settings)?
    };

    match pandoc::preview(&pandoc, &input_paths[0], input_format) {
        Ok(html) => {
            emit_message(&app, MessageType::Success, "Preview generated");
            Ok(html)
        }
        Err(err) => {
            crate::emit_error(&app, AppError::Preview(err.clone()), Some("Preview"));
            Err(format!("Preview failed: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CANCELLED_MESSAGE;
    use crate::progress::{add_file_to_progress, ConversionStage};

    fn ledger_with(paths: &[&str]) -> (Vec<String>, Vec<ConversionRecord>) {
        let mut input_paths = Vec::new();
        let mut progress = Vec::new();
        for path in paths {
            let outcome = add_file_to_progress(path, &input_paths, &progress);
            input_paths = outcome.input_paths;
            progress = outcome.progress;
        }
        (input_paths, progress)
    }

    fn ok_convert(options: &ConversionOptions) -> Result<String, String> {
        Ok(format!("converted to {}", options.output_path))
    }

    fn no_prompt(_: &Path, _: &str, _: &str) -> Option<PathBuf> {
        panic!("save dialog must not be shown");
    }

    #[test]
    fn suggested_name_strips_only_the_last_extension() {
        assert_eq!(suggested_output_name("/docs/notes.md", "docx"), "notes.docx");
        assert_eq!(
            suggested_output_name("/docs/report.v2.md", "html"),
            "report.v2.html"
        );
        assert_eq!(suggested_output_name("/docs/README", "md"), "README.md");
    }

    #[test]
    fn derived_path_stays_in_the_input_directory() {
        assert_eq!(
            derived_output_path("/docs/notes.md", "docx"),
            PathBuf::from("/docs/notes.docx")
        );
    }

    #[test]
    fn single_fails_fast_when_record_is_missing() {
        let (_, progress) = ledger_with(&["/a.md"]);
        let result = convert_single_with(
            "/other.md",
            InputFormat::Auto,
            OutputFormat::Docx,
            &progress,
            |_| panic!("backend must not be called"),
            no_prompt,
        );
        assert!(!result.success);
        assert_eq!(result.progress, progress);
        assert_eq!(result.message, "File not found in the conversion list");
    }

    #[test]
    fn single_cancel_returns_the_file_to_pending() {
        let (_, progress) = ledger_with(&["/docs/a.md"]);
        let result = convert_single_with(
            "/docs/a.md",
            InputFormat::Auto,
            OutputFormat::Docx,
            &progress,
            |_| panic!("backend must not be called after cancel"),
            |_, _, _| None,
        );
        assert!(!result.success);
        assert!(result.message.contains("\"a.md\""));
        assert!(result.message.contains("cancelled"));
        let record = &result.progress[0];
        assert_eq!(record.status, ConversionStage::Pending);
        assert_eq!(record.message, CANCELLED_MESSAGE);
        assert!(record.is_success);
    }

    #[test]
    fn single_success_records_the_chosen_output_path() {
        let (_, progress) = ledger_with(&["/docs/a.md"]);
        let result = convert_single_with(
            "/docs/a.md",
            InputFormat::Markdown,
            OutputFormat::Html,
            &progress,
            ok_convert,
            |directory, suggested, extension| {
                assert_eq!(directory, Path::new("/docs"));
                assert_eq!(suggested, "a.html");
                assert_eq!(extension, "html");
                Some(PathBuf::from("/elsewhere/a.html"))
            },
        );
        assert!(result.success);
        assert_eq!(result.output_path.as_deref(), Some("/elsewhere/a.html"));
        let record = &result.progress[0];
        assert_eq!(record.status, ConversionStage::Success);
        assert_eq!(record.output_path.as_deref(), Some("/elsewhere/a.html"));
    }

    #[test]
    fn single_error_marks_the_record() {
        let (_, progress) = ledger_with(&["/docs/a.md"]);
        let result = convert_single_with(
            "/docs/a.md",
            InputFormat::Auto,
            OutputFormat::Docx,
            &progress,
            |_| Err("bad input".to_string()),
            |_, _, _| Some(PathBuf::from("/docs/a.docx")),
        );
        assert!(!result.success);
        let record = &result.progress[0];
        assert_eq!(record.status, ConversionStage::Error);
        assert_eq!(record.message, "Conversion failed: bad input");
        assert!(!record.is_success);
    }

    #[test]
    fn batch_counts_and_collects_history_without_aborting() {
        let (input_paths, progress) = ledger_with(&["/a.md", "/b.md", "/c.md"]);
        let result = convert_batch_with(
            &input_paths,
            InputFormat::Auto,
            OutputFormat::Docx,
            &progress,
            |options| {
                if options.input_path == "/b.md" {
                    Err("boom".to_string())
                } else {
                    ok_convert(options)
                }
            },
        );

        assert_eq!(result.success_count, 2);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.new_history.len(), 2);
        // newest first: /c.md converted after /a.md
        assert_eq!(result.new_history[0].path, "/c.md");
        assert_eq!(result.new_history[1].path, "/a.md");

        assert_eq!(result.progress[0].status, ConversionStage::Success);
        assert_eq!(result.progress[1].status, ConversionStage::Error);
        assert_eq!(result.progress[2].status, ConversionStage::Success);
        assert_eq!(
            result.progress[0].output_path.as_deref(),
            Some("/a.docx")
        );
    }

    #[test]
    fn batch_skips_paths_missing_from_the_ledger() {
        let (_, progress) = ledger_with(&["/a.md"]);
        let input_paths = vec!["/a.md".to_string(), "/ghost.md".to_string()];
        let result = convert_batch_with(
            &input_paths,
            InputFormat::Auto,
            OutputFormat::Docx,
            &progress,
            ok_convert,
        );
        assert_eq!(result.success_count, 1);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.progress.len(), 1);
    }

    #[test]
    fn start_with_no_files_is_a_warning_and_leaves_state_alone() {
        let outcome = start_conversion_with(
            &[],
            InputFormat::Auto,
            OutputFormat::Docx,
            &[],
            &[],
            |_| panic!("backend must not be called"),
            no_prompt,
        );
        assert_eq!(outcome.message.kind, MessageType::Warning);
        assert!(outcome.progress.is_empty());
        assert!(outcome.history.is_empty());
    }

    #[test]
    fn start_single_success_prepends_to_history() {
        let (input_paths, progress) = ledger_with(&["/a.md"]);
        let existing = vec![ConversionRecord::pending("/old.md")];
        let outcome = start_conversion_with(
            &input_paths,
            InputFormat::Auto,
            OutputFormat::Docx,
            &progress,
            &existing,
            ok_convert,
            |_, _, _| Some(PathBuf::from("/a.docx")),
        );
        assert_eq!(outcome.message.kind, MessageType::Success);
        assert_eq!(outcome.history.len(), 2);
        assert_eq!(outcome.history[0].path, "/a.md");
        assert_eq!(outcome.history[1].path, "/old.md");
    }

    #[test]
    fn start_single_cancel_is_informational_and_keeps_history() {
        let (input_paths, progress) = ledger_with(&["/a.md"]);
        let outcome = start_conversion_with(
            &input_paths,
            InputFormat::Auto,
            OutputFormat::Docx,
            &progress,
            &[],
            |_| panic!("backend must not be called"),
            |_, _, _| None,
        );
        assert_eq!(outcome.message.kind, MessageType::Info);
        assert!(outcome.history.is_empty());
        assert_eq!(outcome.progress[0].message, CANCELLED_MESSAGE);
        assert_eq!(outcome.progress[0].status, ConversionStage::Pending);
    }

    #[test]
    fn start_batch_prepends_new_entries_ahead_of_existing_history() {
        let (input_paths, progress) = ledger_with(&["/a.md", "/b.md"]);
        let existing = vec![ConversionRecord::pending("/old.md")];
        let outcome = start_conversion_with(
            &input_paths,
            InputFormat::Auto,
            OutputFormat::Docx,
            &progress,
            &existing,
            ok_convert,
            no_prompt,
        );
        assert_eq!(outcome.message.kind, MessageType::Success);
        assert_eq!(outcome.history.len(), 3);
        assert_eq!(outcome.history[2].path, "/old.md");
    }

    #[test]
    fn start_batch_with_failures_reports_a_warning() {
        let (input_paths, progress) = ledger_with(&["/a.md", "/b.md", "/c.md"]);
        let outcome = start_conversion_with(
            &input_paths,
            InputFormat::Auto,
            OutputFormat::Docx,
            &progress,
            &[],
            |options| {
                if options.input_path == "/b.md" {
                    Err("boom".to_string())
                } else {
                    ok_convert(options)
                }
            },
            no_prompt,
        );
        assert_eq!(outcome.message.kind, MessageType::Warning);
        assert_eq!(outcome.history.len(), 2);
    }
}
