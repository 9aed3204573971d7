// DocShift - core app runtime

mod constants;
mod convert;
mod editor;
mod errors;
mod formats;
mod history;
mod message;
mod pandoc;
mod paths;
mod progress;
mod state;

use errors::{AppError, ErrorEvent};
use formats::{FormatOption, InputFormat, OutputFormat};
use message::{emit_message, MessageType};
use progress::{
    add_file_to_progress, clear_all_files, is_pdf_file, remove_file_from_progress,
    reset_progress_to_pending, ConversionRecord,
};
use serde::Serialize;
use state::{load_settings, save_settings_file, AppState, Settings};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use tauri::{AppHandle, Emitter, Manager, State, Wry};
use tracing::{error, info, warn};

use crate::convert::{generate_preview, start_conversion};
use crate::editor::{convert_and_save_content, save_markdown_file, save_raw_content};
use crate::history::{
    delete_history_item, find_history_item, get_history_stats, save_history_file, HistoryStats,
};
use crate::pandoc::{
    check_pandoc, convert_content, convert_file, pandoc_version_info, preview_file,
};

#[tauri::command]
fn get_settings(state: State<'_, AppState>) -> Settings {
    state.settings.lock().unwrap().clone()
}

#[tauri::command]
fn save_settings(
    app: AppHandle,
    state: State<'_, AppState>,
    settings: Settings,
) -> Result<(), String> {
    {
        let mut current = state.settings.lock().unwrap();
        *current = settings.clone();
    }
    save_settings_file(&app, &settings)?;
    let _ = app.emit("settings-changed", settings);
    Ok(())
}

#[tauri::command]
fn get_app_version(app: AppHandle) -> String {
    app.package_info().version.to_string()
}

#[derive(Debug, Clone, Serialize)]
struct FormatRegistry {
    input: Vec<FormatOption>,
    output: Vec<FormatOption>,
}

#[tauri::command]
fn list_formats() -> FormatRegistry {
    FormatRegistry {
        input: InputFormat::ALL
            .iter()
            .map(|format| FormatOption {
                value: format.as_str(),
                label: format.label(),
            })
            .collect(),
        output: OutputFormat::ALL
            .iter()
            .map(|format| FormatOption {
                value: format.as_str(),
                label: format.label(),
            })
            .collect(),
    }
}

#[tauri::command]
fn get_progress(state: State<'_, AppState>) -> Vec<ConversionRecord> {
    state.progress.lock().unwrap().clone()
}

#[tauri::command]
fn get_input_paths(state: State<'_, AppState>) -> Vec<String> {
    state.input_paths.lock().unwrap().clone()
}

/// Shared by the file picker, drag-drop, and the `add_files` command:
/// funnels every new path through the ledger rules (PDF rejection,
/// duplicate rejection) and publishes the updated collections.
fn add_paths_inner(app: &AppHandle, state: &AppState, paths: &[String]) -> usize {
    let mut input_paths = state.input_paths.lock().unwrap().clone();
    let mut progress = state.progress.lock().unwrap().clone();
    let mut added_count = 0;

    for path in paths {
        if is_pdf_file(path) {
            emit_message(
                app,
                MessageType::Warning,
                format!("PDF files are not supported for direct conversion: {}", path),
            );
            continue;
        }

        let outcome = add_file_to_progress(path, &input_paths, &progress);
        if outcome.added {
            input_paths = outcome.input_paths;
            progress = outcome.progress;
            added_count += 1;
            info!("File added: {}", path);
        }
    }

    if added_count > 0 {
        *state.input_paths.lock().unwrap() = input_paths.clone();
        *state.progress.lock().unwrap() = progress.clone();
        let _ = app.emit("files:changed", input_paths);
        let _ = app.emit("conversion:progress", progress);
        emit_message(
            app,
            MessageType::Success,
            format!("Added {} file(s)", added_count),
        );
    }

    added_count
}

#[tauri::command]
fn add_files(app: AppHandle, state: State<'_, AppState>, paths: Vec<String>) -> usize {
    add_paths_inner(&app, &state, &paths)
}

#[tauri::command]
fn select_files(app: AppHandle, state: State<'_, AppState>) -> Result<usize, String> {
    let Some(picked) = rfd::FileDialog::new()
        .set_title("Select input files")
        .pick_files()
    else {
        return Ok(0);
    };

    let paths: Vec<String> = picked
        .into_iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect();
    Ok(add_paths_inner(&app, &state, &paths))
}

#[tauri::command]
fn remove_file(app: AppHandle, state: State<'_, AppState>, path: String) {
    let (input_paths, progress) = {
        let current_paths = state.input_paths.lock().unwrap();
        let current_progress = state.progress.lock().unwrap();
        remove_file_from_progress(&path, &current_paths, &current_progress)
    };

    *state.input_paths.lock().unwrap() = input_paths.clone();
    *state.progress.lock().unwrap() = progress.clone();
    let _ = app.emit("files:changed", input_paths);
    let _ = app.emit("conversion:progress", progress);
}

#[tauri::command]
fn clear_files(app: AppHandle, state: State<'_, AppState>) {
    let (input_paths, progress) = clear_all_files();
    *state.input_paths.lock().unwrap() = input_paths.clone();
    *state.progress.lock().unwrap() = progress.clone();
    let _ = app.emit("files:changed", input_paths);
    let _ = app.emit("conversion:progress", progress);
}

#[tauri::command]
fn reset_progress(app: AppHandle, state: State<'_, AppState>) -> Vec<ConversionRecord> {
    let progress = {
        let current = state.progress.lock().unwrap();
        reset_progress_to_pending(&current)
    };
    *state.progress.lock().unwrap() = progress.clone();
    let _ = app.emit("conversion:progress", progress.clone());
    progress
}

#[tauri::command]
fn get_history(state: State<'_, AppState>) -> Vec<ConversionRecord> {
    state.history.lock().unwrap().clone()
}

#[tauri::command]
fn load_history(app: AppHandle, state: State<'_, AppState>) -> Vec<ConversionRecord> {
    let history = match history::load_history(&app) {
        Ok(history) => history,
        Err(err) => {
            // A broken history file degrades to an empty log; it never
            // blocks the app.
            emit_error(
                &app,
                AppError::Storage(format!("Failed to load history: {}", err)),
                Some("History"),
            );
            Vec::new()
        }
    };

    *state.history.lock().unwrap() = history.clone();
    let _ = app.emit("history:updated", history.clone());
    history
}

#[tauri::command]
fn save_history(
    app: AppHandle,
    state: State<'_, AppState>,
    history: Vec<ConversionRecord>,
) -> Result<(), String> {
    *state.history.lock().unwrap() = history.clone();
    save_history_file(&app, &history)
}

fn persist_history(app: &AppHandle, state: &AppState, history: &[ConversionRecord]) {
    let keep_history = state.settings.lock().unwrap().keep_history;
    if !keep_history {
        return;
    }
    if let Err(err) = save_history_file(app, history) {
        warn!("Failed to save history: {}", err);
        emit_error(app, AppError::Storage(err), Some("Saving history"));
    }
}

#[tauri::command]
fn delete_history_entry(
    app: AppHandle,
    state: State<'_, AppState>,
    path: String,
    output_path: Option<String>,
) -> bool {
    let (updated, deleted) = {
        let history = state.history.lock().unwrap();
        delete_history_item(&history, &path, output_path.as_deref())
    };

    if deleted {
        *state.history.lock().unwrap() = updated.clone();
        let _ = app.emit("history:updated", updated.clone());
        persist_history(&app, &state, &updated);
        emit_message(&app, MessageType::Success, "History entry deleted");
    } else {
        emit_message(&app, MessageType::Warning, "No matching history entry found");
    }

    deleted
}

#[tauri::command]
fn clear_history(app: AppHandle, state: State<'_, AppState>) {
    let empty: Vec<ConversionRecord> = Vec::new();
    *state.history.lock().unwrap() = empty.clone();
    let _ = app.emit("history:updated", empty.clone());
    persist_history(&app, &state, &empty);
    emit_message(&app, MessageType::Success, "History cleared");
}

#[tauri::command]
fn history_stats(state: State<'_, AppState>) -> HistoryStats {
    let history = state.history.lock().unwrap();
    get_history_stats(&history)
}

#[tauri::command]
fn find_history_entry(
    state: State<'_, AppState>,
    path: String,
    output_path: Option<String>,
) -> Option<ConversionRecord> {
    let history = state.history.lock().unwrap();
    find_history_item(&history, &path, output_path.as_deref()).cloned()
}

#[tauri::command]
fn open_file_in_default_app(path: String) -> Result<(), String> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("explorer")
            .arg(&path)
            .spawn()
            .map_err(|e| format!("Failed to open file: {}", e))?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(&path)
            .spawn()
            .map_err(|e| format!("Failed to open file: {}", e))?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(&path)
            .spawn()
            .map_err(|e| format!("Failed to open file: {}", e))?;
    }

    Ok(())
}

#[tauri::command]
fn show_in_folder(path: String) -> Result<(), String> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("explorer")
            .arg("/select,")
            .arg(&path)
            .spawn()
            .map_err(|e| format!("Failed to show file in folder: {}", e))?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg("-R")
            .arg(&path)
            .spawn()
            .map_err(|e| format!("Failed to show file in folder: {}", e))?;
    }

    #[cfg(target_os = "linux")]
    {
        let parent = std::path::Path::new(&path)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        std::process::Command::new("xdg-open")
            .arg(parent)
            .spawn()
            .map_err(|e| format!("Failed to show file in folder: {}", e))?;
    }

    Ok(())
}

fn handle_file_drop(app: &AppHandle, paths: &[PathBuf]) {
    if paths.is_empty() {
        warn!("File drop received an empty path list");
        return;
    }

    let paths: Vec<String> = paths
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect();
    let state = app.state::<AppState>();
    let added = add_paths_inner(app, &state, &paths);
    info!("{} file(s) added via drag and drop", added);
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("DocShift starting up");
}

pub(crate) fn emit_error(app: &AppHandle, error: AppError, context: Option<&str>) {
    let event = if let Some(ctx) = context {
        ErrorEvent::new(error.clone()).with_context(ctx)
    } else {
        ErrorEvent::new(error.clone())
    };

    error!("{}: {}", error.title(), error.message());

    let _ = app.emit("app:error", event);
}

fn with_desktop_plugins(builder: tauri::Builder<Wry>) -> tauri::Builder<Wry> {
    #[cfg(test)]
    {
        builder
    }

    #[cfg(not(test))]
    {
        builder
            .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
                if let Some(window) = app.get_webview_window("main") {
                    let _ = window.set_focus();
                }
            }))
            .plugin(tauri_plugin_dialog::init())
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_logging();

    info!("Starting DocShift application");
    let builder = tauri::Builder::default();
    with_desktop_plugins(builder)
        .setup(|app| {
            let settings = load_settings(app.handle());
            let history = match history::load_history(app.handle()) {
                Ok(history) => history,
                Err(err) => {
                    emit_error(
                        app.handle(),
                        AppError::Storage(format!("Failed to load history: {}", err)),
                        Some("Startup"),
                    );
                    Vec::new()
                }
            };

            if paths::resolve_pandoc_path(&settings).is_none() {
                warn!("pandoc executable not found; conversions will fail until it is installed");
            }

            app.manage(AppState {
                settings: Mutex::new(settings),
                input_paths: Mutex::new(Vec::new()),
                progress: Mutex::new(Vec::new()),
                history: Mutex::new(history),
                converting: AtomicBool::new(false),
            });

            Ok(())
        })
        .on_window_event(|window, event| {
            if window.label() != "main" {
                return;
            }

            if let tauri::WindowEvent::DragDrop(tauri::DragDropEvent::Drop { paths, .. }) = event {
                handle_file_drop(window.app_handle(), paths);
            }
        })
        .invoke_handler(tauri::generate_handler![
            get_settings,
            save_settings,
            get_app_version,
            list_formats,
            get_progress,
            get_input_paths,
            add_files,
            select_files,
            remove_file,
            clear_files,
            reset_progress,
            get_history,
            load_history,
            save_history,
            delete_history_entry,
            clear_history,
            history_stats,
            find_history_entry,
            open_file_in_default_app,
            show_in_folder,
            start_conversion,
            generate_preview,
            convert_file,
            convert_content,
            preview_file,
            check_pandoc,
            pandoc_version_info,
            save_raw_content,
            save_markdown_file,
            convert_and_save_content,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
