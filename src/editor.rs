// Editor-side actions: save the draft as Markdown, or convert the draft
// content straight to an output file. Cursor handling and formatting
// snippets live in the webview.

use std::fs;
use tauri::{AppHandle, State};
use tracing::warn;

use crate::constants::MAX_EDITOR_CONTENT_CHARS;
use crate::errors::AppError;
use crate::formats::OutputFormat;
use crate::message::{emit_message, MessageType};
use crate::pandoc::{self, ContentOptions};
use crate::state::AppState;

pub(crate) fn validate_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Content must not be empty".to_string());
    }
    if content.chars().count() > MAX_EDITOR_CONTENT_CHARS {
        return Err("Content is too long, please shorten it".to_string());
    }
    Ok(())
}

#[tauri::command]
pub(crate) fn save_raw_content(path: String, content: String) -> Result<(), String> {
    fs::write(&path, content).map_err(|e| format!("Failed to write file: {}", e))
}

/// Save the editor draft via a save dialog. Returns whether a file was
/// written; cancelling the dialog is not an error.
#[tauri::command]
pub(crate) fn save_markdown_file(app: AppHandle, content: String) -> Result<bool, String> {
    if content.trim().is_empty() {
        emit_message(
            &app,
            MessageType::Warning,
            "The editor is empty, nothing to save",
        );
        return Ok(false);
    }

    let Some(output_path) = rfd::FileDialog::new()
        .set_title("Save Markdown file")
        .set_file_name("untitled.md")
        .add_filter("Markdown", &["md"])
        .save_file()
    else {
        return Ok(false);
    };

    match fs::write(&output_path, content) {
        Ok(()) => {
            emit_message(
                &app,
                MessageType::Success,
                format!("Markdown file saved to: {}", output_path.display()),
            );
            Ok(true)
        }
        Err(err) => {
            warn!("Failed to save markdown file: {}", err);
            crate::emit_error(
                &app,
                AppError::Filesystem(format!("Failed to save file: {}", err)),
                Some("Editor"),
            );
            Ok(false)
        }
    }
}

/// Convert the editor draft to the chosen format, prompting for the
/// output location first.
#[tauri::command]
pub(crate) fn convert_and_save_content(
    app: AppHandle,
    state: State<'_, AppState>,
    content: String,
    output_format: OutputFormat,
) -> Result<bool, String> {
    if let Err(err) = validate_content(&content) {
        emit_message(&app, MessageType::Warning, err);
        return Ok(false);
    }

    let extension = output_format.extension();
    let Some(output_path) = rfd::FileDialog::new()
        .set_title("Choose save location")
        .set_file_name(format!("output.{}", extension))
        .add_filter(extension.to_uppercase(), &[extension])
        .save_file()
    else {
        return Ok(false);
    };

    let pandoc = {
        let settings = state.settings.lock().unwrap();
        pandoc::required_pandoc(&settings)?
    };

    let options = ContentOptions {
        input_content: content,
        output_format,
        output_path: output_path.to_string_lossy().to_string(),
    };

    match pandoc::convert_text(&pandoc, &options) {
        Ok(result) => {
            emit_message(&app, MessageType::Success, result);
            Ok(true)
        }
        Err(err) => {
            warn!("Editor content conversion failed: {}", err);
            crate::emit_error(
                &app,
                AppError::Conversion(format!("Conversion failed: {}", err)),
                Some("Editor"),
            );
            Ok(false)
        }
    }
}
