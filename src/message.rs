use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Emitter};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

/// A user-facing status message, rendered by the frontend as a toast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMessage {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
}

impl ResultMessage {
    pub fn new(kind: MessageType, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

/// Aggregate message for a finished batch run.
pub fn format_conversion_result_message(
    success_count: usize,
    error_count: usize,
) -> ResultMessage {
    if error_count == 0 && success_count > 0 {
        ResultMessage::new(
            MessageType::Success,
            format!(
                "Batch conversion finished, {} file(s) succeeded.",
                success_count
            ),
        )
    } else if error_count > 0 {
        ResultMessage::new(
            MessageType::Warning,
            format!(
                "Batch conversion finished, {} succeeded, {} failed.",
                success_count, error_count
            ),
        )
    } else {
        ResultMessage::new(
            MessageType::Info,
            "No files were converted (the list may be empty or files were removed before conversion).",
        )
    }
}

/// Log a message and post it to the webview.
pub(crate) fn emit_message(app: &AppHandle, kind: MessageType, message: impl Into<String>) {
    let payload = ResultMessage::new(kind, message);
    match payload.kind {
        MessageType::Error => error!("{}", payload.message),
        MessageType::Warning => warn!("{}", payload.message),
        _ => info!("{}", payload.message),
    }
    let _ = app.emit("app:message", payload);
}

pub(crate) fn emit_result_message(app: &AppHandle, message: &ResultMessage) {
    emit_message(app, message.kind, message.message.clone());
}
