use serde::{Deserialize, Serialize};

use crate::constants::{CANCELLED_MESSAGE, CONVERTING_MESSAGE, PENDING_MESSAGE};

/// Per-file conversion state. A file moves `pending -> converting ->
/// {success | error}`; a cancelled save dialog drops it back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStage {
    Pending,
    Converting,
    Success,
    Error,
}

/// One row of the in-session conversion ledger, keyed by `path`.
///
/// Serialized with camelCase field names so persisted history files stay
/// compatible with what the frontend reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRecord {
    pub path: String,
    pub status: ConversionStage,
    pub message: String,
    pub is_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_at: Option<String>,
}

impl ConversionRecord {
    pub fn pending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: ConversionStage::Pending,
            message: PENDING_MESSAGE.to_string(),
            is_success: true,
            output_path: None,
            converted_at: None,
        }
    }
}

/// Partial update merged into an existing record, mirroring the loose
/// field-by-field updates the UI applies on every status transition.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub status: Option<ConversionStage>,
    pub message: Option<String>,
    pub is_success: Option<bool>,
    pub output_path: Option<String>,
}

impl ProgressUpdate {
    pub fn converting() -> Self {
        Self {
            status: Some(ConversionStage::Converting),
            message: Some(CONVERTING_MESSAGE.to_string()),
            ..Self::default()
        }
    }

    /// A cancelled save dialog is not an error; the file just goes back
    /// to the queue.
    pub fn cancelled() -> Self {
        Self {
            status: Some(ConversionStage::Pending),
            message: Some(CANCELLED_MESSAGE.to_string()),
            is_success: Some(true),
            ..Self::default()
        }
    }

    pub fn succeeded(message: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            status: Some(ConversionStage::Success),
            message: Some(message.into()),
            is_success: Some(true),
            output_path: Some(output_path.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(ConversionStage::Error),
            message: Some(message.into()),
            is_success: Some(false),
            ..Self::default()
        }
    }
}

pub struct AddOutcome {
    pub input_paths: Vec<String>,
    pub progress: Vec<ConversionRecord>,
    pub added: bool,
}

/// PDF input is rejected before it reaches the ledger; pandoc has no PDF
/// reader.
pub fn is_pdf_file(path: &str) -> bool {
    path.to_lowercase().ends_with(".pdf")
}

/// Append a new pending record unless the path is already queued or is a
/// PDF. Returns the (possibly unchanged) collections plus whether anything
/// was added.
pub fn add_file_to_progress(
    path: &str,
    input_paths: &[String],
    progress: &[ConversionRecord],
) -> AddOutcome {
    if is_pdf_file(path) || input_paths.iter().any(|p| p == path) {
        return AddOutcome {
            input_paths: input_paths.to_vec(),
            progress: progress.to_vec(),
            added: false,
        };
    }

    let mut updated_paths = input_paths.to_vec();
    updated_paths.push(path.to_string());

    let mut updated_progress = progress.to_vec();
    updated_progress.push(ConversionRecord::pending(path));

    AddOutcome {
        input_paths: updated_paths,
        progress: updated_progress,
        added: true,
    }
}

/// Remove a path from both collections; silently a no-op when absent.
pub fn remove_file_from_progress(
    path: &str,
    input_paths: &[String],
    progress: &[ConversionRecord],
) -> (Vec<String>, Vec<ConversionRecord>) {
    let updated_paths = input_paths
        .iter()
        .filter(|p| p.as_str() != path)
        .cloned()
        .collect();
    let updated_progress = progress
        .iter()
        .filter(|record| record.path != path)
        .cloned()
        .collect();
    (updated_paths, updated_progress)
}

pub fn clear_all_files() -> (Vec<String>, Vec<ConversionRecord>) {
    (Vec::new(), Vec::new())
}

/// Merge a partial update into the record for `path`. A miss returns the
/// ledger unchanged; callers that care use `find_progress_entry` first.
pub fn update_conversion_progress(
    progress: &[ConversionRecord],
    path: &str,
    update: ProgressUpdate,
) -> Vec<ConversionRecord> {
    let Some(index) = progress.iter().position(|record| record.path == path) else {
        return progress.to_vec();
    };

    let mut updated = progress.to_vec();
    let record = &mut updated[index];
    if let Some(status) = update.status {
        record.status = status;
    }
    if let Some(message) = update.message {
        record.message = message;
    }
    if let Some(is_success) = update.is_success {
        record.is_success = is_success;
    }
    if let Some(output_path) = update.output_path {
        record.output_path = Some(output_path);
    }
    updated
}

pub fn find_progress_entry<'a>(
    progress: &'a [ConversionRecord],
    path: &str,
) -> Option<(usize, &'a ConversionRecord)> {
    progress
        .iter()
        .enumerate()
        .find(|(_, record)| record.path == path)
}

/// Re-queue every record, used when converting the same selection again.
pub fn reset_progress_to_pending(progress: &[ConversionRecord]) -> Vec<ConversionRecord> {
    progress
        .iter()
        .map(|record| ConversionRecord {
            status: ConversionStage::Pending,
            message: PENDING_MESSAGE.to_string(),
            is_success: true,
            ..record.clone()
        })
        .collect()
}
