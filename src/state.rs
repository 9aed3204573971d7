use crate::constants::SETTINGS_FILE;
use crate::formats::{InputFormat, OutputFormat};
use crate::paths::resolve_config_path;
use crate::progress::ConversionRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use tauri::AppHandle;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
  pub(crate) default_input_format: InputFormat,
  pub(crate) default_output_format: OutputFormat,
  pub(crate) pandoc_path: String,
  pub(crate) keep_history: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      default_input_format: InputFormat::Auto,
      default_output_format: OutputFormat::Docx,
      pandoc_path: "".to_string(),
      keep_history: true,
    }
  }
}

pub(crate) struct AppState {
  pub(crate) settings: Mutex<Settings>,
  pub(crate) input_paths: Mutex<Vec<String>>,
  pub(crate) progress: Mutex<Vec<ConversionRecord>>,
  pub(crate) history: Mutex<Vec<ConversionRecord>>,
  pub(crate) converting: AtomicBool,
}

pub(crate) fn parse_settings(raw: &str) -> Settings {
  let mut settings: Settings = serde_json::from_str(raw).unwrap_or_default();
  settings.pandoc_path = settings.pandoc_path.trim().to_string();
  settings
}

pub(crate) fn load_settings(app: &AppHandle) -> Settings {
  let path = resolve_config_path(app, SETTINGS_FILE);
  match fs::read_to_string(path) {
    Ok(raw) => parse_settings(&raw),
    Err(_) => Settings::default(),
  }
}

pub(crate) fn save_settings_file(app: &AppHandle, settings: &Settings) -> Result<(), String> {
  let path = resolve_config_path(app, SETTINGS_FILE);
  let raw = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
  fs::write(path, raw).map_err(|e| e.to_string())?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_auto_to_docx() {
    let settings = Settings::default();
    assert_eq!(settings.default_input_format, InputFormat::Auto);
    assert_eq!(settings.default_output_format, OutputFormat::Docx);
    assert!(settings.pandoc_path.is_empty());
    assert!(settings.keep_history);
  }

  #[test]
  fn corrupt_settings_fall_back_to_defaults() {
    let settings = parse_settings("{ not json");
    assert_eq!(settings.default_output_format, OutputFormat::Docx);
  }

  #[test]
  fn partial_settings_fill_missing_fields() {
    let settings = parse_settings(r#"{"default_output_format":"epub"}"#);
    assert_eq!(settings.default_output_format, OutputFormat::Epub);
    assert_eq!(settings.default_input_format, InputFormat::Auto);
    assert!(settings.keep_history);
  }

  #[test]
  fn pandoc_path_is_trimmed() {
    let settings = parse_settings(r#"{"pandoc_path":"  /usr/bin/pandoc  "}"#);
    assert_eq!(settings.pandoc_path, "/usr/bin/pandoc");
  }
}
