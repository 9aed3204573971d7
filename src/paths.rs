use std::fs;
use std::path::PathBuf;
use tauri::{AppHandle, Manager};

use crate::state::Settings;

pub(crate) fn resolve_config_path(app: &AppHandle, filename: &str) -> PathBuf {
  let base = app
    .path()
    .app_config_dir()
    .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
  let _ = fs::create_dir_all(&base);
  base.join(filename)
}

pub(crate) fn resolve_data_path(app: &AppHandle, filename: &str) -> PathBuf {
  let base = app
    .path()
    .app_data_dir()
    .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
  let _ = fs::create_dir_all(&base);
  base.join(filename)
}

pub(crate) fn resolve_pandoc_path(settings: &Settings) -> Option<PathBuf> {
  // 1. Explicit settings override
  let configured = settings.pandoc_path.trim();
  if !configured.is_empty() {
    let candidate = PathBuf::from(configured);
    if candidate.exists() {
      return Some(candidate);
    }
  }

  // 2. Env var override
  if let Ok(path) = std::env::var("DOCSHIFT_PANDOC") {
    let candidate = PathBuf::from(path);
    if candidate.exists() {
      return Some(candidate);
    }
  }

  // 3. PATH lookup
  if let Ok(found) = which::which("pandoc") {
    return Some(found);
  }

  // 4. Well-known installer locations
  let mut candidates = Vec::new();

  #[cfg(target_os = "windows")]
  {
    if let Ok(program_files) = std::env::var("ProgramFiles") {
      candidates.push(PathBuf::from(program_files).join("Pandoc").join("pandoc.exe"));
    }
    if let Ok(local_app_data) = std::env::var("LOCALAPPDATA") {
      candidates.push(PathBuf::from(local_app_data).join("Pandoc").join("pandoc.exe"));
    }
  }

  #[cfg(not(target_os = "windows"))]
  {
    candidates.push(PathBuf::from("/usr/local/bin/pandoc"));
    candidates.push(PathBuf::from("/opt/homebrew/bin/pandoc"));
    candidates.push(PathBuf::from("/usr/bin/pandoc"));
  }

  candidates.into_iter().find(|path| path.exists())
}
