// Backend gateway around the pandoc binary. Every operation is one
// process invocation, attempted exactly once: no retries, no timeouts.

use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tauri::State;
use tracing::info;

use crate::constants::{CONVERT_SUCCESS_MESSAGE, MISSING_PANDOC_MESSAGE};
use crate::formats::{InputFormat, OutputFormat};
use crate::paths::resolve_pandoc_path;
use crate::state::{AppState, Settings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub input_path: String,
    pub output_format: OutputFormat,
    pub output_path: String,
    pub input_format: InputFormat,
}

/// Options for converting editor content instead of a file. The content
/// is always treated as Markdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentOptions {
    pub input_content: String,
    pub output_format: OutputFormat,
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewOptions {
    pub input_path: String,
    pub input_format: InputFormat,
}

fn build_convert_args(options: &ConversionOptions) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(reader) = options.input_format.pandoc_name() {
        args.push("-f".to_string());
        args.push(reader.to_string());
    }
    args.push("-t".to_string());
    args.push(options.output_format.pandoc_name().to_string());
    args.push("-s".to_string());
    args.push("-o".to_string());
    args.push(options.output_path.clone());
    args.push(options.input_path.clone());
    args
}

fn build_content_args(options: &ContentOptions) -> Vec<String> {
    vec![
        "-f".to_string(),
        "markdown".to_string(),
        "-t".to_string(),
        options.output_format.pandoc_name().to_string(),
        "-s".to_string(),
        "-o".to_string(),
        options.output_path.clone(),
    ]
}

fn build_preview_args(input_path: &str, input_format: InputFormat) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(reader) = input_format.pandoc_name() {
        args.push("-f".to_string());
        args.push(reader.to_string());
    }
    args.push("-t".to_string());
    args.push("html5".to_string());
    args.push("-s".to_string());
    args.push(input_path.to_string());
    args
}

fn map_pandoc_spawn_error(pandoc: &Path, err: std::io::Error) -> String {
    if !pandoc.exists() || err.kind() == ErrorKind::NotFound {
        return format!(
            "pandoc not found at '{}'. Install pandoc or set an explicit path in settings.",
            pandoc.display()
        );
    }
    format!("Failed to start pandoc '{}': {}", pandoc.display(), err)
}

fn failure_details(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let details = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };
    details.to_string()
}

fn run_pandoc(
    pandoc: &Path,
    args: &[String],
    stdin_content: Option<&str>,
) -> Result<std::process::Output, String> {
    let mut command = Command::new(pandoc);
    command
        .args(args)
        .stdin(if stdin_content.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Hide console window on Windows
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(0x08000000); // CREATE_NO_WINDOW
    }

    let mut child = command
        .spawn()
        .map_err(|e| map_pandoc_spawn_error(pandoc, e))?;

    if let Some(content) = stdin_content {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "Failed to open pandoc stdin".to_string())?;
        stdin
            .write_all(content.as_bytes())
            .map_err(|e| format!("Failed to pipe content to pandoc: {}", e))?;
        // Drop closes the pipe so pandoc sees EOF.
    }

    child.wait_with_output().map_err(|e| e.to_string())
}

/// Convert one file on disk. Returns the user-facing success message; a
/// non-zero exit propagates pandoc's own diagnostics.
pub(crate) fn convert(pandoc: &Path, options: &ConversionOptions) -> Result<String, String> {
    info!(
        "Converting '{}' ({} -> {})",
        options.input_path, options.input_format, options.output_format
    );

    let input = Path::new(&options.input_path);
    if !input.exists() {
        return Err(format!("Input file not found: {}", options.input_path));
    }

    let output = run_pandoc(pandoc, &build_convert_args(options), None)?;
    if !output.status.success() {
        return Err(format!(
            "pandoc failed ('{}'): {}",
            pandoc.display(),
            failure_details(&output)
        ));
    }

    Ok(format!(
        "{}. Output saved to: {}",
        CONVERT_SUCCESS_MESSAGE, options.output_path
    ))
}

/// Convert in-memory Markdown content, piped through pandoc's stdin.
pub(crate) fn convert_text(pandoc: &Path, options: &ContentOptions) -> Result<String, String> {
    info!(
        "Converting editor content (markdown -> {})",
        options.output_format
    );

    let output = run_pandoc(
        pandoc,
        &build_content_args(options),
        Some(&options.input_content),
    )?;
    if !output.status.success() {
        return Err(format!(
            "pandoc failed ('{}'): {}",
            pandoc.display(),
            failure_details(&output)
        ));
    }

    Ok(format!(
        "{}. Output saved to: {}",
        CONVERT_SUCCESS_MESSAGE, options.output_path
    ))
}

/// Render a file to standalone HTML captured from stdout.
pub(crate) fn preview(
    pandoc: &Path,
    input_path: &str,
    input_format: InputFormat,
) -> Result<String, String> {
    info!("Generating HTML preview for '{}'", input_path);

    let input = Path::new(input_path);
    if !input.exists() {
        return Err(format!("Input file not found: {}", input_path));
    }

    let output = run_pandoc(pandoc, &build_preview_args(input_path, input_format), None)?;
    if !output.status.success() {
        return Err(format!(
            "pandoc failed ('{}'): {}",
            pandoc.display(),
            failure_details(&output)
        ));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| format!("Failed to decode preview output as UTF-8: {}", e))
}

fn parse_version_banner(stdout: &str) -> String {
    stdout.lines().next().unwrap_or("").trim().to_string()
}

pub(crate) fn required_pandoc(settings: &Settings) -> Result<PathBuf, String> {
    resolve_pandoc_path(settings).ok_or_else(|| MISSING_PANDOC_MESSAGE.to_string())
}

#[tauri::command]
pub(crate) fn convert_file(
    state: State<'_, AppState>,
    options: ConversionOptions,
) -> Result<String, String> {
    let pandoc = {
        let settings = state.settings.lock().unwrap();
        required_pandoc(&settings)?
    };
    convert(&pandoc, &options)
}

#[tauri::command]
pub(crate) fn convert_content(
    state: State<'_, AppState>,
    options: ContentOptions,
) -> Result<String, String> {
    let pandoc = {
        let settings = state.settings.lock().unwrap();
        required_pandoc(&settings)?
    };
    convert_text(&pandoc, &options)
}

#[tauri::command]
pub(crate) fn preview_file(
    state: State<'_, AppState>,
    options: PreviewOptions,
) -> Result<String, String> {
    let pandoc = {
        let settings = state.settings.lock().unwrap();
        required_pandoc(&settings)?
    };
    preview(&pandoc, &options.input_path, options.input_format)
}

#[tauri::command]
pub(crate) fn check_pandoc(state: State<'_, AppState>) -> bool {
    let settings = state.settings.lock().unwrap();
    resolve_pandoc_path(&settings).is_some()
}

#[tauri::command]
pub(crate) fn pandoc_version_info(state: State<'_, AppState>) -> Result<String, String> {
    let pandoc = {
        let settings = state.settings.lock().unwrap();
        required_pandoc(&settings)?
    };
    let output = run_pandoc(&pandoc, &["--version".to_string()], None)?;
    if !output.status.success() {
        return Err(format!(
            "pandoc --version failed ('{}'): {}",
            pandoc.display(),
            failure_details(&output)
        ));
    }
    Ok(parse_version_banner(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(input_format: InputFormat) -> ConversionOptions {
        ConversionOptions {
            input_path: "/docs/notes.md".to_string(),
            output_format: OutputFormat::Docx,
            output_path: "/docs/notes.docx".to_string(),
            input_format,
        }
    }

    #[test]
    fn convert_args_skip_reader_for_auto() {
        let args = build_convert_args(&options(InputFormat::Auto));
        assert_eq!(
            args,
            vec!["-t", "docx", "-s", "-o", "/docs/notes.docx", "/docs/notes.md"]
        );
    }

    #[test]
    fn convert_args_include_explicit_reader() {
        let args = build_convert_args(&options(InputFormat::Markdown));
        assert_eq!(args[..2], ["-f".to_string(), "markdown".to_string()]);
    }

    #[test]
    fn content_args_fix_reader_to_markdown() {
        let args = build_content_args(&ContentOptions {
            input_content: "# hi".to_string(),
            output_format: OutputFormat::Html,
            output_path: "/tmp/out.html".to_string(),
        });
        assert_eq!(
            args,
            vec!["-f", "markdown", "-t", "html5", "-s", "-o", "/tmp/out.html"]
        );
    }

    #[test]
    fn preview_args_render_standalone_html5() {
        let args = build_preview_args("/docs/notes.md", InputFormat::Auto);
        assert_eq!(args, vec!["-t", "html5", "-s", "/docs/notes.md"]);
    }

    #[test]
    fn spawn_error_for_missing_binary_names_the_path() {
        let err = map_pandoc_spawn_error(
            Path::new("/nonexistent/pandoc"),
            std::io::Error::new(ErrorKind::NotFound, "no such file"),
        );
        assert!(err.contains("pandoc not found at '/nonexistent/pandoc'"));
    }

    #[test]
    fn version_banner_is_first_line() {
        let banner = parse_version_banner("pandoc 3.1.9\nFeatures: +server +lua\n");
        assert_eq!(banner, "pandoc 3.1.9");
    }
}
