use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Input formats the converter accepts. `Auto` lets pandoc sniff the
/// format from the file extension, so it never produces a reader name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Auto,
    Markdown,
    Html,
    Latex,
    Rst,
    Docx,
    Epub,
}

impl InputFormat {
    pub const ALL: [InputFormat; 7] = [
        InputFormat::Auto,
        InputFormat::Markdown,
        InputFormat::Html,
        InputFormat::Latex,
        InputFormat::Rst,
        InputFormat::Docx,
        InputFormat::Epub,
    ];

    pub fn parse(raw: &str) -> Result<InputFormat, String> {
        match raw.to_lowercase().as_str() {
            "auto" => Ok(InputFormat::Auto),
            "markdown" | "md" => Ok(InputFormat::Markdown),
            "html" | "html5" => Ok(InputFormat::Html),
            "latex" | "tex" => Ok(InputFormat::Latex),
            "rst" => Ok(InputFormat::Rst),
            "docx" => Ok(InputFormat::Docx),
            "epub" => Ok(InputFormat::Epub),
            _ => Err(format!("Unsupported input format: {}", raw)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InputFormat::Auto => "auto",
            InputFormat::Markdown => "markdown",
            InputFormat::Html => "html",
            InputFormat::Latex => "latex",
            InputFormat::Rst => "rst",
            InputFormat::Docx => "docx",
            InputFormat::Epub => "epub",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputFormat::Auto => "Auto detect",
            InputFormat::Markdown => "Markdown",
            InputFormat::Html => "HTML",
            InputFormat::Latex => "LaTeX",
            InputFormat::Rst => "reStructuredText",
            InputFormat::Docx => "Word Document",
            InputFormat::Epub => "EPUB",
        }
    }

    /// Reader name passed to pandoc via `-f`; `None` for auto detection.
    pub fn pandoc_name(self) -> Option<&'static str> {
        match self {
            InputFormat::Auto => None,
            InputFormat::Markdown => Some("markdown"),
            InputFormat::Html => Some("html"),
            InputFormat::Latex => Some("latex"),
            InputFormat::Rst => Some("rst"),
            InputFormat::Docx => Some("docx"),
            InputFormat::Epub => Some("epub"),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Deserialization goes through `parse` so the wire accepts the same
// aliases the UI and old config files may send ("md", "tex", "html5").
impl<'de> Deserialize<'de> for InputFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        InputFormat::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Output formats the converter produces. PDF is deliberately absent:
/// producing it requires a PDF engine next to pandoc.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Docx,
    Html,
    Tex,
    Md,
    Odt,
    Rst,
    Epub,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 7] = [
        OutputFormat::Docx,
        OutputFormat::Html,
        OutputFormat::Tex,
        OutputFormat::Md,
        OutputFormat::Odt,
        OutputFormat::Rst,
        OutputFormat::Epub,
    ];

    pub fn parse(raw: &str) -> Result<OutputFormat, String> {
        match raw.to_lowercase().as_str() {
            "docx" => Ok(OutputFormat::Docx),
            "html" | "html5" => Ok(OutputFormat::Html),
            "tex" | "latex" => Ok(OutputFormat::Tex),
            "md" | "markdown" => Ok(OutputFormat::Md),
            "odt" => Ok(OutputFormat::Odt),
            "rst" => Ok(OutputFormat::Rst),
            "epub" | "epub2" | "epub3" => Ok(OutputFormat::Epub),
            _ => Err(format!("Unsupported output format: {}", raw)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
            OutputFormat::Tex => "tex",
            OutputFormat::Md => "md",
            OutputFormat::Odt => "odt",
            OutputFormat::Rst => "rst",
            OutputFormat::Epub => "epub",
        }
    }

    /// File extension used for save dialogs and derived output paths.
    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Docx => "Word Document",
            OutputFormat::Html => "HTML",
            OutputFormat::Tex => "LaTeX",
            OutputFormat::Md => "Markdown",
            OutputFormat::Odt => "OpenDocument",
            OutputFormat::Rst => "reStructuredText",
            OutputFormat::Epub => "EPUB",
        }
    }

    /// Writer name passed to pandoc via `-t`.
    pub fn pandoc_name(self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html5",
            OutputFormat::Tex => "latex",
            OutputFormat::Md => "markdown",
            OutputFormat::Odt => "odt",
            OutputFormat::Rst => "rst",
            OutputFormat::Epub => "epub",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        OutputFormat::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// One registry entry as shown in the UI's format pickers.
#[derive(Debug, Clone, Serialize)]
pub struct FormatOption {
    pub value: &'static str,
    pub label: &'static str,
}
