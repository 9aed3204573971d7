pub const SETTINGS_FILE: &str = "settings.json";
pub const HISTORY_FILE: &str = "history.json";

pub const PENDING_MESSAGE: &str = "Pending";
pub const CONVERTING_MESSAGE: &str = "Converting...";
pub const CANCELLED_MESSAGE: &str = "Cancelled";
pub const CONVERT_SUCCESS_MESSAGE: &str = "Conversion succeeded";

pub const MISSING_PANDOC_MESSAGE: &str =
    "pandoc executable could not be located. Install pandoc or set an explicit path in settings.";

pub const MAX_EDITOR_CONTENT_CHARS: usize = 1_000_000;
