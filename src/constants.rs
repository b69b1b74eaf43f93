pub const APP_DIR: &str = "sortra";
pub const CONFIG_FILE: &str = "config.toml";
pub const LOG_FILE: &str = "sortra.log";
pub const LOG_ENV: &str = "SORTRA_LOG";

pub const GROUP_NAME_MAX_LEN: usize = 15;

/// Device names Windows refuses as directory names, compared case-insensitively.
pub const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Path separators and glob metacharacters.
pub const FORBIDDEN_CHARS: &[char] = &[
    '/', '\\', ':', '*', '?', '"', '<', '>', '|', '[', ']', '{', '}',
];

pub const DEFAULT_EXECUTION_TIMEOUT_SECS: u64 = 30;

pub const LOG_LEVEL_INFO: &str = "INFO";
pub const LOG_LEVEL_SUCCESS: &str = "SUCCESS";
pub const LOG_LEVEL_ERROR: &str = "ERROR";
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
