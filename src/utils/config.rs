use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

pub struct Config {
    pub name: String,
    pub config_dir: PathBuf,
    pub theme: String,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
}

impl Config {
    fn get_config_dir(home: Option<String>) -> PathBuf {
        match home {
            Some(home) => PathBuf::from(home).join(".config/lish"),
            None => env::temp_dir().join("lish"),
        }
    }

    fn with_home(home: Option<String>) -> Self {
        let config_dir = Self::get_config_dir(home);
        Config {
            name: env!("CARGO_PKG_NAME").to_string(),
            theme: String::from("default"),
            history_file: config_dir.join(".lish_history"),
            editor_mode: String::from("emacs"),
            logger_level: String::from("info"),
            logger_dir: config_dir.join("logs"),
            config_dir,
        }
    }

    pub fn new() -> Self {
        // .env first, so the variables below can come from it
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup, normally the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::with_home(lookup("HOME"));

        if let Some(theme) = lookup("LISH_THEME") {
            config.theme = theme;
        }

        if let Some(editor) = lookup("LISH_EDITOR") {
            config.editor_mode = editor;
        }

        if let Some(history) = lookup("LISH_HISTORY") {
            config.history_file = PathBuf::from(history);
        }

        if let Some(level) = lookup("LISH_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Some(dir) = lookup("LISH_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        config
    }

    /// Creates the directories the history and log files live in.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        if let Some(parent) = self.history_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&self.logger_dir)
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}
