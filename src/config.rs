use crate::logging::{default_log_level, normalize_level, LoggingError};
use directories::BaseDirs;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use thiserror::Error;

const APP_DIR: &str = "diary_board";
const DATA_FILE_NAME: &str = "diary.json";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d (%a)";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    LogLevel(#[from] LoggingError),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON key-value file holding the diary list.
    pub data_file: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: &'static str,
    /// chrono format string used wherever a date is shown.
    pub date_format: String,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    data_file: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
    date_format: Option<String>,
}

impl Config {
    /// Loads the first config file found (XDG path, then native) and fills in defaults.
    /// A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let file_config = Self::read_file_config()?;
        Self::from_file_config(file_config)
    }

    fn from_file_config(file_config: FileConfig) -> Result<Self, ConfigError> {
        let log_level = match file_config.log_level.as_deref() {
            Some(level) => normalize_level(level)?,
            None => default_log_level(),
        };

        Ok(Config {
            data_file: file_config
                .data_file
                .unwrap_or_else(|| Self::default_data_dir().join(DATA_FILE_NAME)),
            log_dir: file_config
                .log_dir
                .unwrap_or_else(|| Self::default_data_dir().join("logs")),
            log_level,
            date_format: file_config
                .date_format
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
        })
    }

    /// `{data_dir}/diary_board`, or `./diary_board` when there is no home directory.
    fn default_data_dir() -> PathBuf {
        match BaseDirs::new() {
            Some(base) => base.data_dir().join(APP_DIR),
            None => PathBuf::from(".").join(APP_DIR),
        }
    }

    fn config_file_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(base) = BaseDirs::new() {
            paths.push(
                base.home_dir()
                    .join(".config")
                    .join(APP_DIR)
                    .join("config.toml"),
            );
            paths.push(base.config_dir().join(APP_DIR).join("config.toml"));
        }
        paths
    }

    fn read_file_config() -> Result<FileConfig, ConfigError> {
        for path in Self::config_file_paths() {
            if !path.exists() {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            return Self::parse_file(&text).map_err(|source| ConfigError::Parse { path, source });
        }
        Ok(FileConfig::default())
    }

    fn parse_file(text: &str) -> Result<FileConfig, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn candidates_prioritize_xdg_then_native() {
        if let Some(base) = BaseDirs::new() {
            let paths = Config::config_file_paths();
            assert_eq!(
                paths.first(),
                Some(&base.home_dir().join(".config/diary_board/config.toml"))
            );
            assert_eq!(
                paths.get(1),
                Some(&base.config_dir().join("diary_board/config.toml"))
            );
        }
    }

    #[test]
    fn parse_file_reads_all_keys() {
        let toml = r#"
            data_file = "/tmp/diary/diary.json"
            log_dir = "/tmp/diary/logs"
            log_level = "WARN"
            date_format = "%d.%m.%Y"
        "#;
        let config = Config::from_file_config(Config::parse_file(toml).unwrap()).unwrap();
        assert_eq!(config.data_file, Path::new("/tmp/diary/diary.json"));
        assert_eq!(config.log_dir, Path::new("/tmp/diary/logs"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.date_format, "%d.%m.%Y");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_file_config(Config::parse_file("").unwrap()).unwrap();
        assert!(config.data_file.ends_with("diary_board/diary.json"));
        assert!(config.log_dir.ends_with("diary_board/logs"));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let file_config = Config::parse_file(r#"log_level = "chatty""#).unwrap();
        let err = Config::from_file_config(file_config).unwrap_err();
        assert!(matches!(err, ConfigError::LogLevel(_)));
    }

    #[test]
    fn mistyped_values_fail_to_parse() {
        assert!(Config::parse_file("date_format = 3").is_err());
    }
}
