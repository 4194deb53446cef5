use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Cannot write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub detection: DetectionConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub snaplen: i32,
    pub timeout_ms: i32,
    pub promiscuous: bool,
    /// Optional BPF expression applied in the kernel.
    pub filter: Option<String>,
}

/// Thresholds of the stepping-stone filters. Times are in microseconds
/// except the window length.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Flows shorter than this are ephemeral and never paired.
    pub ephemeral_floor_us: u64,
    /// Two flows pair only if their durations differ by less than this.
    pub duration_tolerance_us: u64,
    /// ... and their first packets arrived less than this apart.
    pub start_tolerance_us: u64,
    /// Longest tolerated run of one flow's packets in the merged timeline.
    pub max_run_length: usize,
    /// How many of the most recent packets the merged timeline keeps.
    pub merge_length: usize,
    pub window_secs: u64,
    /// Bulk-transfer check: larger/smaller byte count must exceed this.
    /// Disabled when absent.
    pub min_size_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: 65535,
            timeout_ms: 1000,
            promiscuous: true,
            filter: None,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            ephemeral_floor_us: 4_000_000,
            duration_tolerance_us: 10_000,
            start_tolerance_us: 1_000_000,
            max_run_length: 5,
            merge_length: 200,
            window_secs: 30,
            min_size_ratio: None,
        }
    }
}

impl DetectionConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.snaplen <= 0 {
            return Err(ConfigError::Invalid("capture.snaplen must be positive".into()));
        }
        if self.detection.window_secs == 0 {
            return Err(ConfigError::Invalid("detection.window_secs must be at least 1".into()));
        }
        if self.detection.merge_length == 0 {
            return Err(ConfigError::Invalid("detection.merge_length must be at least 1".into()));
        }
        if let Some(ratio) = self.detection.min_size_ratio {
            if ratio.is_nan() || ratio <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "detection.min_size_ratio must be positive, got {}",
                    ratio
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_detection_parameters() {
        let config = Config::default();
        assert_eq!(config.detection.ephemeral_floor_us, 4_000_000);
        assert_eq!(config.detection.start_tolerance_us, 1_000_000);
        assert_eq!(config.detection.duration_tolerance_us, 10_000);
        assert_eq!(config.detection.merge_length, 200);
        assert_eq!(config.detection.max_run_length, 5);
        assert_eq!(config.detection.window(), Duration::from_secs(30));
        assert!(config.detection.min_size_ratio.is_none());
        assert_eq!(config.report.format, ReportFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [detection]
            window_secs = 60
            max_run_length = 3

            [report]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.detection.window_secs, 60);
        assert_eq!(config.detection.max_run_length, 3);
        assert_eq!(config.detection.merge_length, 200);
        assert_eq!(config.report.format, ReportFormat::Json);
        assert_eq!(config.capture.snaplen, 65535);
    }

    #[test]
    fn test_validation_rejects_degenerate_settings() {
        let mut config = Config::default();
        config.detection.window_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.detection.merge_length = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detection.min_size_ratio = Some(0.0);
        assert!(config.validate().is_err());

        config.detection.min_size_ratio = Some(-2.5);
        assert!(config.validate().is_err());

        config.detection.min_size_ratio = Some(f64::NAN);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.detection.min_size_ratio = Some(0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("pivot-detector-{}.toml", std::process::id()));
        let mut config = Config::default();
        config.capture.filter = Some("tcp".to_string());
        config.detection.min_size_ratio = Some(10_000.0);

        config.save_to_file(&path).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.capture.filter.as_deref(), Some("tcp"));
        assert_eq!(loaded.detection.min_size_ratio, Some(10_000.0));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = Config::load_from_file("/nonexistent/pivot-detector.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
