pub mod settings;

pub use settings::{CaptureConfig, Config, ConfigError, DetectionConfig, ReportConfig, ReportFormat};
