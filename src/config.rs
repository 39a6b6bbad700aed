use std::path::PathBuf;

use crate::thread::{FlattenOptions, TruncationPolicy};

/// Application-level constants
pub const APP_NAME: &str = "Threadlens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cap on flattened records per thread (root + comments).
pub const DEFAULT_MAX_COMMENTS: usize = 500;

/// Token budget enforced on classifier input; longer texts are truncated.
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 512;

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,ort=warn"
}

/// Get the application data directory
/// ~/Threadlens/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Get the models directory
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Get the default bias-classifier artifact directory
pub fn default_model_dir() -> PathBuf {
    models_dir().join("bias-classifier")
}

/// Configuration surface consumed by the analysis pipeline.
///
/// Everything else (ports, credentials, remote artifact sources) belongs to
/// the surrounding glue, not here.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Cap on flattened records; `None` keeps the whole thread.
    pub max_comments: Option<usize>,
    /// Token budget for classifier input.
    pub max_input_length: usize,
    /// Directory holding the bias-classifier artifact.
    pub model_dir: PathBuf,
    /// How to shrink oversized threads.
    pub truncation: TruncationPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_comments: Some(DEFAULT_MAX_COMMENTS),
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
            model_dir: default_model_dir(),
            truncation: TruncationPolicy::Prefix,
        }
    }
}

impl AnalysisConfig {
    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            max_records: self.max_comments,
            policy: self.truncation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Threadlens"));
    }

    #[test]
    fn default_model_dir_under_models() {
        let model = default_model_dir();
        assert!(model.starts_with(models_dir()));
        assert!(model.ends_with("bias-classifier"));
    }

    #[test]
    fn default_config_caps_comments() {
        let config = AnalysisConfig::default();
        assert_eq!(config.max_comments, Some(DEFAULT_MAX_COMMENTS));
        assert_eq!(config.max_input_length, DEFAULT_MAX_INPUT_LENGTH);
        assert_eq!(config.truncation, TruncationPolicy::Prefix);
    }
}
