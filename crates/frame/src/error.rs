use std::path::PathBuf;

/// Errors that end a frame loop's scheduling chain.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("render failed on frame {frame}")]
    Render {
        frame: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors loading or validating a [`crate::StageConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config extension for {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("unknown scene preset: {0}")]
    UnknownPreset(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}
