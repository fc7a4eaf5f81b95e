//! Shared domain types and configuration for the daily viral cycle.

pub mod app_config;
pub mod candidate;
pub mod config;
pub mod organization;
pub mod scores;
pub mod settings;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, NotifyConfig};
pub use candidate::{AdType, Candidate, ContentType, Platform};
pub use config::{load_app_config, load_app_config_from_env};
pub use organization::Organization;
pub use scores::{classify_content_type, RawScoreSet, ScoreSet};
pub use settings::{
    load_pipeline_settings, CandidateQuerySettings, CreditPricing, LongFormWeights,
    PipelineSettings, ScheduleSettings, SelectionSettings, ShortFormWeights,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read pipeline settings file {path}: {source}")]
    SettingsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pipeline settings: {0}")]
    SettingsFileParse(#[source] serde_yaml::Error),

    #[error("invalid pipeline settings: {0}")]
    Validation(String),
}
