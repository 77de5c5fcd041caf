use thiserror::Error;

use crate::model::Stage;

/// Failures surfaced by the tour pipeline and its driver.
///
/// Adapters (HTTP clients, config IO) report `anyhow::Error`; the pipeline
/// classifies those into one of these variants at the stage boundary.
#[derive(Debug, Error)]
pub enum TourError {
    /// Missing or unusable credentials. Fatal, raised before any work starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A weather or AI call failed outright.
    #[error("{stage} stage failed: upstream unavailable: {message}")]
    UpstreamUnavailable { stage: Stage, message: String },

    /// The AI answered, but not with the structure that was asked for.
    #[error("{stage} stage failed: malformed response: {message}")]
    MalformedResponse { stage: Stage, message: String },

    /// Rejected user input, e.g. an unrecognised budget phrase.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Interrupted by the user. Halts the run, not just a city.
    #[error("Cancelled by user")]
    UserCancelled,
}

impl TourError {
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Wrap an adapter error as an upstream failure, keeping the full context chain.
    pub fn upstream(stage: Stage, err: &anyhow::Error) -> Self {
        Self::UpstreamUnavailable { stage, message: format!("{err:#}") }
    }

    pub fn malformed<S: Into<String>>(stage: Stage, message: S) -> Self {
        Self::MalformedResponse { stage, message: message.into() }
    }

    /// Stage the error is attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::UpstreamUnavailable { stage, .. } | Self::MalformedResponse { stage, .. } => {
                Some(*stage)
            }
            _ => None,
        }
    }
}
