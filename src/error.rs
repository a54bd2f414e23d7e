// Agent error taxonomy

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Invalid or missing setting; aborts construction of that agent only.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The counter source could not be read; the agent keeps its last value.
    #[error("{what} unavailable: {source}")]
    SourceUnavailable {
        what: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AgentError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unavailable(
        what: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SourceUnavailable {
            what,
            source: source.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
