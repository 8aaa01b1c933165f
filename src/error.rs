//! Error types for every pipeline stage.
//!
//! Each stage owns one error enum so callers can tell which step of a run
//! failed. Remote calls share [`LlmError`], which keeps auth failures, rate
//! limits, network failures and malformed replies apart.

use std::io;
use std::path::PathBuf;

/// Failure talking to the remote chat-completion service.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key rejected (HTTP {0})")]
    Unauthorized(u16),
    #[error("Rate limited; try again later")]
    RateLimited,
    #[error("Server error: HTTP {status}: {body}")]
    Server { status: u16, body: String },
    #[error("HTTP error: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// The input table could not be turned into records.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column `{0}`")]
    MissingColumn(String),
}

/// Reference data for the few-shot classifier could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("Download failed: {0}")]
    Download(#[from] LlmError),
    #[error(transparent)]
    Table(#[from] IngestionError),
    #[error("Reference data contains no labeled rows")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("Classifier call failed: {0}")]
    Remote(#[from] LlmError),
    #[error("Model answered {answer:?}, which is not one of {allowed:?}")]
    UnrecognizedLabel { answer: String, allowed: Vec<String> },
    #[error("Cannot fit few-shot classifier: {0}")]
    ReferenceData(#[from] ReferenceDataError),
    #[error("Label set is empty")]
    EmptyLabelSet,
    #[error("Classifier returned {got} labels for {expected} texts")]
    LengthMismatch { expected: usize, got: usize },
}

/// A topic chart could not be drawn.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Chart rendering failed: {0}")]
    Render(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("Summarizer call failed: {0}")]
    Remote(#[from] LlmError),
}

#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("Recommendation call failed: {0}")]
    Remote(#[from] LlmError),
}

/// Startup configuration problems. Raised before any remote call is made.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("No API key configured: set OPENAI_API_KEY or `api_key` in the config file")]
    MissingApiKey,
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Writing the report directory failed.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pipeline step names, used when reporting which stage aborted a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Ingestion,
    Classification,
    Charts,
    Summarization,
    Recommendation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Ingestion => "ingestion",
            Stage::Classification => "classification",
            Stage::Charts => "charts",
            Stage::Summarization => "summarization",
            Stage::Recommendation => "recommendation",
        };
        f.write_str(name)
    }
}

/// A pipeline run aborted. There are no partial results.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("ingestion stage failed: {0}")]
    Ingestion(#[from] IngestionError),
    #[error("classification stage failed: {0}")]
    Classification(#[from] ClassificationError),
    #[error("charts stage failed: {0}")]
    Charts(#[from] ChartError),
    #[error("summarization stage failed: {0}")]
    Summarization(#[from] SummarizationError),
    #[error("recommendation stage failed: {0}")]
    Recommendation(#[from] RecommendationError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Ingestion(_) => Stage::Ingestion,
            PipelineError::Classification(_) => Stage::Classification,
            PipelineError::Charts(_) => Stage::Charts,
            PipelineError::Summarization(_) => Stage::Summarization,
            PipelineError::Recommendation(_) => Stage::Recommendation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_names_failing_stage() {
        let err = PipelineError::from(SummarizationError::Remote(LlmError::RateLimited));
        assert_eq!(err.stage(), Stage::Summarization);
        assert!(err.to_string().starts_with("summarization stage failed"));

        let err = PipelineError::from(IngestionError::MissingColumn("text".into()));
        assert_eq!(err.stage(), Stage::Ingestion);
        assert!(err.to_string().contains("`text`"));

        let err = PipelineError::from(ChartError::Render("backend closed".into()));
        assert_eq!(err.stage(), Stage::Charts);
        assert!(err.to_string().starts_with("charts stage failed"));
    }
}
