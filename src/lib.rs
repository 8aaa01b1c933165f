#![forbid(unsafe_code)]
//! # moodguard
//!
//! Classifies free-text journal or chat entries into mental-health topics
//! with an LLM, charts the label distribution, draws a word cloud of salient
//! lemmas, and drafts a short summary with three recommendations.
//!
//! The pipeline is synchronous and fail-fast:
//! ingestion -> normalization and classification -> charts and word cloud ->
//! summary -> recommendations.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use moodguard::{OpenAiClient, Pipeline, Settings, read_records_from_path};
//!
//! let settings = Settings::from_env(None)?;
//! let backend = Arc::new(OpenAiClient::new(
//!     settings.api_key.clone(),
//!     settings.api_base.clone(),
//!     settings.model.clone(),
//!     settings.timeout,
//! ));
//! let pipeline = Pipeline::new(&settings, backend)?;
//! let records = read_records_from_path("entries.csv".as_ref())?;
//! let report = pipeline.analyze(&records)?;
//! println!("{}", moodguard::render_text(&report));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod chart;
pub mod classify;
pub mod config;
pub mod error;
mod http;
pub mod ingest;
pub mod lexicon;
pub mod llm;
pub mod normalize;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod summarize;
pub mod wordcloud;

pub use cache::{CacheKey, MemoCache};
pub use chart::{LabelDistribution, Svg, label_color, render_bar_chart, render_donut_chart};
pub use classify::{
    Classifier, FewShotClassifier, FewShotModel, Label, LabelSet, ReferenceSource, Strategy,
    ZeroShotClassifier,
};
pub use config::Settings;
pub use error::{
    ChartError, ClassificationError, ConfigurationError, ExportError, IngestionError, LlmError,
    PipelineError, RecommendationError, ReferenceDataError, Stage, SummarizationError,
};
pub use ingest::{Example, Record, read_examples, read_records, read_records_from_path};
pub use llm::{ChatRequest, LlmBackend, OpenAiClient};
pub use normalize::{Normalizer, PosTag, default_allowed_tags};
pub use pipeline::{ChartKind, LabeledRecord, LabeledTable, Pipeline, Report};
pub use recommend::{DEFAULT_PERSONA, Recommender, bullet_items};
pub use report::{csv_safe_cell, render_text, summary_markdown, write_report};
pub use summarize::{Summarizer, word_count};
pub use wordcloud::{build_word_cloud, frequencies};
