//! Topic classification through a chat-completion backend.
//!
//! Two strategies share the [`Classifier`] trait:
//! - [`ZeroShotClassifier`] only knows the label names.
//! - [`FewShotClassifier`] is fitted once from a reference dataset and puts
//!   labeled examples into every prompt.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClassificationError, ReferenceDataError};
use crate::http;
use crate::ingest::{self, Example};
use crate::llm::{ChatRequest, LlmBackend};

/// Default topic vocabulary.
pub const DEFAULT_LABELS: [&str; 4] = ["Neglect", "Education", "Self-harm", "Panic"];

/// One member of a [`LabelSet`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Ordered, duplicate-free label vocabulary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    /// Build from names; blanks and case-insensitive duplicates are dropped.
    pub fn new<I, S>(names: I) -> Result<Self, ClassificationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut labels: Vec<Label> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || labels.iter().any(|l| fold(l.as_str()) == fold(name)) {
                continue;
            }
            labels.push(Label(name.to_string()));
        }
        if labels.is_empty() {
            return Err(ClassificationError::EmptyLabelSet);
        }
        Ok(LabelSet { labels })
    }

    pub fn default_topics() -> Self {
        LabelSet {
            labels: DEFAULT_LABELS.iter().map(|l| Label(l.to_string())).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.0.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.0 == name)
    }

    /// Map a raw model answer onto a member of the set.
    ///
    /// Accepts a JSON object with a `label` key or bare text. Matching ignores
    /// case, spacing and punctuation; otherwise a unique label contained in the
    /// answer wins.
    pub fn resolve(&self, answer: &str) -> Result<Label, ClassificationError> {
        let candidate = extract_label_field(answer).unwrap_or_else(|| answer.trim().to_string());
        let folded = fold(&candidate);
        if let Some(label) = self.labels.iter().find(|l| fold(l.as_str()) == folded) {
            return Ok(label.clone());
        }
        let whole = fold(answer);
        let contained: Vec<&Label> = self
            .labels
            .iter()
            .filter(|l| whole.contains(&fold(l.as_str())))
            .collect();
        if let [only] = contained.as_slice() {
            return Ok((*only).clone());
        }
        Err(ClassificationError::UnrecognizedLabel {
            answer: answer.trim().to_string(),
            allowed: self.names(),
        })
    }

    fn prompt_list(&self) -> String {
        let quoted: Vec<String> = self.labels.iter().map(|l| format!("'{}'", l.0)).collect();
        format!("[{}]", quoted.join(", "))
    }
}

/// Assigns exactly one label per text.
pub trait Classifier: Send + Sync {
    /// Short strategy name, used in logs and cache keys.
    fn name(&self) -> &'static str;

    /// The vocabulary every prediction is drawn from.
    fn labels(&self) -> Result<LabelSet, ClassificationError>;

    /// One label per input text, same order. Empty input never touches the
    /// network.
    fn classify(&self, texts: &[String]) -> Result<Vec<Label>, ClassificationError>;
}

/// Which [`Classifier`] implementation to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    FewShot,
    ZeroShot,
}

// ---- Zero-shot ----

pub struct ZeroShotClassifier {
    backend: Arc<dyn LlmBackend>,
    labels: LabelSet,
}

impl ZeroShotClassifier {
    pub fn new(backend: Arc<dyn LlmBackend>, labels: LabelSet) -> Self {
        ZeroShotClassifier { backend, labels }
    }
}

impl Classifier for ZeroShotClassifier {
    fn name(&self) -> &'static str {
        "zero-shot"
    }

    fn labels(&self) -> Result<LabelSet, ClassificationError> {
        Ok(self.labels.clone())
    }

    fn classify(&self, texts: &[String]) -> Result<Vec<Label>, ClassificationError> {
        texts
            .iter()
            .map(|text| {
                let prompt = build_prompt(text, &self.labels, &[]);
                predict(self.backend.as_ref(), &prompt, &self.labels)
            })
            .collect()
    }
}

// ---- Few-shot ----

/// Where the few-shot reference dataset comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceSource {
    Url(String),
    Path(PathBuf),
    Inline(Vec<Example>),
}

impl ReferenceSource {
    /// `http(s)://` locations are downloaded, anything else is a file path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            ReferenceSource::Url(location.to_string())
        } else {
            ReferenceSource::Path(PathBuf::from(location))
        }
    }

    fn load(&self, timeout: Duration) -> Result<Vec<Example>, ReferenceDataError> {
        let examples = match self {
            ReferenceSource::Url(url) => {
                let body = http::fetch_text(&http::agent(timeout), url)?;
                ingest::read_examples(body.as_bytes())?
            }
            ReferenceSource::Path(path) => {
                let file = std::fs::File::open(path).map_err(|source| {
                    crate::error::IngestionError::Io {
                        path: path.clone(),
                        source,
                    }
                })?;
                ingest::read_examples(file)?
            }
            ReferenceSource::Inline(examples) => examples.clone(),
        };
        if examples.is_empty() {
            return Err(ReferenceDataError::Empty);
        }
        Ok(examples)
    }
}

/// The fitted state: label vocabulary plus the in-context examples.
#[derive(Debug)]
pub struct FewShotModel {
    pub labels: LabelSet,
    pub examples: Vec<Example>,
}

impl FewShotModel {
    /// Fit from reference rows, keeping the first `per_label` rows per label.
    pub fn fit(examples: Vec<Example>, per_label: usize) -> Result<Self, ClassificationError> {
        let labels = LabelSet::new(examples.iter().map(|e| e.label.as_str()))?;
        let mut kept: Vec<Example> = Vec::new();
        for label in labels.iter() {
            kept.extend(
                examples
                    .iter()
                    .filter(|e| fold(&e.label) == fold(label.as_str()))
                    .take(per_label)
                    .map(|e| Example {
                        text: e.text.clone(),
                        label: label.as_str().to_string(),
                    }),
            );
        }
        Ok(FewShotModel {
            labels,
            examples: kept,
        })
    }
}

/// Few-shot classifier, fitted lazily on first use and never refitted.
pub struct FewShotClassifier {
    backend: Arc<dyn LlmBackend>,
    source: ReferenceSource,
    per_label: usize,
    timeout: Duration,
    model: OnceLock<FewShotModel>,
    fit_guard: Mutex<()>,
}

impl FewShotClassifier {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        source: ReferenceSource,
        per_label: usize,
        timeout: Duration,
    ) -> Self {
        FewShotClassifier {
            backend,
            source,
            per_label: per_label.max(1),
            timeout,
            model: OnceLock::new(),
            fit_guard: Mutex::new(()),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.model.get().is_some()
    }

    /// The fitted model, loading the reference data on the first call.
    pub fn model(&self) -> Result<&FewShotModel, ClassificationError> {
        if let Some(model) = self.model.get() {
            return Ok(model);
        }
        let _guard = self.fit_guard.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = self.model.get() {
            return Ok(model);
        }
        log::info!("Fitting few-shot classifier from {:?}", self.source_name());
        let examples = self.source.load(self.timeout)?;
        let model = FewShotModel::fit(examples, self.per_label)?;
        log::info!(
            "Few-shot classifier ready: {} labels, {} examples",
            model.labels.len(),
            model.examples.len()
        );
        Ok(self.model.get_or_init(|| model))
    }

    fn source_name(&self) -> String {
        match &self.source {
            ReferenceSource::Url(url) => url.clone(),
            ReferenceSource::Path(path) => path.display().to_string(),
            ReferenceSource::Inline(rows) => format!("{} inline rows", rows.len()),
        }
    }
}

impl Classifier for FewShotClassifier {
    fn name(&self) -> &'static str {
        "few-shot"
    }

    fn labels(&self) -> Result<LabelSet, ClassificationError> {
        Ok(self.model()?.labels.clone())
    }

    fn classify(&self, texts: &[String]) -> Result<Vec<Label>, ClassificationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self.model()?;
        texts
            .iter()
            .map(|text| {
                let prompt = build_prompt(text, &model.labels, &model.examples);
                predict(self.backend.as_ref(), &prompt, &model.labels)
            })
            .collect()
    }
}

// ---- Internal helpers ----

fn predict(
    backend: &dyn LlmBackend,
    prompt: &str,
    labels: &LabelSet,
) -> Result<Label, ClassificationError> {
    let answer = backend.complete(&ChatRequest::user(prompt))?;
    let label = labels.resolve(&answer)?;
    log::debug!("Classified as {label}");
    Ok(label)
}

fn build_prompt(text: &str, labels: &LabelSet, examples: &[Example]) -> String {
    let mut prompt = String::from(
        "You will be given a text sample delimited by triple backticks and a list of \
categories in square brackets.\n\
Decide which single category the text most likely belongs to.\n\
Answer with a JSON object that has exactly one key `label` whose value is that category, \
and nothing else.\n\n",
    );
    if !examples.is_empty() {
        prompt.push_str("Labeled examples:\n");
        for ex in examples {
            prompt.push_str(&format!("Sample: ```{}```\nCategory: {}\n\n", ex.text, ex.label));
        }
    }
    prompt.push_str(&format!("Categories: {}\n\n", labels.prompt_list()));
    prompt.push_str(&format!("Text sample: ```{text}```\n\nJSON response:"));
    prompt
}

fn extract_label_field(answer: &str) -> Option<String> {
    let trimmed = answer.trim().trim_start_matches("```json").trim_matches('`').trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    let value: serde_json::Value = serde_json::from_str(trimmed.get(start..=end)?).ok()?;
    value.get("label")?.as_str().map(str::to_string)
}

/// Lower-case alphanumerics only, so "Self harm", "self-harm" and "SELF_HARM."
/// compare equal.
fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
