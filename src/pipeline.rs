//! The analysis pipeline: classify, chart, word cloud, summary and
//! recommendations, run in order and aborted on the first failure.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::cache::{CacheKey, MemoCache};
use crate::chart::{LabelDistribution, Svg, render_bar_chart, render_donut_chart};
use crate::classify::{
    Classifier, FewShotClassifier, Label, LabelSet, ReferenceSource, Strategy, ZeroShotClassifier,
};
use crate::config::Settings;
use crate::error::{ClassificationError, PipelineError};
use crate::ingest::Record;
use crate::llm::LlmBackend;
use crate::normalize::Normalizer;
use crate::recommend::Recommender;
use crate::summarize::Summarizer;
use crate::wordcloud::build_word_cloud;

/// Which topic charts to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ChartKind {
    #[default]
    Bar,
    Donut,
    Both,
}

/// One record with its predicted label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabeledRecord {
    pub text: String,
    pub label: Label,
}

/// Records paired with exactly one label each, in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LabeledTable {
    rows: Vec<LabeledRecord>,
}

impl LabeledTable {
    /// Pair texts with labels. Lengths must match.
    pub fn new(records: &[Record], labels: Vec<Label>) -> Result<Self, ClassificationError> {
        if records.len() != labels.len() {
            return Err(ClassificationError::LengthMismatch {
                expected: records.len(),
                got: labels.len(),
            });
        }
        let rows = records
            .iter()
            .zip(labels)
            .map(|(r, label)| LabeledRecord {
                text: r.text.clone(),
                label,
            })
            .collect();
        Ok(LabeledTable { rows })
    }

    pub fn rows(&self) -> &[LabeledRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.text.clone()).collect()
    }

    pub fn distribution(&self) -> LabelDistribution {
        LabelDistribution::from_labels(self.rows.iter().map(|r| &r.label))
    }
}

/// Everything one run produced.
#[derive(Clone, Debug)]
pub struct Report {
    pub table: LabeledTable,
    pub distribution: LabelDistribution,
    pub bar_chart: Option<Svg>,
    pub donut_chart: Option<Svg>,
    pub tokens: Vec<String>,
    pub word_cloud: Option<Svg>,
    pub summary: Option<String>,
    pub recommendations: Option<String>,
}

/// Services built once and reused for every run.
pub struct Pipeline {
    normalizer: Normalizer,
    classifier: Box<dyn Classifier>,
    summarizer: Summarizer,
    recommender: Recommender,
    persona: String,
    charts: ChartKind,
    memoize_generations: bool,
    token_cache: MemoCache<Vec<String>>,
    label_cache: MemoCache<Label>,
    text_cache: MemoCache<String>,
}

impl Pipeline {
    pub fn new(settings: &Settings, backend: Arc<dyn LlmBackend>) -> Result<Self, ClassificationError> {
        let classifier: Box<dyn Classifier> = match settings.classifier {
            Strategy::FewShot => Box::new(FewShotClassifier::new(
                backend.clone(),
                ReferenceSource::parse(&settings.reference_data),
                settings.examples_per_label,
                settings.timeout,
            )),
            Strategy::ZeroShot => Box::new(ZeroShotClassifier::new(
                backend.clone(),
                LabelSet::new(&settings.labels)?,
            )),
        };
        Ok(Pipeline::with_classifier(settings, backend, classifier))
    }

    /// Build around an already constructed classifier.
    pub fn with_classifier(
        settings: &Settings,
        backend: Arc<dyn LlmBackend>,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        let capacity = settings.cache_capacity;
        Pipeline {
            normalizer: Normalizer::default(),
            classifier,
            summarizer: Summarizer::new(backend.clone(), settings.summary_max_words),
            recommender: Recommender::new(
                backend,
                settings.recommendation_max_tokens,
                settings.recommendation_temperature,
            ),
            persona: settings.persona.clone(),
            charts: ChartKind::default(),
            memoize_generations: settings.memoize_generations,
            token_cache: MemoCache::new(capacity, settings.cache_ttl),
            label_cache: MemoCache::new(capacity, settings.cache_ttl),
            text_cache: MemoCache::new(capacity, settings.cache_ttl),
        }
    }

    pub fn with_charts(mut self, charts: ChartKind) -> Self {
        self.charts = charts;
        self
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    /// Run every stage on `records`.
    ///
    /// With no records the labeled table, distribution and charts are empty and
    /// the word cloud, summary and recommendations are skipped.
    pub fn analyze(&self, records: &[Record]) -> Result<Report, PipelineError> {
        let started = Instant::now();
        log::info!("Analyzing {} records with the {} classifier", records.len(), self.classifier.name());

        let table = self.classify(records)?;
        let distribution = table.distribution();
        let bar_chart = matches!(self.charts, ChartKind::Bar | ChartKind::Both)
            .then(|| render_bar_chart(&distribution))
            .transpose()?;
        let donut_chart = matches!(self.charts, ChartKind::Donut | ChartKind::Both)
            .then(|| render_donut_chart(&distribution))
            .transpose()?;

        let tokens = self.token_bag(records);
        let word_cloud = build_word_cloud(&tokens);

        let (summary, recommendations) = if table.is_empty() {
            log::warn!("No records: summary and recommendations skipped");
            (None, None)
        } else {
            let summary = self.summarize(&table.texts())?;
            let recommendations = self.recommend(&summary)?;
            (Some(summary), Some(recommendations))
        };

        log::info!("Analysis finished in {:.2}s", started.elapsed().as_secs_f32());
        Ok(Report {
            table,
            distribution,
            bar_chart,
            donut_chart,
            tokens,
            word_cloud,
            summary,
            recommendations,
        })
    }

    /// Label every record, reusing cached labels for texts seen before.
    pub fn classify(&self, records: &[Record]) -> Result<LabeledTable, ClassificationError> {
        let stage = format!("classify:{}", self.classifier.name());
        let keys: Vec<CacheKey> = records
            .iter()
            .map(|r| CacheKey::new(&stage, &[r.text.as_str()]))
            .collect();
        let mut labels: Vec<Option<Label>> = keys.iter().map(|k| self.label_cache.get(k)).collect();

        let missing: Vec<usize> = (0..records.len()).filter(|&i| labels[i].is_none()).collect();
        if !missing.is_empty() {
            let texts: Vec<String> = missing.iter().map(|&i| records[i].text.clone()).collect();
            let fresh = self.classifier.classify(&texts)?;
            for (&i, label) in missing.iter().zip(fresh) {
                self.label_cache.insert(keys[i], label.clone());
                labels[i] = Some(label);
            }
        }
        log::debug!(
            "Classified {} records ({} from cache)",
            records.len(),
            records.len() - missing.len()
        );
        let labels: Vec<Label> = labels.into_iter().flatten().collect();
        LabeledTable::new(records, labels)
    }

    /// All lemmas of all records, flattened in record order.
    pub fn token_bag(&self, records: &[Record]) -> Vec<String> {
        let keys: Vec<CacheKey> = records
            .iter()
            .map(|r| CacheKey::new("normalize", &[r.text.as_str()]))
            .collect();
        let cached: Vec<Option<Vec<String>>> = keys.iter().map(|k| self.token_cache.get(k)).collect();
        let missing: Vec<String> = records
            .iter()
            .zip(&cached)
            .filter(|(_, c)| c.is_none())
            .map(|(r, _)| r.text.clone())
            .collect();
        let mut fresh = self.normalizer.normalize_all(&missing).into_iter();

        let mut bag = Vec::new();
        for (key, hit) in keys.into_iter().zip(cached) {
            let lemmas = match hit {
                Some(lemmas) => lemmas,
                None => {
                    let lemmas = fresh.next().unwrap_or_default();
                    self.token_cache.insert(key, lemmas.clone());
                    lemmas
                }
            };
            bag.extend(lemmas);
        }
        bag
    }

    fn summarize(&self, texts: &[String]) -> Result<String, PipelineError> {
        log::info!("Summarizing {} texts", texts.len());
        if !self.memoize_generations {
            return Ok(self.summarizer.summarize(texts)?);
        }
        let key = CacheKey::new(&format!("summary:{}", self.summarizer.max_words()), texts);
        Ok(self
            .text_cache
            .get_or_try_insert(key, || self.summarizer.summarize(texts))?)
    }

    fn recommend(&self, summary: &str) -> Result<String, PipelineError> {
        log::info!("Requesting recommendations");
        if !self.memoize_generations {
            return Ok(self.recommender.recommend(summary, &self.persona)?);
        }
        let key = CacheKey::new("recommend", &[summary, self.persona.as_str()]);
        Ok(self
            .text_cache
            .get_or_try_insert(key, || self.recommender.recommend(summary, &self.persona))?)
    }
}
