//! Runtime settings: defaults, optional TOML file, then environment.
//!
//! CLI flags are applied on top by the binary.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::classify::{DEFAULT_LABELS, Strategy};
use crate::error::ConfigurationError;
use crate::recommend::{DEFAULT_MAX_TOKENS, DEFAULT_PERSONA, DEFAULT_TEMPERATURE};
use crate::summarize::DEFAULT_MAX_WORDS;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_REFERENCE_DATA: &str =
    "https://drive.google.com/uc?export=download&id=1TLXzReb5HQttKa-vrZkGEIvkx7HHX7-0";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_API_BASE: &str = "MOODGUARD_API_BASE";
pub const ENV_MODEL: &str = "MOODGUARD_MODEL";

/// Fully resolved settings.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub classifier: Strategy,
    pub labels: Vec<String>,
    pub reference_data: String,
    pub examples_per_label: usize,
    pub summary_max_words: usize,
    pub recommendation_max_tokens: u32,
    pub recommendation_temperature: f32,
    pub persona: String,
    pub cache_capacity: usize,
    pub cache_ttl: Option<Duration>,
    pub memoize_generations: bool,
    pub timeout: Duration,
}

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub classifier: Option<Strategy>,
    pub labels: Option<Vec<String>>,
    pub reference_data: Option<String>,
    pub examples_per_label: Option<usize>,
    pub summary_max_words: Option<usize>,
    pub recommendation_max_tokens: Option<u32>,
    pub recommendation_temperature: Option<f32>,
    pub persona: Option<String>,
    pub cache_capacity: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub memoize_generations: Option<bool>,
    pub timeout_secs: Option<u64>,
}

impl FileSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigurationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Settings {
    /// Resolve from an optional config file and an environment lookup.
    ///
    /// Environment values win over the file. A missing API key is an error.
    pub fn resolve(
        file: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let f = match file {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                FileSettings::load(path)?
            }
            None => FileSettings::default(),
        };
        let env_nonempty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_key = env_nonempty(ENV_API_KEY)
            .or(f.api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigurationError::MissingApiKey)?;

        let settings = Settings {
            api_key,
            api_base: env_nonempty(ENV_API_BASE)
                .or(f.api_base)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: env_nonempty(ENV_MODEL)
                .or(f.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            classifier: f.classifier.unwrap_or_default(),
            labels: f
                .labels
                .unwrap_or_else(|| DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()),
            reference_data: f
                .reference_data
                .unwrap_or_else(|| DEFAULT_REFERENCE_DATA.to_string()),
            examples_per_label: f.examples_per_label.unwrap_or(10),
            summary_max_words: f.summary_max_words.unwrap_or(DEFAULT_MAX_WORDS),
            recommendation_max_tokens: f.recommendation_max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            recommendation_temperature: f
                .recommendation_temperature
                .unwrap_or(DEFAULT_TEMPERATURE),
            persona: f.persona.unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
            cache_capacity: f.cache_capacity.unwrap_or(256),
            cache_ttl: f.cache_ttl_secs.map(Duration::from_secs),
            memoize_generations: f.memoize_generations.unwrap_or(false),
            timeout: Duration::from_secs(f.timeout_secs.unwrap_or(60)),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve using the process environment.
    pub fn from_env(file: Option<&Path>) -> Result<Self, ConfigurationError> {
        Settings::resolve(file, |key| std::env::var(key).ok())
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.summary_max_words == 0 {
            return Err(ConfigurationError::Invalid {
                key: "summary_max_words",
                reason: "must be at least 1".into(),
            });
        }
        if self.examples_per_label == 0 {
            return Err(ConfigurationError::Invalid {
                key: "examples_per_label",
                reason: "must be at least 1".into(),
            });
        }
        if !(0.0..=2.0).contains(&self.recommendation_temperature) {
            return Err(ConfigurationError::Invalid {
                key: "recommendation_temperature",
                reason: format!("{} is outside 0.0..=2.0", self.recommendation_temperature),
            });
        }
        if self.labels.iter().all(|l| l.trim().is_empty()) {
            return Err(ConfigurationError::Invalid {
                key: "labels",
                reason: "at least one label is required".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let err = Settings::resolve(None, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingApiKey));
        let err = Settings::resolve(None, env(&[(ENV_API_KEY, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingApiKey));
    }

    #[test]
    fn defaults_match_the_reference_behavior() {
        let s = Settings::resolve(None, env(&[(ENV_API_KEY, "sk-1")])).unwrap();
        assert_eq!(s.model, "gpt-3.5-turbo");
        assert_eq!(s.classifier, Strategy::FewShot);
        assert_eq!(s.labels, vec!["Neglect", "Education", "Self-harm", "Panic"]);
        assert_eq!(s.summary_max_words, 50);
        assert_eq!(s.recommendation_max_tokens, 256);
        assert!(!s.memoize_generations);
    }

    #[test]
    fn file_values_apply_and_env_overrides_them() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_key = \"sk-file\"\nmodel = \"file-model\"\nclassifier = \"zero-shot\"\nlabels = [\"Calm\", \"Stress\"]\ncache_ttl_secs = 30"
        )
        .unwrap();
        let s = Settings::resolve(Some(file.path()), env(&[(ENV_MODEL, "env-model")])).unwrap();
        assert_eq!(s.api_key, "sk-file");
        assert_eq!(s.model, "env-model");
        assert_eq!(s.classifier, Strategy::ZeroShot);
        assert_eq!(s.labels, vec!["Calm", "Stress"]);
        assert_eq!(s.cache_ttl, Some(Duration::from_secs(30)));
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"k\"\ncolour = \"red\"").unwrap();
        assert!(matches!(
            Settings::resolve(Some(file.path()), env(&[])),
            Err(ConfigurationError::Parse { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"k\"\nsummary_max_words = 0").unwrap();
        assert!(matches!(
            Settings::resolve(Some(file.path()), env(&[])),
            Err(ConfigurationError::Invalid { key: "summary_max_words", .. })
        ));
    }

    #[test]
    fn unreadable_file_is_reported() {
        let err = Settings::resolve(Some(Path::new("/nonexistent/moodguard.toml")), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Read { .. }));
    }
}
