//! Counsellor-style recommendations drawn from the corpus summary.

use std::sync::Arc;

use crate::error::RecommendationError;
use crate::llm::{ChatRequest, LlmBackend};

/// System persona sent with every recommendation request.
pub const DEFAULT_PERSONA: &str = "You are a warm and approachable mental health expert and \
therapist. Your expertise is in helping people in their teens overcome obstacles regarding \
motivation, career, school, relationships and self esteem, and you have done this for a few \
decades. Your task is to provide the best advice for helping improve mental health. Answer in \
concise bullet form. Format your response for a markdown processor.";

pub const DEFAULT_MAX_TOKENS: u32 = 256;
pub const DEFAULT_TEMPERATURE: f32 = 0.6;

const INSTRUCTION: &str =
    "Provide Top 3 recommendations to the patient based on the following text: ";

pub struct Recommender {
    backend: Arc<dyn LlmBackend>,
    max_tokens: u32,
    temperature: f32,
}

impl Recommender {
    pub fn new(backend: Arc<dyn LlmBackend>, max_tokens: u32, temperature: f32) -> Self {
        Recommender {
            backend,
            max_tokens,
            temperature,
        }
    }

    /// Ask for the top three recommendations. The reply is returned trimmed
    /// and otherwise unvalidated.
    pub fn recommend(&self, summary: &str, persona: &str) -> Result<String, RecommendationError> {
        let request = ChatRequest {
            system: Some(persona.trim().to_string()),
            user: format!("{INSTRUCTION}{summary}"),
            max_tokens: Some(self.max_tokens),
            temperature: self.temperature,
        };
        let reply = self.backend.complete(&request)?;
        Ok(reply.trim().to_string())
    }
}

/// Markdown bullet lines (`-`, `*`, `+` or `1.`) with the marker removed.
pub fn bullet_items(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim_start)
        .filter_map(|line| {
            if let Some(rest) = line
                .strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .or_else(|| line.strip_prefix("+ "))
            {
                return Some(rest.trim());
            }
            let digits = line.chars().take_while(char::is_ascii_digit).count();
            if digits > 0 {
                let rest = &line[digits..];
                if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
                    return Some(rest.trim());
                }
            }
            None
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use std::sync::Mutex;

    struct Capture(Mutex<Option<ChatRequest>>);

    impl LlmBackend for Capture {
        fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
            *self.0.lock().unwrap() = Some(request.clone());
            Ok("\n- Talk to someone you trust\n- Keep a sleep routine\n- Breathe slowly\n".into())
        }
    }

    #[test]
    fn sends_persona_instruction_and_limits() {
        let backend = Arc::new(Capture(Mutex::new(None)));
        let r = Recommender::new(backend.clone(), DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE);
        let out = r.recommend("Teens feel ignored.", DEFAULT_PERSONA).unwrap();
        assert!(out.starts_with("- Talk"));
        assert_eq!(bullet_items(&out).len(), 3);

        let req = backend.0.lock().unwrap().clone().unwrap();
        assert_eq!(req.system.as_deref(), Some(DEFAULT_PERSONA));
        assert_eq!(
            req.user,
            "Provide Top 3 recommendations to the patient based on the following text: Teens feel ignored."
        );
        assert_eq!(req.max_tokens, Some(256));
        assert!((req.temperature - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn bullet_items_understands_common_markers() {
        let text = "Here you go:\n1. Rest\n2) Talk\n* Walk\n  + Journal\nnot a bullet";
        assert_eq!(bullet_items(text), vec!["Rest", "Talk", "Walk", "Journal"]);
    }

    #[test]
    fn remote_errors_surface_as_recommendation_errors() {
        struct Denied;
        impl LlmBackend for Denied {
            fn complete(&self, _: &ChatRequest) -> Result<String, LlmError> {
                Err(LlmError::Unauthorized(401))
            }
        }
        let r = Recommender::new(Arc::new(Denied), 256, 0.6);
        assert!(matches!(
            r.recommend("x", DEFAULT_PERSONA),
            Err(RecommendationError::Remote(LlmError::Unauthorized(401)))
        ));
    }
}
