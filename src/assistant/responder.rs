use std::time::Duration;

use tokio::time::timeout;

use super::prompt::{
    DEGRADED_MESSAGE, NO_INFORMATION_MESSAGE, VALIDATION_MESSAGE, render_system_prompt,
};
use crate::config::CompletionConfig;
use crate::knowledge::{
    KnowledgeEntry, KnowledgeStore, MatchConfig, MatchResult, ScoredEntry, rank, resolve,
};
use crate::llm::provider::{CompletionRequest, LlmError, LlmProvider};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnswerSource {
    Knowledge { score: f64 },
    Generated,
    Degraded,
    Validation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub source: AnswerSource,
    /// Best adjusted score seen while matching; 0.0 for validation replies.
    pub best_score: f64,
    /// Number of stored entries sent as context to the completion service.
    pub context_entries: usize,
    pub failure: Option<LlmError>,
}

impl Reply {
    fn validation() -> Self {
        Self {
            text: VALIDATION_MESSAGE.to_string(),
            source: AnswerSource::Validation,
            best_score: 0.0,
            context_entries: 0,
            failure: None,
        }
    }

    fn degraded(
        text: &str,
        best_score: f64,
        context_entries: usize,
        failure: Option<LlmError>,
    ) -> Self {
        Self {
            text: text.to_string(),
            source: AnswerSource::Degraded,
            best_score,
            context_entries,
            failure,
        }
    }
}

/// Answers one question at a time: a stored answer when the store has a
/// close enough question, otherwise a completion grounded on the closest
/// entries, otherwise a static message.
pub struct Responder<'a, P> {
    store: &'a KnowledgeStore,
    matching: &'a MatchConfig,
    completion: &'a CompletionConfig,
    llm: Option<&'a P>,
}

impl<'a, P: LlmProvider> Responder<'a, P> {
    pub fn new(
        store: &'a KnowledgeStore,
        matching: &'a MatchConfig,
        completion: &'a CompletionConfig,
        llm: Option<&'a P>,
    ) -> Self {
        Self {
            store,
            matching,
            completion,
            llm,
        }
    }

    pub fn has_external_fallback(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn reply(&self, question: &str) -> Reply {
        let Ok(result) = resolve(question, self.store, self.matching) else {
            return Reply::validation();
        };

        match result {
            MatchResult::Matched { answer, score, .. } => Reply {
                text: answer.to_string(),
                source: AnswerSource::Knowledge { score },
                best_score: score,
                context_entries: 0,
                failure: None,
            },
            MatchResult::NoMatch { best_score, best } => {
                self.fallback(question.trim(), best_score, best).await
            }
        }
    }

    async fn fallback(
        &self,
        question: &str,
        best_score: f64,
        best: Option<ScoredEntry<'a>>,
    ) -> Reply {
        let Some(llm) = self.llm else {
            return Reply::degraded(NO_INFORMATION_MESSAGE, best_score, 0, None);
        };

        let context = self.select_context(question, best);
        let request = CompletionRequest {
            system_instruction: Some(render_system_prompt(&context)),
            user_message: question.to_string(),
            temperature: self.completion.temperature,
            max_tokens: self.completion.max_tokens,
        };

        let budget = Duration::from_millis(self.completion.timeout_ms);
        let outcome = match timeout(budget, llm.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                after_ms: self.completion.timeout_ms,
            }),
        };

        match outcome {
            Ok(output) => Reply {
                text: output.text,
                source: AnswerSource::Generated,
                best_score,
                context_entries: context.len(),
                failure: None,
            },
            Err(err) => Reply::degraded(DEGRADED_MESSAGE, best_score, context.len(), Some(err)),
        }
    }

    fn select_context(
        &self,
        question: &str,
        best: Option<ScoredEntry<'a>>,
    ) -> Vec<&'a KnowledgeEntry> {
        let ranked = rank(question, self.store, self.matching).unwrap_or_default();
        let selected = ranked
            .into_iter()
            .filter(|scored| scored.score >= self.matching.context_threshold)
            .take(self.matching.context_limit)
            .map(|scored| scored.entry)
            .collect::<Vec<_>>();

        if selected.is_empty() {
            best.map(|scored| scored.entry).into_iter().collect()
        } else {
            selected
        }
    }
}
