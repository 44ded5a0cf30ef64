use serde::{Deserialize, Serialize};

use super::provider::{
    CompletionOutput, CompletionRequest, LlmError, LlmProvider, LlmResult, status_error,
};
use crate::http::client::HttpClient;

/// Chat Completions client (`POST /v1/chat/completions`).
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(
        http: HttpClient,
        api_key: Option<String>,
        model: String,
        base_url: String,
    ) -> LlmResult<Self> {
        let api_key = api_key
            .filter(|v| !v.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request<'a>(&'a self, input: &'a CompletionRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &input.system_instruction {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &input.user_message,
        });

        ChatRequest {
            model: &self.model,
            messages,
            temperature: input.temperature,
            max_tokens: input.max_tokens,
        }
    }

    fn extract_text(resp: ChatResponse) -> LlmResult<String> {
        resp.choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

impl LlmProvider for OpenAiProvider {
    async fn generate(&self, input: CompletionRequest) -> LlmResult<CompletionOutput> {
        let payload = self.build_request(&input);
        let authorization = format!("Bearer {}", self.api_key);
        let resp = self
            .http
            .post_json(
                &self.endpoint(),
                &[],
                &[("authorization", authorization.as_str())],
                &payload,
            )
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !resp.is_success() {
            return Err(status_error(resp.status, &resp.body));
        }

        let parsed = serde_json::from_str::<ChatResponse>(&resp.body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        let text = Self::extract_text(parsed)?;
        Ok(CompletionOutput { text })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
