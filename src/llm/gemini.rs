use serde::{Deserialize, Serialize};

use super::provider::{
    CompletionOutput, CompletionRequest, LlmError, LlmProvider, LlmResult, status_error,
};
use crate::http::client::HttpClient;

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
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
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request(input: &CompletionRequest) -> GeminiGenerateRequest {
        GeminiGenerateRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: input.user_message.clone(),
                }],
            }],
            system_instruction: input
                .system_instruction
                .as_ref()
                .map(|text| GeminiSystemInstruction {
                    parts: vec![GeminiPart { text: text.clone() }],
                }),
            generation_config: GeminiGenerationConfig {
                temperature: input.temperature,
                max_output_tokens: input.max_tokens,
            },
        }
    }

    fn extract_text(resp: GeminiGenerateResponse) -> LlmResult<String> {
        for candidate in resp.candidates {
            let Some(content) = candidate.content else {
                continue;
            };
            for part in content.parts {
                let text = part.text.trim();
                if !text.is_empty() {
                    return Ok(text.to_string());
                }
            }
        }

        Err(LlmError::EmptyResponse)
    }
}

impl LlmProvider for GeminiProvider {
    async fn generate(&self, input: CompletionRequest) -> LlmResult<CompletionOutput> {
        let payload = Self::build_request(&input);
        let resp = self
            .http
            .post_json(
                &self.endpoint(),
                &[("key", self.api_key.as_str())],
                &[],
                &payload,
            )
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !resp.is_success() {
            return Err(status_error(resp.status, &resp.body));
        }

        let parsed = serde_json::from_str::<GeminiGenerateResponse>(&resp.body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        let text = Self::extract_text(parsed)?;
        Ok(CompletionOutput { text })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiGenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}
