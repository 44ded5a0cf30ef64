use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::provider::{CompletionOutput, CompletionRequest, LlmProvider, LlmResult};
use crate::config::{CompletionConfig, ProviderKind};
use crate::http::client::HttpClient;

/// The completion service selected by configuration.
#[derive(Debug, Clone)]
pub enum CompletionBackend {
    OpenAi(OpenAiProvider),
    Gemini(GeminiProvider),
}

impl CompletionBackend {
    /// Fails with `LlmError::MissingApiKey` when no key is configured, which
    /// callers treat as "no external fallback".
    pub fn from_config(config: &CompletionConfig, http: HttpClient) -> LlmResult<Self> {
        let api_key = config.api_key.clone();
        let model = config.model.clone();
        let base_url = config.base_url.clone();

        Ok(match config.provider {
            ProviderKind::OpenAi => {
                Self::OpenAi(OpenAiProvider::new(http, api_key, model, base_url)?)
            }
            ProviderKind::Gemini => {
                Self::Gemini(GeminiProvider::new(http, api_key, model, base_url)?)
            }
        })
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Gemini(_) => ProviderKind::Gemini,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi(provider) => provider.model(),
            Self::Gemini(provider) => provider.model(),
        }
    }

    /// `provider/model`, as shown by `/status`.
    pub fn describe(&self) -> String {
        format!("{}/{}", self.kind().name(), self.model())
    }
}

impl LlmProvider for CompletionBackend {
    async fn generate(&self, input: CompletionRequest) -> LlmResult<CompletionOutput> {
        match self {
            Self::OpenAi(provider) => provider.generate(input).await,
            Self::Gemini(provider) => provider.generate(input).await,
        }
    }
}
