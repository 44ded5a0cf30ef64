use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instruction: Option<String>,
    pub user_message: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutput {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    MissingApiKey,
    HttpStatus { status: u16, body: String },
    Transport(String),
    Parse(String),
    EmptyResponse,
    Timeout { after_ms: u64 },
}

impl LlmError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 401 | 403, .. })
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 429, .. })
    }
}

impl Display for LlmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "missing completion API key"),
            Self::HttpStatus { status, body } => {
                write!(f, "provider request failed with status {status}: {body}")
            }
            Self::Transport(msg) => write!(f, "provider transport error: {msg}"),
            Self::Parse(msg) => write!(f, "provider parse error: {msg}"),
            Self::EmptyResponse => write!(f, "provider returned empty response text"),
            Self::Timeout { after_ms } => {
                write!(f, "provider did not answer within {after_ms} ms")
            }
        }
    }
}

impl Error for LlmError {}

pub type LlmResult<T> = std::result::Result<T, LlmError>;

pub trait LlmProvider {
    fn generate(
        &self,
        input: CompletionRequest,
    ) -> impl std::future::Future<Output = LlmResult<CompletionOutput>> + Send;
}

/// Maps a non-success reply to `LlmError::HttpStatus`, keeping a bounded
/// excerpt of the body.
pub(crate) fn status_error(status: u16, body: &str) -> LlmError {
    LlmError::HttpStatus {
        status,
        body: body.chars().take(400).collect(),
    }
}
