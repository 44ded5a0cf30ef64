pub mod backend;
pub mod gemini;
pub mod openai;
pub mod provider;
