use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, PartialEq)]
#[command(name = "agentdesk")]
#[command(
    about = "Terminal support agent for Thoughtful AI's automation agents",
    long_about = "Terminal support agent for Thoughtful AI's automation agents\n\nQuestions are answered from a local knowledge base first; when nothing matches closely enough, an external completion service is asked instead.\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default search path when --config is not provided:\n    1. $XDG_CONFIG_HOME/agentdesk/config.toml\n    2. ~/.config/agentdesk/config.toml"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Knowledge base JSON file (overrides config and AGENTDESK_KNOWLEDGE_FILE).
    #[arg(long, value_name = "PATH")]
    pub knowledge: Option<PathBuf>,

    /// Minimum match score for a stored answer, between 0.0 and 1.0.
    #[arg(long, value_name = "SCORE", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Print completion-service HTTP traffic to stderr, secrets redacted.
    #[arg(long, short)]
    pub verbose: bool,
}

fn parse_threshold(value: &str) -> Result<f64, String> {
    let parsed = value
        .parse::<f64>()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=1.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err("must be between 0.0 and 1.0".to_string())
    }
}
