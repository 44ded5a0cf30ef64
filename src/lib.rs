pub mod assistant;
pub mod cli;
pub mod config;
pub mod http;
pub mod knowledge;
pub mod llm;
pub mod trace;

use anyhow::Result;
use assistant::Session;
use cli::{AppState, CliArgs, Theme, run_repl};
use config::AppConfig;
use http::client::HttpClient;
use http::debug::HttpDebugConfig;
use knowledge::KnowledgeStore;
use llm::backend::CompletionBackend;
use llm::provider::LlmError;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use trace::SessionTrace;

pub async fn run(args: CliArgs) -> Result<()> {
    let mut config = AppConfig::load_with_path(args.config.as_deref())?;
    apply_cli_overrides(&mut config, &args);

    let session_id = generate_session_id();
    let trace = open_trace(SessionTrace::create(&session_id));
    let store = load_knowledge(&config.knowledge_file, &trace);

    let http = HttpClient::new(
        reqwest::Client::new(),
        HttpDebugConfig::from_verbose(args.verbose),
    )
    .with_trace(trace.clone());
    let llm = CompletionBackend::from_config(&config.completion, http);
    if let Err(err) = &llm {
        trace.warning(&fallback_disabled_message(err, &config));
    }

    let mut app_state = AppState {
        session_id,
        store,
        matching: config.matching,
        completion: config.completion,
        llm,
        session: Session::new(),
        theme: Theme::detect(&config.theme),
        trace,
    };

    run_repl(&mut app_state).await
}

/// A trace that cannot be created is reported and the session runs without one.
fn open_trace(created: Result<SessionTrace>) -> SessionTrace {
    match created {
        Ok(trace) => trace,
        Err(err) => {
            eprintln!("warning: {err:#}; continuing without a session trace");
            SessionTrace::disabled()
        }
    }
}

fn apply_cli_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(path) = &args.knowledge {
        config.knowledge_file = path.clone();
    }
    if let Some(threshold) = args.threshold {
        config.matching.threshold = threshold;
    }
}

/// A knowledge file that cannot be used leaves the session running on an
/// empty store.
fn load_knowledge(path: &Path, trace: &SessionTrace) -> KnowledgeStore {
    match KnowledgeStore::load(path) {
        Ok(loaded) => {
            if loaded.skipped > 0 {
                warn(
                    trace,
                    &format!(
                        "skipped {} incomplete entries in {}",
                        loaded.skipped,
                        path.display()
                    ),
                );
            }
            loaded.store
        }
        Err(err) => {
            warn(
                trace,
                &format!("{err}; continuing with an empty knowledge base"),
            );
            KnowledgeStore::default()
        }
    }
}

fn warn(trace: &SessionTrace, message: &str) {
    eprintln!("warning: {message}");
    trace.warning(message);
}

fn fallback_disabled_message(err: &LlmError, config: &AppConfig) -> String {
    match err {
        LlmError::MissingApiKey => format!(
            "completion fallback disabled: set AGENTDESK_API_KEY or {}",
            config.completion.provider.api_key_env()
        ),
        other => format!("completion fallback disabled: {other}"),
    }
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
